use std::collections::{HashMap, HashSet};

use crate::models::Comment;

// Siblings oldest first; a comment whose parent is missing becomes top-level
pub fn build_tree(mut rows: Vec<Comment>) -> Vec<Comment> {
    rows.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));

    let known: HashSet<String> = rows.iter().map(|c| c.id.clone()).collect();
    let mut roots = Vec::new();
    let mut children: HashMap<String, Vec<Comment>> = HashMap::new();

    for mut comment in rows {
        comment.replies.clear();
        match comment.parent_id.clone() {
            Some(parent_id) if known.contains(&parent_id) && parent_id != comment.id => {
                children.entry(parent_id).or_default().push(comment);
            }
            _ => roots.push(comment),
        }
    }

    for root in &mut roots {
        attach_replies(root, &mut children);
    }

    // Anything left is part of a parent cycle; keep it visible
    let mut stranded: Vec<Comment> = children.into_values().flatten().collect();
    stranded.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    roots.extend(stranded);

    roots
}

fn attach_replies(node: &mut Comment, children: &mut HashMap<String, Vec<Comment>>) {
    if let Some(mut replies) = children.remove(&node.id) {
        for reply in &mut replies {
            attach_replies(reply, children);
        }
        node.replies = replies;
    }
}

pub fn count(threads: &[Comment]) -> usize {
    threads.iter().map(|c| 1 + count(&c.replies)).sum()
}
