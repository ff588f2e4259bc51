use log::debug;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::VoteSet;

// Vote sets keyed by app id, replaced wholesale or dropped. Sets only grow,
// so a replacement with fewer votes than the cached copy is stale.
#[derive(Debug, Default)]
pub struct VoteSetCache {
    entries: RwLock<HashMap<String, VoteSet>>,
}

impl VoteSetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, app_id: &str) -> Option<VoteSet> {
        self.entries.read().await.get(app_id).cloned()
    }

    // Returns whatever the cache holds afterwards
    pub async fn replace(&self, app_id: &str, votes: VoteSet) -> VoteSet {
        let mut entries = self.entries.write().await;
        match entries.get(app_id) {
            Some(current) if current.len() > votes.len() => {
                debug!(
                    "Ignoring stale vote set for {} ({} votes, cached {})",
                    app_id,
                    votes.len(),
                    current.len()
                );
                current.clone()
            }
            _ => {
                entries.insert(app_id.to_string(), votes.clone());
                votes
            }
        }
    }

    pub async fn invalidate(&self, app_id: &str) {
        self.entries.write().await.remove(app_id);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replace_swaps_the_whole_set() {
        let cache = VoteSetCache::new();
        cache.replace("a", VoteSet::from(vec![1.0, 2.0])).await;
        cache.replace("a", VoteSet::from(vec![3.0, 4.0, 5.0])).await;

        assert_eq!(cache.get("a").await, Some(VoteSet::from(vec![3.0, 4.0, 5.0])));
    }

    #[tokio::test]
    async fn older_snapshot_does_not_roll_back() {
        let cache = VoteSetCache::new();
        cache.replace("a", VoteSet::from(vec![1.0, 2.0, 3.0])).await;

        let kept = cache.replace("a", VoteSet::from(vec![1.0, 2.0])).await;

        assert_eq!(kept.len(), 3);
        assert_eq!(cache.get("a").await.map(|v| v.len()), Some(3));
    }

    #[tokio::test]
    async fn invalidate_drops_only_that_app() {
        let cache = VoteSetCache::new();
        cache.replace("a", VoteSet::from(vec![1.0])).await;
        cache.replace("b", VoteSet::from(vec![2.0])).await;

        cache.invalidate("a").await;

        assert!(cache.get("a").await.is_none());
        assert!(cache.get("b").await.is_some());
    }
}
