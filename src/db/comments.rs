use sqlx::Row;

use super::{format_timestamp, parse_timestamp, Database};
use crate::error::StoreError;
use crate::models::{Comment, CommentTarget};

impl Database {
    async fn target_exists(&self, target: &CommentTarget) -> Result<bool, StoreError> {
        let sql = match target {
            CommentTarget::App(_) => "SELECT 1 FROM apps WHERE id = ?",
            CommentTarget::Help(_) => "SELECT 1 FROM help_requests WHERE id = ?",
        };
        Ok(sqlx::query(sql)
            .bind(target.id())
            .fetch_optional(&self.pool)
            .await?
            .is_some())
    }

    pub async fn create_comment(&self, comment: &Comment) -> Result<(), StoreError> {
        if !self.target_exists(&comment.target).await? {
            return Err(match &comment.target {
                CommentTarget::App(id) => StoreError::AppNotFound(id.clone()),
                CommentTarget::Help(id) => StoreError::HelpRequestNotFound(id.clone()),
            });
        }

        // A reply must stay in its parent's thread
        if let Some(parent_id) = &comment.parent_id {
            let parent_exists = sqlx::query(
                "SELECT 1 FROM comments WHERE id = ? AND target_kind = ? AND target_id = ?",
            )
            .bind(parent_id)
            .bind(comment.target.kind())
            .bind(comment.target.id())
            .fetch_optional(&self.pool)
            .await?
            .is_some();

            if !parent_exists {
                return Err(StoreError::CommentNotFound(parent_id.clone()));
            }
        }

        sqlx::query(
            r#"
            INSERT INTO comments (id, target_kind, target_id, parent_id, author, text, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(comment.target.kind())
        .bind(comment.target.id())
        .bind(&comment.parent_id)
        .bind(&comment.author)
        .bind(&comment.text)
        .bind(format_timestamp(&comment.timestamp))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // Flat list, oldest first; threads are assembled by comments::build_tree
    pub async fn fetch_comments(&self, target: &CommentTarget) -> Result<Vec<Comment>, StoreError> {
        sqlx::query(
            r#"
            SELECT id, target_kind, target_id, parent_id, author, text, timestamp
            FROM comments
            WHERE target_kind = ? AND target_id = ?
            ORDER BY timestamp ASC
            "#,
        )
        .bind(target.kind())
        .bind(target.id())
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| -> Result<Comment, StoreError> {
            let kind: String = row.try_get("target_kind")?;
            Ok(Comment {
                id: row.try_get("id")?,
                target: CommentTarget::from_parts(&kind, row.try_get("target_id")?)
                    .map_err(StoreError::Corrupt)?,
                parent_id: row.try_get("parent_id")?,
                author: row.try_get("author")?,
                text: row.try_get("text")?,
                timestamp: parse_timestamp(&row.try_get::<String, _>("timestamp")?)?,
                replies: Vec::new(),
            })
        })
        .collect()
    }
}
