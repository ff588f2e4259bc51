use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::HashSet;

use super::{decode_tags, encode_tags, format_timestamp, parse_timestamp, Database, ToggleQueries};
use crate::error::StoreError;
use crate::models::{
    AppRequest, HelpRequest, NewAppRequest, NewHelpRequest, RequestStatus, Toggle,
};

const REQUEST_VOTE_TOGGLE: ToggleQueries = ToggleQueries {
    delete: "DELETE FROM request_votes WHERE request_id = ? AND user_session = ?",
    insert: "INSERT INTO request_votes (request_id, user_session) VALUES (?, ?)",
    adjust: "UPDATE app_requests SET votes = MAX(votes + ?, 0) WHERE id = ?",
    total: "SELECT votes FROM app_requests WHERE id = ?",
};

impl Database {
    // Stores a new idea; the author's session, if known, up-votes it straight away
    pub async fn create_app_request(
        &self,
        new_request: NewAppRequest,
        user_session: Option<&str>,
    ) -> Result<AppRequest, StoreError> {
        let mut request = AppRequest::new(new_request);
        self.insert_app_request(&request).await?;

        if let Some(session) = user_session {
            request.votes = self.toggle(&REQUEST_VOTE_TOGGLE, &request.id, session).await?.total;
        }

        Ok(request)
    }

    pub async fn insert_app_request(&self, request: &AppRequest) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO app_requests (id, title, description, author, votes, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.author)
        .bind(request.votes)
        .bind(request.status.as_str())
        .bind(format_timestamp(&request.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_app_request(&self, request_id: &str) -> Result<AppRequest, StoreError> {
        let row = sqlx::query(
            "SELECT id, title, description, author, votes, status, created_at FROM app_requests WHERE id = ?",
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::RequestNotFound(request_id.to_string()))?;

        request_from_row(&row)
    }

    // Most up-voted first, newest first among ties
    pub async fn list_app_requests(&self) -> Result<Vec<AppRequest>, StoreError> {
        sqlx::query(
            r#"
            SELECT id, title, description, author, votes, status, created_at
            FROM app_requests
            ORDER BY votes DESC, created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(request_from_row)
        .collect()
    }

    pub async fn set_request_status(
        &self,
        request_id: &str,
        status: RequestStatus,
    ) -> Result<(), StoreError> {
        let updated = sqlx::query("UPDATE app_requests SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(request_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if updated == 0 {
            return Err(StoreError::RequestNotFound(request_id.to_string()));
        }
        Ok(())
    }

    pub async fn toggle_request_vote(
        &self,
        request_id: &str,
        user_session: &str,
    ) -> Result<Toggle, StoreError> {
        let exists = sqlx::query("SELECT 1 FROM app_requests WHERE id = ?")
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();

        if !exists {
            return Err(StoreError::RequestNotFound(request_id.to_string()));
        }
        self.toggle(&REQUEST_VOTE_TOGGLE, request_id, user_session).await
    }

    pub async fn fetch_user_request_votes(
        &self,
        user_session: &str,
    ) -> Result<HashSet<String>, StoreError> {
        sqlx::query("SELECT request_id FROM request_votes WHERE user_session = ?")
            .bind(user_session)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| -> Result<String, StoreError> { Ok(row.try_get("request_id")?) })
            .collect()
    }

    pub async fn create_help_request(
        &self,
        new_request: NewHelpRequest,
    ) -> Result<HelpRequest, StoreError> {
        let request = HelpRequest::new(new_request);
        self.insert_help_request(&request).await?;
        Ok(request)
    }

    pub async fn insert_help_request(&self, request: &HelpRequest) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO help_requests (id, app_name, description, category, tags, thumbnail_url, author, source_url, code_snippet, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.id)
        .bind(&request.app_name)
        .bind(&request.description)
        .bind(request.category.as_str())
        .bind(encode_tags(&request.tags)?)
        .bind(&request.thumbnail_url)
        .bind(&request.author)
        .bind(&request.source_url)
        .bind(&request.code_snippet)
        .bind(format_timestamp(&request.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_help_request(&self, request_id: &str) -> Result<HelpRequest, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, app_name, description, category, tags, thumbnail_url, author, source_url, code_snippet, created_at
            FROM help_requests
            WHERE id = ?
            "#,
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::HelpRequestNotFound(request_id.to_string()))?;

        help_from_row(&row)
    }

    // Newest first
    pub async fn list_help_requests(&self) -> Result<Vec<HelpRequest>, StoreError> {
        sqlx::query(
            r#"
            SELECT id, app_name, description, category, tags, thumbnail_url, author, source_url, code_snippet, created_at
            FROM help_requests
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(help_from_row)
        .collect()
    }
}

fn request_from_row(row: &SqliteRow) -> Result<AppRequest, StoreError> {
    Ok(AppRequest {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        author: row.try_get("author")?,
        votes: row.try_get("votes")?,
        status: row
            .try_get::<String, _>("status")?
            .parse()
            .map_err(StoreError::Corrupt)?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
    })
}

fn help_from_row(row: &SqliteRow) -> Result<HelpRequest, StoreError> {
    Ok(HelpRequest {
        id: row.try_get("id")?,
        app_name: row.try_get("app_name")?,
        description: row.try_get("description")?,
        category: row
            .try_get::<String, _>("category")?
            .parse()
            .map_err(StoreError::Corrupt)?,
        tags: decode_tags(&row.try_get::<String, _>("tags")?)?,
        thumbnail_url: row.try_get("thumbnail_url")?,
        author: row.try_get("author")?,
        source_url: row.try_get("source_url")?,
        code_snippet: row.try_get("code_snippet")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
    })
}
