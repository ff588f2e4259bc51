mod comments;
mod requests;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{migrate::MigrateDatabase, Row, Sqlite};
use std::collections::HashSet;

use crate::config::Config;
use crate::error::StoreError;
use crate::models::{AppEntry, Category, NewApp, PriceVote, Toggle};
use crate::pricing::VoteStore;

// Statements behind a per-session on/off switch (likes, request up-votes).
// Each takes the target id then the session, except `adjust` (delta, id) and `total` (id).
struct ToggleQueries {
    delete: &'static str,
    insert: &'static str,
    adjust: &'static str,
    total: &'static str,
}

const LIKE_TOGGLE: ToggleQueries = ToggleQueries {
    delete: "DELETE FROM likes WHERE app_id = ? AND user_session = ?",
    insert: "INSERT INTO likes (app_id, user_session) VALUES (?, ?)",
    adjust: "UPDATE apps SET likes = MAX(likes + ?, 0) WHERE id = ?",
    total: "SELECT likes FROM apps WHERE id = ?",
};

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(config: &Config) -> Result<Self, StoreError> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(&config.database_url).await.unwrap_or(false) {
            info!("Creating database at {}", config.database_url);
            Sqlite::create_database(&config.database_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS apps (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                thumbnail_url TEXT NOT NULL,
                demo_url TEXT NOT NULL,
                author TEXT NOT NULL,
                likes INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Append-only: nothing in the crate updates or deletes a price vote
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS price_votes (
                id TEXT PRIMARY KEY,
                app_id TEXT NOT NULL,
                price REAL NOT NULL CHECK (price >= 0),
                user_session TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (app_id) REFERENCES apps(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_price_votes_app ON price_votes(app_id);")
            .execute(pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS likes (
                app_id TEXT NOT NULL,
                user_session TEXT NOT NULL,
                PRIMARY KEY (app_id, user_session),
                FOREIGN KEY (app_id) REFERENCES apps(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS app_requests (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                author TEXT NOT NULL,
                votes INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS request_votes (
                request_id TEXT NOT NULL,
                user_session TEXT NOT NULL,
                PRIMARY KEY (request_id, user_session),
                FOREIGN KEY (request_id) REFERENCES app_requests(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS help_requests (
                id TEXT PRIMARY KEY,
                app_name TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                thumbnail_url TEXT NOT NULL,
                author TEXT NOT NULL,
                source_url TEXT,
                code_snippet TEXT,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        // target_kind is 'app' or 'help'; existence of the target is checked on insert
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id TEXT PRIMARY KEY,
                target_kind TEXT NOT NULL,
                target_id TEXT NOT NULL,
                parent_id TEXT,
                author TEXT NOT NULL,
                text TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                FOREIGN KEY (parent_id) REFERENCES comments(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_target ON comments(target_kind, target_id);")
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn create_app(&self, new_app: NewApp) -> Result<AppEntry, StoreError> {
        let app = AppEntry::new(new_app);
        self.insert_app(&app).await?;
        Ok(app)
    }

    pub async fn insert_app(&self, app: &AppEntry) -> Result<(), StoreError> {
        let tags = encode_tags(&app.tags)?;

        sqlx::query(
            r#"
            INSERT INTO apps (id, name, description, category, tags, thumbnail_url, demo_url, author, likes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&app.id)
        .bind(&app.name)
        .bind(&app.description)
        .bind(app.category.as_str())
        .bind(tags)
        .bind(&app.thumbnail_url)
        .bind(&app.demo_url)
        .bind(&app.author)
        .bind(app.likes)
        .bind(format_timestamp(&app.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_app(&self, app_id: &str) -> Result<AppEntry, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, category, tags, thumbnail_url, demo_url, author, likes, created_at
            FROM apps
            WHERE id = ?
            "#,
        )
        .bind(app_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::AppNotFound(app_id.to_string()))?;

        app_from_row(&row)
    }

    // All apps, newest first, optionally only one category
    pub async fn list_apps(&self, category: Option<Category>) -> Result<Vec<AppEntry>, StoreError> {
        sqlx::query(
            r#"
            SELECT id, name, description, category, tags, thumbnail_url, demo_url, author, likes, created_at
            FROM apps
            WHERE ?1 IS NULL OR category = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(category.map(|c| c.as_str()))
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(app_from_row)
        .collect()
    }

    pub async fn count_apps(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM apps")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("total")?)
    }

    async fn app_exists(&self, app_id: &str) -> Result<bool, StoreError> {
        Ok(sqlx::query("SELECT 1 FROM apps WHERE id = ?")
            .bind(app_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some())
    }

    // Likes `app_id` for this session, or removes the like if there already is one
    pub async fn toggle_like(&self, app_id: &str, user_session: &str) -> Result<Toggle, StoreError> {
        if !self.app_exists(app_id).await? {
            return Err(StoreError::AppNotFound(app_id.to_string()));
        }
        self.toggle(&LIKE_TOGGLE, app_id, user_session).await
    }

    pub async fn fetch_user_likes(&self, user_session: &str) -> Result<HashSet<String>, StoreError> {
        sqlx::query("SELECT app_id FROM likes WHERE user_session = ?")
            .bind(user_session)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| -> Result<String, StoreError> { Ok(row.try_get("app_id")?) })
            .collect()
    }

    // Membership row and counter change together or not at all
    async fn toggle(
        &self,
        queries: &ToggleQueries,
        target_id: &str,
        user_session: &str,
    ) -> Result<Toggle, StoreError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(queries.delete)
            .bind(target_id)
            .bind(user_session)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !removed {
            sqlx::query(queries.insert)
                .bind(target_id)
                .bind(user_session)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(queries.adjust)
            .bind(if removed { -1i64 } else { 1i64 })
            .bind(target_id)
            .execute(&mut *tx)
            .await?;

        let total = sqlx::query(queries.total)
            .bind(target_id)
            .fetch_one(&mut *tx)
            .await?
            .try_get::<i64, _>(0)?;

        tx.commit().await?;

        Ok(Toggle {
            active: !removed,
            total,
        })
    }
}

#[async_trait]
impl VoteStore for Database {
    async fn fetch_votes(&self, app_id: &str) -> Result<Vec<f64>, StoreError> {
        sqlx::query("SELECT price FROM price_votes WHERE app_id = ?")
            .bind(app_id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| -> Result<f64, StoreError> { Ok(row.try_get::<f64, _>("price")?) })
            .collect()
    }

    async fn append_vote(&self, vote: &PriceVote) -> Result<(), StoreError> {
        if !self.app_exists(&vote.app_id).await? {
            return Err(StoreError::AppNotFound(vote.app_id.clone()));
        }

        sqlx::query(
            r#"
            INSERT INTO price_votes (id, app_id, price, user_session, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(vote.id.to_string())
        .bind(&vote.app_id)
        .bind(vote.price)
        .bind(&vote.user_session)
        .bind(format_timestamp(&vote.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn encode_tags(tags: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(tags).map_err(|e| StoreError::Corrupt(format!("Failed to encode tags: {}", e)))
}

fn decode_tags(raw: &str) -> Result<Vec<String>, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt(format!("Failed to parse tags: {}", e)))
}

fn app_from_row(row: &SqliteRow) -> Result<AppEntry, StoreError> {
    let category = row
        .try_get::<String, _>("category")?
        .parse::<Category>()
        .map_err(StoreError::Corrupt)?;

    let tags = decode_tags(&row.try_get::<String, _>("tags")?)?;

    Ok(AppEntry {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        category,
        tags,
        thumbnail_url: row.try_get("thumbnail_url")?,
        demo_url: row.try_get("demo_url")?,
        author: row.try_get("author")?,
        likes: row.try_get("likes")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
    })
}

// Fixed-width UTC so that ORDER BY on the text column is chronological
fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("Failed to parse timestamp {:?}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) async fn memory_db() -> Database {
        Database::new(&Config::in_memory()).await.unwrap()
    }

    pub(crate) fn new_app(name: &str) -> NewApp {
        NewApp {
            name: name.to_string(),
            description: format!("{} description", name),
            category: Category::AiTools,
            tags: vec!["Rust".to_string(), "SQLite".to_string()],
            thumbnail_url: "https://example.com/thumb.png".to_string(),
            demo_url: "#".to_string(),
            author: "tester".to_string(),
        }
    }

    #[tokio::test]
    async fn app_round_trips_through_the_table() {
        let db = memory_db().await;
        let created = db.create_app(new_app("Notely")).await.unwrap();

        let fetched = db.get_app(&created.id).await.unwrap();

        assert_eq!(fetched.name, "Notely");
        assert_eq!(fetched.category, Category::AiTools);
        assert_eq!(fetched.tags, vec!["Rust", "SQLite"]);
        assert_eq!(fetched.created_at.timestamp(), created.created_at.timestamp());
    }

    #[tokio::test]
    async fn missing_app_is_reported() {
        let db = memory_db().await;
        assert!(matches!(
            db.get_app("nope").await,
            Err(StoreError::AppNotFound(id)) if id == "nope"
        ));
    }

    #[tokio::test]
    async fn new_app_has_no_votes() {
        let db = memory_db().await;
        let app = db.create_app(new_app("Empty")).await.unwrap();

        assert!(db.fetch_votes(&app.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn votes_are_appended_not_merged() {
        let db = memory_db().await;
        let app = db.create_app(new_app("Voted")).await.unwrap();

        for price in [4.5, 4.5, 0.0] {
            db.append_vote(&PriceVote::new(&app.id, price, Some("s")))
                .await
                .unwrap();
        }

        let mut votes = db.fetch_votes(&app.id).await.unwrap();
        votes.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(votes, vec![0.0, 4.5, 4.5]);
    }

    #[tokio::test]
    async fn vote_for_unknown_app_is_refused() {
        let db = memory_db().await;
        let result = db.append_vote(&PriceVote::new("ghost", 3.0, None)).await;

        assert!(matches!(result, Err(StoreError::AppNotFound(_))));
        assert!(db.fetch_votes("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn votes_stay_with_their_app() {
        let db = memory_db().await;
        let a = db.create_app(new_app("A")).await.unwrap();
        let b = db.create_app(new_app("B")).await.unwrap();

        db.append_vote(&PriceVote::new(&a.id, 1.0, None)).await.unwrap();
        db.append_vote(&PriceVote::new(&b.id, 2.0, None)).await.unwrap();

        assert_eq!(db.fetch_votes(&a.id).await.unwrap(), vec![1.0]);
        assert_eq!(db.fetch_votes(&b.id).await.unwrap(), vec![2.0]);
    }

    #[tokio::test]
    async fn category_filter_narrows_the_list() {
        let db = memory_db().await;
        db.create_app(new_app("Brainy")).await.unwrap();
        let mut ledger = new_app("Ledger");
        ledger.category = Category::Finance;
        db.create_app(ledger).await.unwrap();

        assert_eq!(db.list_apps(None).await.unwrap().len(), 2);
        let finance = db.list_apps(Some(Category::Finance)).await.unwrap();
        assert_eq!(finance.len(), 1);
        assert_eq!(finance[0].name, "Ledger");
        assert!(db.list_apps(Some(Category::Lifestyle)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn like_toggles_per_session() {
        let db = memory_db().await;
        let app = db.create_app(new_app("Lovable")).await.unwrap();

        let first = db.toggle_like(&app.id, "alice").await.unwrap();
        assert_eq!(first, Toggle { active: true, total: 1 });
        let other = db.toggle_like(&app.id, "bob").await.unwrap();
        assert_eq!(other.total, 2);

        let undone = db.toggle_like(&app.id, "alice").await.unwrap();
        assert_eq!(undone, Toggle { active: false, total: 1 });
        assert_eq!(db.get_app(&app.id).await.unwrap().likes, 1);

        let liked = db.fetch_user_likes("bob").await.unwrap();
        assert!(liked.contains(&app.id));
        assert!(db.fetch_user_likes("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn like_for_unknown_app_is_refused() {
        let db = memory_db().await;
        assert!(matches!(
            db.toggle_like("ghost", "alice").await,
            Err(StoreError::AppNotFound(_))
        ));
    }
}
