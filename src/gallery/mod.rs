mod requests;

use log::info;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use crate::comments;
use crate::db::Database;
use crate::error::{StoreError, VoteError};
use crate::models::{AppEntry, Category, Comment, CommentTarget, NewApp, PriceTag, Toggle, VoteSet};
use crate::pricing::PriceBoard;
pub use requests::HelpThread;

// Price the voting dialog suggests before the user touches it
pub const DEFAULT_SUGGESTED_PRICE: f64 = 5.0;

// One tile in the app grid
#[derive(Debug, Clone, Serialize)]
pub struct AppCard {
    pub app: AppEntry,
    pub price: PriceTag,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppDetail {
    pub app: AppEntry,
    pub price: PriceTag,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VotingDialog {
    pub app_id: String,
    pub app_name: String,
    pub price: PriceTag,
    pub suggested_price: f64,
}

// Every view pulls its vote set from the same PriceBoard, so grid, detail and
// voting dialog always show one price
pub struct Gallery {
    db: Arc<Database>,
    board: PriceBoard<Arc<Database>>,
}

impl Gallery {
    pub fn new(db: Arc<Database>) -> Self {
        let board = PriceBoard::new(Arc::clone(&db));
        Self { db, board }
    }

    pub fn board(&self) -> &PriceBoard<Arc<Database>> {
        &self.board
    }

    // `None` shows every category
    pub async fn grid(&self, category: Option<Category>) -> Result<Vec<AppCard>, StoreError> {
        let apps = self.db.list_apps(category).await?;
        let mut cards = Vec::with_capacity(apps.len());
        for app in apps {
            let price = self.board.votes(&app.id).await?.price_tag();
            cards.push(AppCard { app, price });
        }
        Ok(cards)
    }

    pub async fn card(&self, app_id: &str) -> Result<AppCard, StoreError> {
        let app = self.db.get_app(app_id).await?;
        let price = self.board.votes(app_id).await?.price_tag();
        Ok(AppCard { app, price })
    }

    pub async fn detail(&self, app_id: &str) -> Result<AppDetail, StoreError> {
        let app = self.db.get_app(app_id).await?;
        let price = self.board.votes(app_id).await?.price_tag();
        let target = CommentTarget::App(app.id.clone());
        let comments = comments::build_tree(self.db.fetch_comments(&target).await?);
        Ok(AppDetail { app, price, comments })
    }

    pub async fn voting_dialog(&self, app_id: &str) -> Result<VotingDialog, StoreError> {
        let app = self.db.get_app(app_id).await?;
        let price = self.board.votes(app_id).await?.price_tag();
        Ok(VotingDialog {
            app_id: app.id,
            app_name: app.name,
            price,
            suggested_price: DEFAULT_SUGGESTED_PRICE,
        })
    }

    pub async fn submit_vote(
        &self,
        app_id: &str,
        price: f64,
        user_session: Option<&str>,
    ) -> Result<VoteSet, VoteError> {
        self.board.submit_vote(app_id, price, user_session).await
    }

    // A new app starts with an empty vote set
    pub async fn add_app(&self, new_app: NewApp) -> Result<AppEntry, StoreError> {
        let app = self.db.create_app(new_app).await?;
        info!("Added app {} ({})", app.name, app.id);
        Ok(app)
    }

    pub async fn toggle_like(&self, app_id: &str, user_session: &str) -> Result<Toggle, StoreError> {
        let toggle = self.db.toggle_like(app_id, user_session).await?;
        info!("Like on {} is now {} ({} total)", app_id, toggle.active, toggle.total);
        Ok(toggle)
    }

    pub async fn liked_apps(&self, user_session: &str) -> Result<HashSet<String>, StoreError> {
        self.db.fetch_user_likes(user_session).await
    }

    pub async fn add_comment(
        &self,
        target: CommentTarget,
        parent_id: Option<&str>,
        author: &str,
        text: &str,
    ) -> Result<Comment, StoreError> {
        let comment = Comment::new(target, parent_id, author.to_string(), text.to_string());
        self.db.create_comment(&comment).await?;
        Ok(comment)
    }
}
