use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::valuation::{format_currency, valuation};

// Price votes are not stored on the entry; read them through PriceBoard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub thumbnail_url: String,
    pub demo_url: String,
    pub author: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewApp {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub thumbnail_url: String,
    pub demo_url: String,
    pub author: String,
}

impl AppEntry {
    pub fn new(app: NewApp) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: app.name,
            description: app.description,
            category: app.category,
            tags: app.tags,
            thumbnail_url: app.thumbnail_url,
            demo_url: app.demo_url,
            author: app.author,
            likes: 0,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Productivity,
    Entertainment,
    Utilities,
    AiTools,
    Finance,
    Lifestyle,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Productivity,
        Category::Entertainment,
        Category::Utilities,
        Category::AiTools,
        Category::Finance,
        Category::Lifestyle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Productivity => "Productivity",
            Category::Entertainment => "Entertainment",
            Category::Utilities => "Utilities",
            Category::AiTools => "AI Tools",
            Category::Finance => "Finance",
            Category::Lifestyle => "Lifestyle",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceVote {
    pub id: Uuid,
    pub app_id: String,
    pub price: f64,
    pub user_session: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PriceVote {
    pub fn new(app_id: &str, price: f64, user_session: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            app_id: app_id.to_string(),
            price,
            user_session: user_session.map(str::to_string),
            created_at: Utc::now(),
        }
    }
}

/// Snapshot of every price vote cast for one app. There is no way to push
/// into one; a stale copy can only be replaced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VoteSet(Vec<f64>);

impl VoteSet {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn valuation(&self) -> f64 {
        valuation(&self.0)
    }

    pub fn price_tag(&self) -> PriceTag {
        let valuation = self.valuation();
        PriceTag {
            valuation,
            display: format_currency(valuation),
            vote_count: self.len(),
        }
    }
}

impl From<Vec<f64>> for VoteSet {
    fn from(votes: Vec<f64>) -> Self {
        Self(votes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTag {
    pub valuation: f64,
    pub display: String,
    pub vote_count: usize,
}

// What a comment thread hangs off
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentTarget {
    App(String),
    Help(String),
}

impl CommentTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            CommentTarget::App(_) => "app",
            CommentTarget::Help(_) => "help",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            CommentTarget::App(id) | CommentTarget::Help(id) => id,
        }
    }

    pub fn from_parts(kind: &str, id: String) -> Result<Self, String> {
        match kind {
            "app" => Ok(CommentTarget::App(id)),
            "help" => Ok(CommentTarget::Help(id)),
            _ => Err(format!("Unknown comment target: {}", kind)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub target: CommentTarget,
    pub parent_id: Option<String>,
    pub author: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub replies: Vec<Comment>,
}

impl Comment {
    pub fn new(target: CommentTarget, parent_id: Option<&str>, author: String, text: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            target,
            parent_id: parent_id.map(str::to_string),
            author,
            text,
            timestamp: Utc::now(),
            replies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    InProgress,
    Completed,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 3] = [
        RequestStatus::Pending,
        RequestStatus::InProgress,
        RequestStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::InProgress => "In Progress",
            RequestStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown request status: {}", s))
    }
}

// An idea someone wants built; `votes` counts one up-vote per session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppRequest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author: String,
    pub votes: i64,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppRequest {
    pub title: String,
    pub description: String,
    pub author: String,
}

impl AppRequest {
    pub fn new(request: NewAppRequest) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: request.title,
            description: request.description,
            author: request.author,
            votes: 0,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

// A request for coding help on someone's app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpRequest {
    pub id: String,
    pub app_name: String,
    pub description: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub thumbnail_url: String,
    pub author: String,
    pub source_url: Option<String>,
    pub code_snippet: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHelpRequest {
    pub app_name: String,
    pub description: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub thumbnail_url: String,
    pub author: String,
    pub source_url: Option<String>,
    pub code_snippet: Option<String>,
}

impl HelpRequest {
    pub fn new(request: NewHelpRequest) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            app_name: request.app_name,
            description: request.description,
            category: request.category,
            tags: request.tags,
            thumbnail_url: request.thumbnail_url,
            author: request.author,
            source_url: request.source_url,
            code_snippet: request.code_snippet,
            created_at: Utc::now(),
        }
    }
}

// Result of flipping a like or an up-vote for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Toggle {
    pub active: bool,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert!("Games".parse::<Category>().is_err());
    }

    #[test]
    fn request_status_labels_round_trip() {
        for status in RequestStatus::ALL {
            assert_eq!(status.as_str().parse::<RequestStatus>(), Ok(status));
        }
        assert_eq!(RequestStatus::InProgress.to_string(), "In Progress");
    }

    #[test]
    fn comment_target_parts() {
        let target = CommentTarget::from_parts("help", "h1".to_string()).unwrap();
        assert_eq!(target, CommentTarget::Help("h1".to_string()));
        assert_eq!((target.kind(), target.id()), ("help", "h1"));
        assert!(CommentTarget::from_parts("request", "r1".to_string()).is_err());
    }

    #[test]
    fn new_request_starts_pending_with_no_votes() {
        let request = AppRequest::new(NewAppRequest {
            title: "Meal planner".to_string(),
            description: "Plans meals".to_string(),
            author: "HealthLife".to_string(),
        });
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.votes, 0);
    }

    #[test]
    fn price_tag_matches_engine() {
        let votes = VoteSet::from(vec![10.0, 12.0, 12.0, 15.0, 9.0]);
        let tag = votes.price_tag();
        assert_eq!(tag.display, "$11.60");
        assert_eq!(tag.vote_count, 5);
        assert_eq!(tag.valuation, votes.valuation());
    }

    #[test]
    fn empty_vote_set_is_free() {
        let tag = VoteSet::default().price_tag();
        assert_eq!(tag.display, "$0.00");
        assert_eq!(tag.vote_count, 0);
    }

    #[test]
    fn new_app_starts_without_likes() {
        let app = AppEntry::new(NewApp {
            name: "Tiny Timer".to_string(),
            description: "A timer".to_string(),
            category: Category::Utilities,
            tags: vec!["Rust".to_string()],
            thumbnail_url: String::new(),
            demo_url: "#".to_string(),
            author: "dev".to_string(),
        });
        assert_eq!(app.likes, 0);
        assert!(Uuid::parse_str(&app.id).is_ok());
    }
}
