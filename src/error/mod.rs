use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("app not found: {0}")]
    AppNotFound(String),

    #[error("app request not found: {0}")]
    RequestNotFound(String),

    #[error("help request not found: {0}")]
    HelpRequestNotFound(String),

    #[error("comment not found: {0}")]
    CommentNotFound(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

#[derive(Error, Debug)]
pub enum VoteError {
    // Raised before any I/O
    #[error("invalid price vote: {price}")]
    InvalidVote { price: f64 },

    #[error("vote could not be recorded: {0}")]
    IngestionFailed(#[source] StoreError),

    #[error("vote recorded but the vote set could not be reloaded: {0}")]
    RefreshFailed(#[source] StoreError),
}

impl VoteError {
    // Text shown to whoever submitted the vote
    pub fn user_message(&self) -> &'static str {
        match self {
            VoteError::InvalidVote { .. } => "Please enter a price of 0 or more.",
            VoteError::IngestionFailed(_) => "Something went wrong while voting. Please try again.",
            VoteError::RefreshFailed(_) => "Your vote was recorded. Refresh to see the updated price.",
        }
    }
}
