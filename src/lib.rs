//! Crowd pricing for a showcase gallery of apps.
//!
//! Visitors vote on what an app is worth per month; the displayed price is a
//! trimmed mean of those votes ([`valuation::valuation`]), always recomputed
//! from the stored votes and read through one [`pricing::PriceBoard`] so that
//! every view shows the same figure.

pub mod comments;
pub mod config;
pub mod db;
pub mod error;
pub mod gallery;
pub mod models;
pub mod pricing;
pub mod seed;
pub mod valuation;

pub use error::{StoreError, VoteError};
pub use models::{PriceTag, VoteSet};
pub use pricing::{validate_price, PriceBoard, VoteStore};
pub use valuation::{format_currency, valuation};
