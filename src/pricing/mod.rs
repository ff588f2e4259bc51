pub mod cache;

use async_trait::async_trait;
use log::{error, info, warn};
use std::sync::Arc;

use crate::error::{StoreError, VoteError};
use crate::models::{PriceVote, VoteSet};
pub use cache::VoteSetCache;

#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Every vote recorded for `app_id`, unordered.
    async fn fetch_votes(&self, app_id: &str) -> Result<Vec<f64>, StoreError>;

    /// Records one vote atomically.
    async fn append_vote(&self, vote: &PriceVote) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: VoteStore + ?Sized> VoteStore for Arc<S> {
    async fn fetch_votes(&self, app_id: &str) -> Result<Vec<f64>, StoreError> {
        (**self).fetch_votes(app_id).await
    }

    async fn append_vote(&self, vote: &PriceVote) -> Result<(), StoreError> {
        (**self).append_vote(vote).await
    }
}

// Finite and non-negative; -0.0 comes back as 0.0
pub fn validate_price(price: f64) -> Result<f64, VoteError> {
    if !price.is_finite() || price < 0.0 {
        return Err(VoteError::InvalidVote { price });
    }
    if price == 0.0 {
        return Ok(0.0);
    }
    Ok(price)
}

// The only accessor views use for vote sets
pub struct PriceBoard<S> {
    store: S,
    cache: VoteSetCache,
}

impl<S: VoteStore> PriceBoard<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: VoteSetCache::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn votes(&self, app_id: &str) -> Result<VoteSet, StoreError> {
        if let Some(votes) = self.cache.get(app_id).await {
            return Ok(votes);
        }

        let votes = VoteSet::from(self.store.fetch_votes(app_id).await?);
        Ok(self.cache.replace(app_id, votes).await)
    }

    // Validate, append, then reload the full set and replace the cached copy.
    // The cache is untouched when the append fails.
    pub async fn submit_vote(
        &self,
        app_id: &str,
        price: f64,
        user_session: Option<&str>,
    ) -> Result<VoteSet, VoteError> {
        let price = validate_price(price).inspect_err(|_| {
            warn!("Rejected price vote for {}: {}", app_id, price);
        })?;

        let vote = PriceVote::new(app_id, price, user_session);
        if let Err(e) = self.store.append_vote(&vote).await {
            error!("Failed to record price vote for {}: {}", app_id, e);
            return Err(VoteError::IngestionFailed(e));
        }

        match self.store.fetch_votes(app_id).await {
            Ok(votes) => {
                let votes = self.cache.replace(app_id, VoteSet::from(votes)).await;
                info!(
                    "Recorded price vote {} for {}: {} votes, valuation {}",
                    vote.id,
                    app_id,
                    votes.len(),
                    votes.valuation()
                );
                Ok(votes)
            }
            Err(e) => {
                // The vote landed; make the next read go back to the store
                self.cache.invalidate(app_id).await;
                error!("Recorded price vote for {} but reload failed: {}", app_id, e);
                Err(VoteError::RefreshFailed(e))
            }
        }
    }

    pub async fn invalidate(&self, app_id: &str) {
        self.cache.invalidate(app_id).await;
    }

    pub async fn invalidate_all(&self) {
        self.cache.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    // Appends and reads can be made to fail
    #[derive(Default)]
    struct MemoryStore {
        votes: Mutex<HashMap<String, Vec<f64>>>,
        fail_appends: AtomicBool,
        fail_fetches: AtomicBool,
        appends: AtomicUsize,
        fetches: AtomicUsize,
    }

    impl MemoryStore {
        async fn with_votes(app_id: &str, votes: Vec<f64>) -> Self {
            let store = Self::default();
            store.votes.lock().await.insert(app_id.to_string(), votes);
            store
        }

        async fn raw(&self, app_id: &str) -> Vec<f64> {
            self.votes.lock().await.get(app_id).cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl VoteStore for MemoryStore {
        async fn fetch_votes(&self, app_id: &str) -> Result<Vec<f64>, StoreError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_fetches.load(Ordering::SeqCst) {
                return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(self.raw(app_id).await)
        }

        async fn append_vote(&self, vote: &PriceVote) -> Result<(), StoreError> {
            if self.fail_appends.load(Ordering::SeqCst) {
                return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
            }
            self.appends.fetch_add(1, Ordering::SeqCst);
            self.votes
                .lock()
                .await
                .entry(vote.app_id.clone())
                .or_default()
                .push(vote.price);
            Ok(())
        }
    }

    #[test]
    fn validate_rejects_bad_prices() {
        for price in [-0.01, -5.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                validate_price(price),
                Err(VoteError::InvalidVote { .. })
            ));
        }
    }

    #[test]
    fn validate_accepts_zero_and_positive() {
        assert_eq!(validate_price(0.0).ok(), Some(0.0));
        assert_eq!(validate_price(12.5).ok(), Some(12.5));
        let zero = validate_price(-0.0).ok().unwrap_or(f64::NAN);
        assert!(zero.is_sign_positive());
    }

    #[tokio::test]
    async fn invalid_vote_never_reaches_the_store() {
        let board = PriceBoard::new(MemoryStore::default());

        let err = board.submit_vote("app", -1.0, None).await.unwrap_err();

        assert!(matches!(err, VoteError::InvalidVote { price } if price == -1.0));
        assert_eq!(board.store().appends.load(Ordering::SeqCst), 0);
        assert_eq!(board.store().fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn submit_appends_exactly_once_and_returns_fresh_set() {
        let store = MemoryStore::with_votes("app", vec![10.0, 12.0, 12.0, 15.0]).await;
        let board = PriceBoard::new(store);

        let votes = board.submit_vote("app", 9.0, Some("session-1")).await.unwrap();

        assert_eq!(votes.len(), 5);
        assert_eq!(votes.as_slice().iter().filter(|v| **v == 9.0).count(), 1);
        assert_eq!(votes.price_tag().display, "$11.60");
        assert_eq!(board.votes("app").await.unwrap(), votes);
    }

    #[tokio::test]
    async fn same_price_twice_is_two_votes() {
        let board = PriceBoard::new(MemoryStore::default());

        board.submit_vote("app", 5.0, Some("same")).await.unwrap();
        let votes = board.submit_vote("app", 5.0, Some("same")).await.unwrap();

        assert_eq!(votes.as_slice(), &[5.0, 5.0]);
    }

    #[tokio::test]
    async fn reads_are_cached_until_a_vote_lands() {
        let store = MemoryStore::with_votes("app", vec![1.0, 2.0]).await;
        let board = PriceBoard::new(store);

        board.votes("app").await.unwrap();
        board.votes("app").await.unwrap();
        assert_eq!(board.store().fetches.load(Ordering::SeqCst), 1);

        board.submit_vote("app", 3.0, None).await.unwrap();
        assert_eq!(board.votes("app").await.unwrap().len(), 3);
        assert_eq!(board.store().fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidation_forces_a_reload() {
        let board = PriceBoard::new(MemoryStore::with_votes("app", vec![1.0]).await);
        board.votes("app").await.unwrap();

        board.invalidate("app").await;
        board.votes("app").await.unwrap();
        board.invalidate_all().await;
        board.votes("app").await.unwrap();

        assert_eq!(board.store().fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failed_append_keeps_previous_valuation() {
        let store = MemoryStore::with_votes("app", vec![10.0, 20.0]).await;
        let board = PriceBoard::new(store);
        let before = board.votes("app").await.unwrap().price_tag();

        board.store().fail_appends.store(true, Ordering::SeqCst);
        let err = board.submit_vote("app", 1000.0, None).await.unwrap_err();

        assert!(matches!(err, VoteError::IngestionFailed(_)));
        assert_eq!(board.store().raw("app").await, vec![10.0, 20.0]);
        assert_eq!(board.votes("app").await.unwrap().price_tag(), before);
    }

    #[tokio::test]
    async fn failed_reload_forces_a_fresh_read() {
        let store = MemoryStore::with_votes("app", vec![10.0]).await;
        let board = PriceBoard::new(store);
        board.votes("app").await.unwrap();

        board.store().fail_fetches.store(true, Ordering::SeqCst);
        let err = board.submit_vote("app", 20.0, None).await.unwrap_err();
        assert!(matches!(err, VoteError::RefreshFailed(_)));

        board.store().fail_fetches.store(false, Ordering::SeqCst);
        let votes = board.votes("app").await.unwrap();
        assert_eq!(votes.len(), 2);
        assert_eq!(votes.price_tag().display, "$15.00");
    }

    #[tokio::test]
    async fn concurrent_votes_all_land() {
        let board = Arc::new(PriceBoard::new(MemoryStore::default()));
        let prices = [10.0, 12.0, 12.0, 15.0, 9.0, 8.0, 25.0, 5.0, 12.0, 11.0];

        let handles: Vec<_> = prices
            .iter()
            .map(|&price| {
                let board = Arc::clone(&board);
                tokio::spawn(async move { board.submit_vote("app", price, None).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let votes = board.votes("app").await.unwrap();
        assert_eq!(votes.len(), prices.len());
        assert_eq!(votes.valuation(), 11.0);
    }
}
