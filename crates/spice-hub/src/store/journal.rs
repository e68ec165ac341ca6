//! # Journal Review Store
//!
//! Wraps the `spice-io` [`ReviewJournal`] as a [`ReviewStore`]. The journal
//! is the durable copy; reads are served from a [`ReviewIndex`] rebuilt on
//! open and extended only after an append has been synced.
//!
//! Appends run on tokio's blocking pool. The synced write and the index
//! update happen in the same blocking task, so a caller that stops waiting
//! (a timeout) can never leave a journaled review missing from the index.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;

use spice_core::{RestaurantId, Review, ReviewRecord};
use spice_io::journal::ReviewJournal;

use super::memory::{ReviewIndex, REVIEWS};
use super::{ReviewStore, StoreError, StoreResult};

const STORE: &str = "review journal";

pub struct JournalReviewStore {
    journal: Arc<Mutex<ReviewJournal>>,
    index: Arc<RwLock<ReviewIndex>>,
}

impl JournalReviewStore {
    /// Open the journal at `path`, replaying every intact record.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let (journal, replay) = ReviewJournal::open(path).map_err(engine)?;

        if replay.truncated_bytes > 0 {
            tracing::warn!(
                path = %path.display(),
                truncated_bytes = replay.truncated_bytes,
                "Review journal had a torn tail; truncated to last intact record"
            );
        }
        tracing::info!(
            path = %path.display(),
            records = replay.records.len(),
            "Review journal replayed"
        );

        let index = replay.records.into_iter().map(Review::from).collect();
        Ok(Self {
            journal: Arc::new(Mutex::new(journal)),
            index: Arc::new(RwLock::new(index)),
        })
    }

    pub async fn len(&self) -> usize {
        self.index.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.read().await.is_empty()
    }
}

fn engine(source: spice_io::Error) -> StoreError {
    StoreError::Engine {
        store: STORE,
        source,
    }
}

fn unavailable(reason: impl ToString) -> StoreError {
    StoreError::Unavailable {
        store: STORE,
        reason: reason.to_string(),
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    unavailable("journal lock poisoned")
}

#[async_trait::async_trait]
impl ReviewStore for JournalReviewStore {
    fn collections(&self) -> Vec<String> {
        vec![REVIEWS.to_string()]
    }

    async fn ping(&self) -> StoreResult<()> {
        let journal = Arc::clone(&self.journal);
        tokio::task::spawn_blocking(move || {
            let journal = journal.lock().map_err(poisoned)?;
            journal.probe().map_err(unavailable)
        })
        .await
        .map_err(unavailable)?
    }

    async fn insert(&self, review: Review) -> StoreResult<()> {
        let journal = Arc::clone(&self.journal);
        let index = Arc::clone(&self.index);
        tokio::task::spawn_blocking(move || {
            // The journal lock is held across the index update so the index
            // keeps journal order.
            let mut journal = journal.lock().map_err(poisoned)?;
            journal
                .append(&ReviewRecord::from(&review))
                .map_err(engine)?;
            index.blocking_write().push(review);
            Ok(())
        })
        .await
        .map_err(unavailable)?
    }

    async fn reviews_for(&self, id: RestaurantId) -> StoreResult<Vec<Review>> {
        Ok(self.index.read().await.for_restaurant(id))
    }

    async fn reviews_by_user(&self, needle: &str) -> StoreResult<Vec<Review>> {
        Ok(self.index.read().await.by_user(needle))
    }

    async fn reviewed_by(
        &self,
        candidates: &BTreeSet<RestaurantId>,
        needle: &str,
    ) -> StoreResult<BTreeSet<RestaurantId>> {
        Ok(self.index.read().await.reviewed_by(candidates, needle))
    }

    async fn user_names(&self) -> StoreResult<BTreeSet<String>> {
        Ok(self.index.read().await.user_names())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use chrono::{TimeZone, Utc};

    fn review(id: i64, user: &str, rating: i32) -> Review {
        Review {
            restaurant_id: RestaurantId(id),
            user_name: user.into(),
            rating,
            comment: "fine".into(),
            created_at: Some(Utc.timestamp_opt(1_723_000_000, 0).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_inserted_reviews_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.journal");

        {
            let store = JournalReviewStore::open(&path).unwrap();
            assert!(store.is_empty().await);
            store.insert(review(1, "Ann", 9)).await.unwrap();
            store.insert(review(2, "Bo", 3)).await.unwrap();
            assert_eq!(store.len().await, 2);
        }

        let store = JournalReviewStore::open(&path).unwrap();
        assert_eq!(store.reviews_for(RestaurantId(1)).await.unwrap(), vec![review(1, "Ann", 9)]);
        assert_eq!(
            store.user_names().await.unwrap(),
            BTreeSet::from(["Ann".to_string(), "Bo".to_string()])
        );
    }

    #[tokio::test]
    async fn test_ping_reports_missing_journal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.journal");
        let store = JournalReviewStore::open(&path).unwrap();
        assert!(store.ping().await.is_ok());

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            store.ping().await,
            Err(StoreError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_abandoned_insert_still_reaches_the_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.journal");
        let store = JournalReviewStore::open(&path).unwrap();

        // A reader blocks the index, so the caller gives up first.
        let reader = store.index.read().await;
        let outcome = tokio::time::timeout(
            Duration::from_millis(50),
            store.insert(review(1, "Ann", 9)),
        )
        .await;
        assert!(outcome.is_err());
        drop(reader);

        let mut in_memory = 0;
        for _ in 0..200 {
            in_memory = store.len().await;
            if in_memory == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        drop(store);

        let reopened = JournalReviewStore::open(&path).unwrap();
        assert_eq!(in_memory, 1);
        assert_eq!(reopened.len().await, in_memory);
    }

    #[tokio::test]
    async fn test_corrupt_journal_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.journal");
        {
            let store = JournalReviewStore::open(&path).unwrap();
            store.insert(review(1, "Ann", 9)).await.unwrap();
            store.insert(review(1, "Bo", 2)).await.unwrap();
        }
        let mut bytes = std::fs::read(&path).unwrap();
        bytes[10] ^= 0xFF;
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            JournalReviewStore::open(&path),
            Err(StoreError::Engine { .. })
        ));
    }
}
