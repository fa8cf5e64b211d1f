use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{Result, ServiceError};
use crate::models::{PassageMetadata, User, UserUpdate};
use crate::services::store::UserStore;

/// Which of the two tracked vocabulary sets a clear request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ClearTarget {
    #[serde(rename = "nonFrequent")]
    NonFrequent,
    #[serde(rename = "uniqueEncountered")]
    UniqueEncountered,
}

/// Per-user cumulative record of vocabulary exposure.
///
/// Every ledger operation is a read-modify-write against the store's
/// array-valued fields, so operations for the same user are serialized
/// through a per-user mutex. This also gives the orchestrator read-your-
/// writes consistency: the next generation sees the previous update.
pub struct VocabularyLedger {
    store: Arc<dyn UserStore>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl VocabularyLedger {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        VocabularyLedger {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        // Reclaim entries no operation holds, or the map grows with every
        // user id ever seen
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn load(&self, user_id: &str) -> Result<User> {
        self.store
            .get(user_id)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound(user_id.to_string()))
    }

    /// Record a successful generation: union the new words into both tracked
    /// sets and append the passage-history entry.
    pub async fn record_success(
        &self,
        user_id: &str,
        new_unique_words: &[String],
        new_non_frequent_words: &[String],
        metadata: PassageMetadata,
    ) -> Result<User> {
        let lock = self.lock_for(user_id).await;
        let _guard = lock.lock().await;

        let user = self.load(user_id).await?;

        let mut unique = user.unique_words_encountered.clone();
        for word in new_unique_words {
            if !unique.iter().any(|w| w.eq_ignore_ascii_case(word)) {
                unique.push(word.clone());
            }
        }

        let mut non_frequent = user.used_non_frequent_words.clone();
        for word in new_non_frequent_words {
            if !non_frequent.iter().any(|w| w.eq_ignore_ascii_case(word)) {
                non_frequent.push(word.clone());
            }
        }

        let mut history = user.passage_history.clone();
        history.push(metadata);

        info!(
            "Ledger update for {}: +{} unique, +{} non-frequent",
            user_id,
            new_unique_words.len(),
            new_non_frequent_words.len()
        );

        self.store
            .merge(
                user_id,
                UserUpdate {
                    unique_words_encountered: Some(unique),
                    used_non_frequent_words: Some(non_frequent),
                    passage_history: Some(history),
                    ..Default::default()
                },
            )
            .await
    }

    /// Record a terminal generation failure. The vocabulary sets are left
    /// untouched; only the history entry is appended.
    pub async fn record_failure(
        &self,
        user_id: &str,
        metadata: PassageMetadata,
    ) -> Result<()> {
        let lock = self.lock_for(user_id).await;
        let _guard = lock.lock().await;

        let user = self.load(user_id).await?;
        let mut history = user.passage_history.clone();
        history.push(metadata);

        self.store
            .merge(
                user_id,
                UserUpdate {
                    passage_history: Some(history),
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }

    /// Close the passage-history entry identified by `passage_id`: set its
    /// end time and the derived time spent.
    pub async fn close_passage(
        &self,
        user_id: &str,
        passage_id: &str,
        end_time: DateTime<Utc>,
    ) -> Result<()> {
        let lock = self.lock_for(user_id).await;
        let _guard = lock.lock().await;

        let user = self.load(user_id).await?;
        let mut history = user.passage_history.clone();
        let entry = history
            .iter_mut()
            .rev()
            .find(|p| p.passage_id == passage_id)
            .ok_or_else(|| ServiceError::PassageNotFound(passage_id.to_string()))?;

        entry.end_time = Some(end_time);
        entry.time_spent_ms = Some((end_time - entry.start_time).num_milliseconds());

        self.store
            .merge(
                user_id,
                UserUpdate {
                    passage_history: Some(history),
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }

    /// User-initiated destructive reset of exactly one tracked set.
    pub async fn clear(&self, user_id: &str, target: ClearTarget) -> Result<User> {
        let lock = self.lock_for(user_id).await;
        let _guard = lock.lock().await;

        // Existence check before the merge so the caller gets a 404, not a
        // store error
        self.load(user_id).await?;

        let update = match target {
            ClearTarget::NonFrequent => UserUpdate {
                used_non_frequent_words: Some(Vec::new()),
                ..Default::default()
            },
            ClearTarget::UniqueEncountered => UserUpdate {
                unique_words_encountered: Some(Vec::new()),
                ..Default::default()
            },
        };

        info!("Cleared {:?} ledger for {}", target, user_id);
        self.store.merge(user_id, update).await
    }
}
