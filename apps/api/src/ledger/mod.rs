//! Ledger: persisted runs, candidates, interviews and practice records.
//!
//! The ledger degrades instead of failing: with no store configured, reads
//! come back empty and writes are skipped, so the API stays usable in a demo
//! deployment. A configured store that cannot be reached surfaces as
//! `LedgerError::is_unreachable`, which read-only surfaces degrade on. Filtered queries the store cannot serve fall back to a full
//! scan with in-memory filtering.

use std::sync::Arc;

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

pub mod postgres;
pub mod statistics;
pub mod store;

#[cfg(test)]
pub mod memory;

use crate::models::candidate::Candidate;
use crate::models::interview::Interview;
use crate::models::practice::{Feedback, PracticeInterview};
use crate::models::run::Run;
use crate::screening::shortlist::ShortlistPolicy;
use statistics::Statistics;
use store::{Collection, DocumentStore, Query, StoreError};

const STATISTICS_DOC_ID: &str = "current";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to encode {collection} document: {source}")]
    Encode {
        collection: &'static str,
        source: serde_json::Error,
    },

    #[error("corrupt {collection} document {id}: {source}")]
    Decode {
        collection: &'static str,
        id: String,
        source: serde_json::Error,
    },
}

impl LedgerError {
    /// The store is configured but the backend did not answer.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, LedgerError::Store(StoreError::Database(_)))
    }
}

#[derive(Clone, Default)]
pub struct Ledger {
    store: Option<Arc<dyn DocumentStore>>,
}

impl Ledger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store: Some(store) }
    }

    /// A ledger with no backing store.
    pub fn unavailable() -> Self {
        Self { store: None }
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    // ── Runs ────────────────────────────────────────────────────────────────

    pub async fn create_run(&self, run: &Run) -> Result<(), LedgerError> {
        self.write(Collection::Runs, &run.id.to_string(), run).await
    }

    /// Persists the single processing → completed/failed mutation of a run.
    pub async fn finish_run(&self, run: &Run) -> Result<(), LedgerError> {
        self.write(Collection::Runs, &run.id.to_string(), run).await
    }

    pub async fn get_run(&self, id: Uuid) -> Result<Option<Run>, LedgerError> {
        self.read(Collection::Runs, &id.to_string()).await
    }

    /// All runs, newest first.
    pub async fn list_runs(&self) -> Result<Vec<Run>, LedgerError> {
        let mut runs: Vec<Run> = self.all(Collection::Runs).await?;
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(runs)
    }

    // ── Candidates ──────────────────────────────────────────────────────────

    pub async fn save_candidate(&self, candidate: &Candidate) -> Result<(), LedgerError> {
        self.write(Collection::Candidates, &candidate.id.to_string(), candidate)
            .await
    }

    pub async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>, LedgerError> {
        self.read(Collection::Candidates, &id.to_string()).await
    }

    pub async fn candidates_for_run(&self, run_id: Uuid) -> Result<Vec<Candidate>, LedgerError> {
        let mut candidates: Vec<Candidate> = self
            .find(
                Collection::Candidates,
                Query::eq("runId", run_id.to_string()),
            )
            .await?;
        candidates.sort_by(|a, b| b.analysis.match_score.cmp(&a.analysis.match_score));
        Ok(candidates)
    }

    /// Most recent candidate with this address (case-insensitive).
    pub async fn find_candidate_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Candidate>, LedgerError> {
        let query = Query::eq("email", email.trim().to_lowercase())
            .newest_first()
            .limit(1);
        let mut found: Vec<Candidate> = self.find(Collection::Candidates, query).await?;
        Ok(found.pop())
    }

    pub async fn list_candidates(&self) -> Result<Vec<Candidate>, LedgerError> {
        self.all(Collection::Candidates).await
    }

    // ── Interviews ──────────────────────────────────────────────────────────

    pub async fn save_interview(&self, interview: &Interview) -> Result<(), LedgerError> {
        self.write(Collection::Interviews, &interview.id.to_string(), interview)
            .await
    }

    pub async fn get_interview(&self, id: Uuid) -> Result<Option<Interview>, LedgerError> {
        self.read(Collection::Interviews, &id.to_string()).await
    }

    /// The interview created for a scheduling provider event, if any.
    pub async fn find_interview_by_event_ref(
        &self,
        event_ref: &str,
    ) -> Result<Option<Interview>, LedgerError> {
        let query = Query::eq("schedulingEventRef", event_ref)
            .newest_first()
            .limit(1);
        let mut found: Vec<Interview> = self.find(Collection::Interviews, query).await?;
        Ok(found.pop())
    }

    /// All recruitment interviews, soonest scheduled first.
    pub async fn list_interviews(&self) -> Result<Vec<Interview>, LedgerError> {
        let mut interviews: Vec<Interview> = self.all(Collection::Interviews).await?;
        interviews.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at));
        Ok(interviews)
    }

    // ── Practice track ──────────────────────────────────────────────────────

    pub async fn save_practice_interview(
        &self,
        interview: &PracticeInterview,
    ) -> Result<(), LedgerError> {
        self.write(
            Collection::PracticeInterviews,
            &interview.id.to_string(),
            interview,
        )
        .await
    }

    pub async fn get_practice_interview(
        &self,
        id: Uuid,
    ) -> Result<Option<PracticeInterview>, LedgerError> {
        self.read(Collection::PracticeInterviews, &id.to_string())
            .await
    }

    pub async fn practice_interviews_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<PracticeInterview>, LedgerError> {
        self.find(
            Collection::PracticeInterviews,
            Query::eq("userId", user_id).newest_first(),
        )
        .await
    }

    pub async fn save_feedback(&self, feedback: &Feedback) -> Result<(), LedgerError> {
        self.write(Collection::Feedback, &feedback.id.to_string(), feedback)
            .await
    }

    /// Latest feedback a user received for a practice interview.
    pub async fn feedback_for(
        &self,
        interview_id: Uuid,
        user_id: &str,
    ) -> Result<Option<Feedback>, LedgerError> {
        let feedback: Vec<Feedback> = self
            .find(
                Collection::Feedback,
                Query::eq("interviewId", interview_id.to_string()).newest_first(),
            )
            .await?;
        Ok(feedback.into_iter().find(|f| f.user_id == user_id))
    }

    // ── Statistics ──────────────────────────────────────────────────────────

    /// Re-reads every run, candidate and interview, folds them into a
    /// snapshot and caches it. The cache write is best effort; an unreachable
    /// store yields a zeroed snapshot.
    pub async fn statistics(&self, policy: &ShortlistPolicy) -> Result<Statistics, LedgerError> {
        let now = Utc::now();
        if !self.is_available() {
            return Ok(Statistics::empty(now));
        }

        let (runs, candidates, interviews) = match self.statistics_inputs().await {
            Ok(inputs) => inputs,
            Err(e) if e.is_unreachable() => {
                warn!("Store unreachable; statistics zeroed: {e}");
                return Ok(Statistics::empty(now));
            }
            Err(e) => return Err(e),
        };
        let stats = statistics::compute(&runs, &candidates, &interviews, policy, now);

        if let Err(e) = self
            .write(Collection::Statistics, STATISTICS_DOC_ID, &stats)
            .await
        {
            warn!("Failed to cache statistics snapshot: {e}");
        }
        Ok(stats)
    }

    async fn statistics_inputs(
        &self,
    ) -> Result<(Vec<Run>, Vec<Candidate>, Vec<Interview>), LedgerError> {
        Ok((
            self.list_runs().await?,
            self.list_candidates().await?,
            self.list_interviews().await?,
        ))
    }

    // ── Generic helpers ─────────────────────────────────────────────────────

    async fn write<T: Serialize>(
        &self,
        collection: Collection,
        id: &str,
        record: &T,
    ) -> Result<(), LedgerError> {
        let Some(store) = &self.store else {
            debug!(collection = collection.name(), id, "No store configured; write skipped");
            return Ok(());
        };
        let doc = serde_json::to_value(record).map_err(|source| LedgerError::Encode {
            collection: collection.name(),
            source,
        })?;
        store.put(collection, id, doc).await?;
        Ok(())
    }

    async fn read<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<T>, LedgerError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        match store.get(collection, id).await? {
            Some(doc) => serde_json::from_value(doc)
                .map(Some)
                .map_err(|source| LedgerError::Decode {
                    collection: collection.name(),
                    id: id.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    async fn find<T: DeserializeOwned>(
        &self,
        collection: Collection,
        query: Query,
    ) -> Result<Vec<T>, LedgerError> {
        let Some(store) = &self.store else {
            return Ok(Vec::new());
        };
        let docs = match store.query(collection, &query).await {
            Ok(docs) => docs,
            Err(StoreError::QueryUnsupported(reason)) => {
                warn!(
                    collection = collection.name(),
                    field = query.field,
                    "Indexed query unavailable ({reason}); scanning collection"
                );
                query.apply(store.scan(collection).await?)
            }
            Err(e) => return Err(e.into()),
        };
        Ok(decode_all(collection, docs))
    }

    async fn all<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>, LedgerError> {
        let Some(store) = &self.store else {
            return Ok(Vec::new());
        };
        Ok(decode_all(collection, store.scan(collection).await?))
    }
}

/// Decodes documents, skipping (and logging) any that no longer fit the schema.
fn decode_all<T: DeserializeOwned>(collection: Collection, docs: Vec<serde_json::Value>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| match serde_json::from_value(doc) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(collection = collection.name(), "Skipping corrupt document: {e}");
                None
            }
        })
        .collect()
}
