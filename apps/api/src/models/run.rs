use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortlistEntry {
    pub candidate_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub score: u32,
}

/// One resume-screening batch against one job description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: Uuid,
    pub job_description: String,
    pub created_at: DateTime<Utc>,
    /// Number of files submitted.
    pub total: u32,
    /// Files that produced a candidate.
    pub processed: u32,
    pub failed: u32,
    pub shortlisted: Vec<ShortlistEntry>,
    pub status: RunStatus,
}

impl Run {
    pub fn new(job_description: String, total: u32) -> Self {
        Run {
            id: Uuid::new_v4(),
            job_description,
            created_at: Utc::now(),
            total,
            processed: 0,
            failed: 0,
            shortlisted: Vec::new(),
            status: RunStatus::Processing,
        }
    }

    /// Moves the run out of `processing`. A run whose every file failed is
    /// marked `failed`; anything else is `completed`.
    pub fn finish(&mut self, processed: u32, failed: u32, shortlisted: Vec<ShortlistEntry>) {
        self.processed = processed;
        self.failed = failed;
        self.shortlisted = shortlisted;
        self.status = if self.total > 0 && processed == 0 {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_is_processing() {
        let run = Run::new("Backend engineer".to_string(), 3);
        assert_eq!(run.status, RunStatus::Processing);
        assert_eq!(run.total, 3);
        assert!(run.shortlisted.is_empty());
    }

    #[test]
    fn test_finish_with_candidates_completes() {
        let mut run = Run::new("jd".to_string(), 3);
        run.finish(2, 1, vec![]);
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.processed + run.failed, run.total);
    }

    #[test]
    fn test_finish_with_no_candidates_fails() {
        let mut run = Run::new("jd".to_string(), 2);
        run.finish(0, 2, vec![]);
        assert_eq!(run.status, RunStatus::Failed);
    }

    #[test]
    fn test_run_ids_are_unique() {
        let a = Run::new("jd".to_string(), 1);
        let b = Run::new("jd".to_string(), 1);
        assert_ne!(a.id, b.id);
    }
}
