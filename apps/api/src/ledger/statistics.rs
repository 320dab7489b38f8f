use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::interviews::status::InterviewStatus;
use crate::models::candidate::Candidate;
use crate::models::interview::Interview;
use crate::models::run::Run;
use crate::screening::shortlist::ShortlistPolicy;

/// Aggregate snapshot for the dashboard. Always recomputed from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_candidates: usize,
    pub shortlisted: usize,
    pub interviews_completed: usize,
    pub interviews_scheduled: usize,
    pub total_runs: usize,
    /// Mean candidate match score, one decimal place.
    pub average_match_score: f64,
    pub last_updated: DateTime<Utc>,
}

impl Statistics {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Statistics {
            total_candidates: 0,
            shortlisted: 0,
            interviews_completed: 0,
            interviews_scheduled: 0,
            total_runs: 0,
            average_match_score: 0.0,
            last_updated: now,
        }
    }
}

/// Folds the full ledger into a snapshot. Pure: same inputs, same numbers.
pub fn compute(
    runs: &[Run],
    candidates: &[Candidate],
    interviews: &[Interview],
    policy: &ShortlistPolicy,
    now: DateTime<Utc>,
) -> Statistics {
    let mut stats = Statistics::empty(now);
    stats.total_runs = runs.len();
    stats.total_candidates = candidates.len();

    let mut score_sum: u64 = 0;
    for candidate in candidates {
        score_sum += u64::from(candidate.analysis.match_score);
        if policy.is_shortlisted(&candidate.analysis) {
            stats.shortlisted += 1;
        }
    }
    if !candidates.is_empty() {
        let mean = score_sum as f64 / candidates.len() as f64;
        stats.average_match_score = (mean * 10.0).round() / 10.0;
    }

    for interview in interviews {
        match interview.status {
            InterviewStatus::Completed => stats.interviews_completed += 1,
            InterviewStatus::Scheduled => stats.interviews_scheduled += 1,
            InterviewStatus::InProgress | InterviewStatus::Failed => {}
        }
    }

    stats
}
