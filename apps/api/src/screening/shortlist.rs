//! Shortlist decision: the one place a candidate is advanced to scheduling.
//!
//! Run processing, run detail reads and dashboard statistics all ask the
//! configured `ShortlistPolicy`; nothing else compares scores to thresholds.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::models::candidate::{CandidateAnalysis, Recommendation};

pub const DEFAULT_THRESHOLD: u32 = 85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "policy", content = "threshold", rename_all = "snake_case")]
pub enum ShortlistPolicy {
    /// Shortlist when the scorer recommends "yes". The threshold is the bar
    /// the scorer is asked to recommend at.
    Recommendation(u32),
    /// Shortlist when the overall score and every breakdown dimension reach the threshold.
    Threshold(u32),
}

impl Default for ShortlistPolicy {
    fn default() -> Self {
        ShortlistPolicy::Threshold(DEFAULT_THRESHOLD)
    }
}

impl ShortlistPolicy {
    /// Builds the policy from `SHORTLIST_POLICY` / `SHORTLIST_THRESHOLD`.
    pub fn from_settings(policy: Option<&str>, threshold: Option<u32>) -> Result<Self> {
        let threshold = threshold.unwrap_or(DEFAULT_THRESHOLD);
        if threshold > 100 {
            bail!("SHORTLIST_THRESHOLD must be between 0 and 100, got {threshold}");
        }
        match policy.map(|p| p.to_ascii_lowercase()).as_deref() {
            None | Some("threshold") => Ok(ShortlistPolicy::Threshold(threshold)),
            Some("recommendation") => Ok(ShortlistPolicy::Recommendation(threshold)),
            Some(other) => bail!(
                "SHORTLIST_POLICY must be 'threshold' or 'recommendation', got '{other}'"
            ),
        }
    }

    pub fn threshold(&self) -> u32 {
        match *self {
            ShortlistPolicy::Recommendation(threshold) | ShortlistPolicy::Threshold(threshold) => {
                threshold
            }
        }
    }

    pub fn is_shortlisted(&self, analysis: &CandidateAnalysis) -> bool {
        match *self {
            ShortlistPolicy::Recommendation(_) => analysis.recommendation == Recommendation::Yes,
            ShortlistPolicy::Threshold(threshold) => {
                analysis.match_score >= threshold
                    && analysis
                        .score_breakdown
                        .dimensions()
                        .iter()
                        .all(|(_, score)| *score >= threshold)
            }
        }
    }
}
