//! Candidate Scorer: turns resume text + a job description into a validated
//! `CandidateAnalysis`.
//!
//! The judgement itself comes from the model; this module owns the schema,
//! the prompt and the validation of whatever comes back.
//!
//! `AppState` holds an `Arc<dyn CandidateScorer>` when a model key is configured.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::extraction::truncate_chars;
use crate::llm_client::prompts::{json_system, render, EVIDENCE_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::candidate::CandidateAnalysis;
use crate::screening::prompts::{SCREENING_PROMPT_TEMPLATE, SCREENING_ROLE};

/// Resume characters sent to the model.
pub const RESUME_CHAR_BUDGET: usize = 12_000;
pub const MAX_SUMMARY_CHARS: usize = 500;
pub const MAX_TOP_SKILLS: usize = 10;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("{field} is {value}, expected 0-100")]
    OutOfRange { field: &'static str, value: u32 },

    #[error("analysis has an empty candidate name")]
    MissingName,
}

#[async_trait]
pub trait CandidateScorer: Send + Sync {
    async fn score(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<CandidateAnalysis, ScoringError>;
}

/// Scores through the shared `LlmClient`. `threshold` is the bar the model
/// is told to apply when it recommends a candidate.
pub struct LlmCandidateScorer {
    llm: LlmClient,
    threshold: u32,
}

impl LlmCandidateScorer {
    pub fn new(llm: LlmClient, threshold: u32) -> Self {
        Self { llm, threshold }
    }
}

#[async_trait]
impl CandidateScorer for LlmCandidateScorer {
    async fn score(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<CandidateAnalysis, ScoringError> {
        let prompt = build_prompt(resume_text, job_description, self.threshold);
        let system = json_system(SCREENING_ROLE);
        let analysis: CandidateAnalysis = self.llm.call_json(&prompt, &system).await?;
        let analysis = validate(analysis)?;
        debug!(
            name = %analysis.name,
            score = analysis.match_score,
            "Resume scored"
        );
        Ok(analysis)
    }
}

fn build_prompt(resume_text: &str, job_description: &str, threshold: u32) -> String {
    let threshold = threshold.to_string();
    render(
        SCREENING_PROMPT_TEMPLATE,
        &[
            ("evidence_instruction", EVIDENCE_INSTRUCTION),
            ("threshold", threshold.as_str()),
            ("job_description", job_description.trim()),
            ("resume_text", truncate_chars(resume_text, RESUME_CHAR_BUDGET)),
        ],
    )
}

/// Rejects out-of-range scores and trims list/summary fields to their bounds.
pub fn validate(mut analysis: CandidateAnalysis) -> Result<CandidateAnalysis, ScoringError> {
    let mut scores = vec![("matchScore", analysis.match_score)];
    scores.extend(analysis.score_breakdown.dimensions());
    for (field, value) in scores {
        if value > 100 {
            return Err(ScoringError::OutOfRange { field, value });
        }
    }

    analysis.name = analysis.name.trim().to_string();
    if analysis.name.is_empty() {
        return Err(ScoringError::MissingName);
    }

    analysis.email = analysis
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| e.contains('@'));
    analysis.top_skills.truncate(MAX_TOP_SKILLS);
    if analysis.summary.chars().count() > MAX_SUMMARY_CHARS {
        analysis.summary = truncate_chars(&analysis.summary, MAX_SUMMARY_CHARS).to_string();
    }
    Ok(analysis)
}
