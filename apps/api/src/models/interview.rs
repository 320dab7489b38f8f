use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interviews::status::{InterviewStatus, TransitionError};
use crate::models::candidate::Candidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Assistant,
    User,
    System,
}

impl Speaker {
    pub fn label(self) -> &'static str {
        match self {
            Speaker::Assistant => "Interviewer",
            Speaker::User => "Candidate",
            Speaker::System => "System",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptTurn {
    pub role: Speaker,
    pub content: String,
}

/// Renders a transcript as `- Label: text` lines for grading prompts.
pub fn format_transcript(turns: &[TranscriptTurn]) -> String {
    turns
        .iter()
        .map(|t| format!("- {}: {}", t.role.label(), t.content.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NextStep {
    Advance,
    Hold,
    Reject,
}

/// AI-graded outcome of a recruitment interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewReport {
    pub overall_score: u32,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendation: NextStep,
    pub notes: String,
}

/// A scheduled voice interview tied to one candidate of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub candidate_email: String,
    pub candidate_name: String,
    pub run_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    /// Scheduling provider's event URI.
    pub scheduling_event_ref: String,
    pub voice_call_ref: Option<String>,
    #[serde(default)]
    pub transcript: Vec<TranscriptTurn>,
    pub recording_ref: Option<String>,
    pub report: Option<InterviewReport>,
    pub status: InterviewStatus,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Interview {
    pub fn scheduled(
        candidate: &Candidate,
        candidate_email: String,
        scheduled_at: DateTime<Utc>,
        scheduling_event_ref: String,
    ) -> Self {
        let now = Utc::now();
        Interview {
            id: Uuid::new_v4(),
            candidate_id: candidate.id,
            candidate_email,
            candidate_name: candidate.analysis.name.clone(),
            run_id: candidate.run_id,
            scheduled_at,
            scheduling_event_ref,
            voice_call_ref: None,
            transcript: Vec::new(),
            recording_ref: None,
            report: None,
            status: InterviewStatus::Scheduled,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a guarded status transition and stamps `updated_at`.
    pub fn advance(&mut self, next: InterviewStatus) -> Result<(), TransitionError> {
        self.status = self.status.transition(next)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), TransitionError> {
        self.advance(InterviewStatus::Failed)?;
        self.failure_reason = Some(reason.into());
        Ok(())
    }
}
