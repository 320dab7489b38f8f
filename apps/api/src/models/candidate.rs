use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Binary hiring recommendation returned by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Yes,
    No,
}

/// Per-dimension match scores, each 0 to 100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub skills_match: u32,
    pub experience_match: u32,
    pub role_match: u32,
    pub education_match: u32,
}

impl ScoreBreakdown {
    pub fn dimensions(&self) -> [(&'static str, u32); 4] {
        [
            ("skillsMatch", self.skills_match),
            ("experienceMatch", self.experience_match),
            ("roleMatch", self.role_match),
            ("educationMatch", self.education_match),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedFeedback {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub gaps: Vec<String>,
    pub recommendations: Vec<String>,
    pub score_explanation: String,
}

/// Structured analysis of one resume against one job description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateAnalysis {
    pub name: String,
    pub email: Option<String>,
    pub top_skills: Vec<String>,
    pub summary: String,
    pub match_score: u32,
    pub recommendation: Recommendation,
    pub score_breakdown: ScoreBreakdown,
    #[serde(default)]
    pub matched_skills: Vec<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    pub experience_level: String,
    pub detailed_feedback: DetailedFeedback,
}

/// One parsed and scored resume within a run. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Uuid,
    pub run_id: Uuid,
    pub file_name: String,
    pub text_snippet: String,
    pub analysis: CandidateAnalysis,
    /// Lower-cased contact address; the webhook looks candidates up by it.
    pub email: Option<String>,
    /// Object key of the archived original upload, when archiving is enabled.
    pub source_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSummary {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub file_name: String,
    pub match_score: u32,
    pub recommendation: Recommendation,
    pub shortlisted: bool,
}

impl Candidate {
    pub fn summary(&self, shortlisted: bool) -> CandidateSummary {
        CandidateSummary {
            id: self.id,
            name: self.analysis.name.clone(),
            email: self.email.clone(),
            file_name: self.file_name.clone(),
            match_score: self.analysis.match_score,
            recommendation: self.analysis.recommendation,
            shortlisted,
        }
    }
}
