use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::LlmError;
use crate::models::interview::TranscriptTurn;
use crate::models::practice::{Feedback, PracticeInterview};
use crate::practice::feedback::grade;
use crate::practice::questions::{
    generate_questions, PracticeError, QuestionBrief, MAX_QUESTIONS, MIN_QUESTIONS,
};
use crate::state::AppState;

/// Tech stack as a list or a comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TechStack {
    List(Vec<String>),
    Csv(String),
}

impl TechStack {
    fn into_vec(self) -> Vec<String> {
        let items = match self {
            TechStack::List(items) => items,
            TechStack::Csv(csv) => csv.split(',').map(str::to_string).collect(),
        };
        items
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePracticeRequest {
    pub user_id: String,
    pub role: String,
    pub level: String,
    #[serde(rename = "type")]
    pub interview_type: String,
    pub techstack: TechStack,
    pub amount: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub user_id: String,
    pub transcript: Vec<TranscriptTurn>,
}

#[derive(Serialize)]
pub struct PracticeInterviewResponse {
    pub success: bool,
    pub interview: PracticeInterview,
}

#[derive(Serialize)]
pub struct PracticeListResponse {
    pub success: bool,
    pub interviews: Vec<PracticeInterview>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_id: Option<Uuid>,
    pub feedback: Feedback,
}

/// Transport failures are 502; a reply that arrived but does not fit the
/// feedback or question schema is 422.
impl From<PracticeError> for AppError {
    fn from(e: PracticeError) -> Self {
        match e {
            PracticeError::Invalid(_) | PracticeError::Llm(LlmError::Parse(_)) => {
                AppError::UnprocessableEntity(e.to_string())
            }
            PracticeError::Llm(_) => AppError::Llm(e.to_string()),
        }
    }
}

fn required(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// POST /api/practice/interviews
pub async fn handle_create_practice(
    State(state): State<AppState>,
    Json(req): Json<CreatePracticeRequest>,
) -> Result<Json<PracticeInterviewResponse>, AppError> {
    required("userId", &req.user_id)?;
    required("role", &req.role)?;
    required("level", &req.level)?;
    required("type", &req.interview_type)?;
    if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&req.amount) {
        return Err(AppError::Validation(format!(
            "amount must be between {MIN_QUESTIONS} and {MAX_QUESTIONS}"
        )));
    }
    let llm = state.llm.as_ref().ok_or(AppError::Unavailable("Model"))?;

    let techstack = req.techstack.into_vec();
    let questions = generate_questions(
        llm,
        &QuestionBrief {
            role: req.role.trim(),
            level: req.level.trim(),
            interview_type: req.interview_type.trim(),
            techstack: &techstack,
            amount: req.amount,
        },
    )
    .await?;

    let interview = PracticeInterview {
        id: Uuid::new_v4(),
        user_id: req.user_id.trim().to_string(),
        role: req.role.trim().to_string(),
        level: req.level.trim().to_string(),
        interview_type: req.interview_type.trim().to_string(),
        techstack,
        questions,
        created_at: Utc::now(),
    };
    state.ledger.save_practice_interview(&interview).await?;
    info!(interview_id = %interview.id, questions = interview.questions.len(), "Practice interview created");

    Ok(Json(PracticeInterviewResponse {
        success: true,
        interview,
    }))
}

/// GET /api/practice/interviews?userId=
pub async fn handle_list_practice(
    State(state): State<AppState>,
    Query(params): Query<UserQuery>,
) -> Result<Json<PracticeListResponse>, AppError> {
    let user_id = params.user_id.unwrap_or_default();
    required("userId", &user_id)?;
    let interviews = state.ledger.practice_interviews_for_user(user_id.trim()).await?;
    Ok(Json(PracticeListResponse {
        success: true,
        interviews,
    }))
}

/// POST /api/practice/interviews/:id/feedback
pub async fn handle_create_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, AppError> {
    required("userId", &req.user_id)?;
    if req.transcript.iter().all(|t| t.content.trim().is_empty()) {
        return Err(AppError::Validation("transcript is empty".to_string()));
    }
    let llm = state.llm.as_ref().ok_or(AppError::Unavailable("Model"))?;

    let interview = state
        .ledger
        .get_practice_interview(id)
        .await?
        .filter(|i| i.user_id == req.user_id.trim())
        .ok_or_else(|| AppError::NotFound(format!("Practice interview {id} not found")))?;

    let feedback = grade(llm, &interview, req.user_id.trim(), &req.transcript).await?;
    state.ledger.save_feedback(&feedback).await?;
    info!(
        interview_id = %id,
        feedback_id = %feedback.id,
        score = feedback.total_score,
        "Practice feedback saved"
    );

    Ok(Json(FeedbackResponse {
        success: true,
        feedback_id: Some(feedback.id),
        feedback,
    }))
}

/// GET /api/practice/interviews/:id/feedback?userId=
pub async fn handle_get_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserQuery>,
) -> Result<Json<FeedbackResponse>, AppError> {
    let user_id = params.user_id.unwrap_or_default();
    required("userId", &user_id)?;
    let feedback = state
        .ledger
        .feedback_for(id, user_id.trim())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No feedback for interview {id}")))?;
    Ok(Json(FeedbackResponse {
        success: true,
        feedback_id: None,
        feedback,
    }))
}
