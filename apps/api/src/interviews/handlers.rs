use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interviews::runner::Runner;
use crate::interviews::status::InterviewStatus;
use crate::interviews::voice::parse_event;
use crate::webhook::signature::secrets_match;
use crate::models::interview::InterviewReport;
use crate::state::AppState;

pub const VOICE_SECRET_HEADER: &str = "x-voice-secret";
const DEFAULT_MAX_CALL: Duration = Duration::from_secs(30 * 60);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInterviewResponse {
    pub success: bool,
    pub interview_id: Uuid,
    pub status: InterviewStatus,
    pub report: Option<InterviewReport>,
}

#[derive(Serialize)]
pub struct VoiceEventResponse {
    pub success: bool,
    pub routed: bool,
}

/// POST /api/interviews/:id/run
pub async fn handle_run_interview(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<RunInterviewResponse>, AppError> {
    authorize_internal(&state, &headers)?;

    if state.ledger.get_interview(id).await?.is_none() {
        return Err(AppError::NotFound(format!("Interview {id} not found")));
    }
    let voice = state
        .voice
        .as_deref()
        .ok_or(AppError::Unavailable("Voice provider"))?;
    let llm = state.llm.as_ref().ok_or(AppError::Unavailable("Model"))?;

    let max_call = state
        .config
        .voice
        .as_ref()
        .map(|v| Duration::from_secs(v.max_call_minutes * 60))
        .unwrap_or(DEFAULT_MAX_CALL);
    let runner = Runner {
        ledger: &state.ledger,
        llm,
        voice,
        sessions: &state.sessions,
        mailer: state.mailer(),
        hr_address: state.config.mail.as_ref().and_then(|m| m.hr_address.as_deref()),
        max_call,
        events_url: state
            .config
            .public_base_url
            .as_ref()
            .map(|base| format!("{base}/api/voice/events")),
    };
    let interview = runner.run(id).await?;

    Ok(Json(RunInterviewResponse {
        success: true,
        interview_id: interview.id,
        status: interview.status,
        report: interview.report,
    }))
}

/// POST /api/voice/events
pub async fn handle_voice_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<VoiceEventResponse>, AppError> {
    if let Some(secret) = state.config.voice.as_ref().and_then(|v| v.webhook_secret.as_deref()) {
        let provided = headers
            .get(VOICE_SECRET_HEADER)
            .and_then(|v| v.to_str().ok());
        if !provided.is_some_and(|p| secrets_match(secret, p)) {
            warn!("Rejected voice event with bad secret");
            return Err(AppError::Unauthorized);
        }
    }

    let routed = match parse_event(&body) {
        Ok(Some(routed)) => {
            let delivered = state.sessions.dispatch(routed.interview_id, routed.event);
            if !delivered {
                debug!(interview_id = %routed.interview_id, "No live session for voice event");
            }
            delivered
        }
        Ok(None) => false,
        Err(e) => return Err(AppError::Validation(e.to_string())),
    };

    Ok(Json(VoiceEventResponse {
        success: true,
        routed,
    }))
}

/// Bearer check for internal callers. With no key configured nothing passes.
fn authorize_internal(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected) = state.config.internal_api_key.as_deref() else {
        warn!("INTERNAL_API_KEY not set; rejecting runner call");
        return Err(AppError::Unauthorized);
    };
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);
    if token.is_some_and(|t| secrets_match(expected, t)) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}
