use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::Interview;
use crate::state::AppState;
use crate::webhook::signature::verify_signature;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";
const INVITEE_CREATED: &str = "invitee.created";

#[derive(Debug, Deserialize)]
pub struct SchedulingEvent {
    pub event: String,
    #[serde(default)]
    pub payload: Option<InviteePayload>,
}

#[derive(Debug, Deserialize)]
pub struct InviteePayload {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    pub scheduled_event: ScheduledEvent,
}

#[derive(Debug, Deserialize)]
pub struct ScheduledEvent {
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview_id: Option<Uuid>,
    pub triggered: bool,
}

impl WebhookResponse {
    fn acknowledged(message: impl Into<String>) -> Self {
        WebhookResponse {
            success: true,
            message: message.into(),
            interview_id: None,
            triggered: false,
        }
    }
}

/// POST /api/webhooks/scheduling
pub async fn handle_scheduling_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, AppError> {
    match &state.config.webhook_secret {
        Some(secret) => {
            let header = headers
                .get(SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok());
            verify_signature(secret, &body, header).map_err(|e| {
                warn!("Rejected scheduling webhook: {e}");
                AppError::Unauthorized
            })?;
        }
        None => warn!("WEBHOOK_SECRET not set; scheduling webhook accepted unverified"),
    }

    let event: SchedulingEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Malformed webhook payload: {e}")))?;

    if event.event != INVITEE_CREATED {
        info!(event = %event.event, "Ignoring scheduling event");
        return Ok(Json(WebhookResponse::acknowledged(format!(
            "Event '{}' ignored",
            event.event
        ))));
    }
    let payload = event.payload.ok_or_else(|| {
        AppError::Validation(format!("'{INVITEE_CREATED}' event without payload"))
    })?;

    let event_ref = payload
        .scheduled_event
        .uri
        .clone()
        .or_else(|| payload.uri.clone())
        .unwrap_or_default();

    // Providers redeliver on timeout; one event maps to one interview.
    if !event_ref.is_empty() {
        if let Some(existing) = state.ledger.find_interview_by_event_ref(&event_ref).await? {
            info!(interview_id = %existing.id, %event_ref, "Duplicate scheduling delivery acknowledged");
            return Ok(Json(WebhookResponse {
                interview_id: Some(existing.id),
                ..WebhookResponse::acknowledged("Interview already scheduled")
            }));
        }
    }

    let Some(candidate) = state.ledger.find_candidate_by_email(&payload.email).await? else {
        warn!(email = %payload.email, "No candidate for scheduled invitee");
        return Ok(Json(WebhookResponse::acknowledged("Candidate not found")));
    };

    let mut interview = Interview::scheduled(
        &candidate,
        payload.email.trim().to_lowercase(),
        payload.scheduled_event.start_time,
        event_ref,
    );
    if let Some(name) = payload.name.filter(|n| !n.trim().is_empty()) {
        interview.candidate_name = name.trim().to_string();
    }
    state.ledger.save_interview(&interview).await?;
    info!(
        interview_id = %interview.id,
        candidate_id = %candidate.id,
        scheduled_at = %interview.scheduled_at,
        "Interview scheduled"
    );

    let window = Duration::hours(state.config.auto_trigger_window_hours);
    let triggered = if interview.scheduled_at <= Utc::now() + window {
        trigger_runner(&state, interview.id).await
    } else {
        info!(
            interview_id = %interview.id,
            "Interview is beyond the auto-trigger window; left scheduled"
        );
        false
    };

    Ok(Json(WebhookResponse {
        success: true,
        message: "Interview scheduled".to_string(),
        interview_id: Some(interview.id),
        triggered,
    }))
}

/// Calls this service's own runner endpoint and waits for it to finish.
async fn trigger_runner(state: &AppState, interview_id: Uuid) -> bool {
    let (Some(base_url), Some(token)) = (
        state.config.public_base_url.as_deref(),
        state.config.internal_api_key.as_deref(),
    ) else {
        warn!(%interview_id, "PUBLIC_BASE_URL or INTERNAL_API_KEY not set; runner not triggered");
        return false;
    };

    let url = format!("{base_url}/api/interviews/{interview_id}/run");
    match state.http.post(&url).bearer_auth(token).send().await {
        Ok(resp) if resp.status().is_success() => {
            info!(%interview_id, "Interview runner finished");
            true
        }
        Ok(resp) => {
            warn!(%interview_id, status = %resp.status(), "Interview runner reported failure");
            false
        }
        Err(e) => {
            warn!(%interview_id, "Could not reach interview runner: {e}");
            false
        }
    }
}
