//! Voice provider seam and the Vapi client behind it.
//!
//! The provider only needs to start a call. Everything that happens during the
//! call arrives later as server messages on `/api/voice/events`, which
//! `parse_event` turns into `SessionEvent`s addressed by interview id.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::VoiceConfig;
use crate::models::interview::{Speaker, TranscriptTurn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("voice API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("voice API response carried no call id")]
    MissingCallId,

    #[error("invalid voice event: {0}")]
    Event(#[from] serde_json::Error),
}

/// Everything needed to place one interview call.
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub interview_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub system_prompt: String,
    pub first_message: String,
    pub max_duration: Duration,
    /// Where the provider should post server messages for this call.
    pub events_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedCall {
    pub call_ref: String,
}

#[async_trait]
pub trait VoiceProvider: Send + Sync {
    async fn start_call(&self, request: CallRequest) -> Result<StartedCall, VoiceError>;
}

pub struct VapiClient {
    http: Client,
    api_key: String,
    api_url: String,
}

impl VapiClient {
    pub fn new(config: &VoiceConfig) -> Result<Self, VoiceError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Deserialize)]
struct CreatedCall {
    id: Option<String>,
}

#[async_trait]
impl VoiceProvider for VapiClient {
    async fn start_call(&self, request: CallRequest) -> Result<StartedCall, VoiceError> {
        let mut assistant = json!({
            "firstMessage": request.first_message,
            "model": {
                "provider": "openai",
                "model": "gpt-4o",
                "messages": [{ "role": "system", "content": request.system_prompt }]
            },
            "transcriber": { "provider": "deepgram", "model": "nova-2", "language": "en" },
            "maxDurationSeconds": request.max_duration.as_secs(),
            "recordingEnabled": true,
        });
        if let Some(url) = &request.events_url {
            assistant["serverUrl"] = json!(url);
        }
        let body = json!({
            "assistant": assistant,
            "customer": { "name": request.candidate_name, "email": request.candidate_email },
            "metadata": { "interviewId": request.interview_id },
        });

        let resp = self
            .http
            .post(format!("{}/call/web", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(VoiceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedCall = resp.json().await?;
        let call_ref = created.id.ok_or(VoiceError::MissingCallId)?;
        info!(interview_id = %request.interview_id, call_ref = %call_ref, "Voice call started");
        Ok(StartedCall { call_ref })
    }
}

/// What a live session cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A finalised utterance.
    Transcript(TranscriptTurn),
    CallEnded { recording_ref: Option<String> },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedEvent {
    pub interview_id: Uuid,
    pub event: SessionEvent,
}

#[derive(Deserialize)]
struct Envelope {
    message: ServerMessage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerMessage {
    #[serde(rename = "type")]
    kind: String,
    role: Option<String>,
    transcript_type: Option<String>,
    transcript: Option<String>,
    recording_url: Option<String>,
    artifact: Option<Artifact>,
    ended_reason: Option<String>,
    error: Option<String>,
    call: Option<CallInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Artifact {
    recording_url: Option<String>,
}

#[derive(Deserialize)]
struct CallInfo {
    #[serde(default)]
    metadata: Option<CallMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallMetadata {
    interview_id: Option<Uuid>,
}

/// Parses a provider server message. `Ok(None)` means the message is valid
/// but irrelevant to a session (partial transcripts, status chatter, calls
/// not started by the runner).
pub fn parse_event(body: &[u8]) -> Result<Option<RoutedEvent>, VoiceError> {
    let Envelope { message } = serde_json::from_slice(body)?;

    let Some(interview_id) = message
        .call
        .as_ref()
        .and_then(|c| c.metadata.as_ref())
        .and_then(|m| m.interview_id)
    else {
        debug!(kind = %message.kind, "Voice event without interview id ignored");
        return Ok(None);
    };

    let event = match message.kind.as_str() {
        "transcript" => {
            if message.transcript_type.as_deref() != Some("final") {
                return Ok(None);
            }
            let content = message.transcript.unwrap_or_default();
            if content.trim().is_empty() {
                return Ok(None);
            }
            let role = match message.role.as_deref() {
                Some("assistant" | "bot") => Speaker::Assistant,
                Some("user" | "customer") => Speaker::User,
                _ => Speaker::System,
            };
            SessionEvent::Transcript(TranscriptTurn { role, content })
        }
        "end-of-call-report" => match message.ended_reason {
            Some(reason) if reason.contains("error") => SessionEvent::Failed(reason),
            _ => SessionEvent::CallEnded {
                recording_ref: message
                    .recording_url
                    .or_else(|| message.artifact.and_then(|a| a.recording_url)),
            },
        },
        "error" => SessionEvent::Failed(
            message
                .error
                .unwrap_or_else(|| "voice provider reported an error".to_string()),
        ),
        _ => return Ok(None),
    };

    Ok(Some(RoutedEvent {
        interview_id,
        event,
    }))
}
