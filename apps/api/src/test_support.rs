//! In-memory fakes and request helpers shared by unit and router tests.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::util::ServiceExt;

use crate::config::Config;
use crate::interviews::session::SessionRegistry;
use crate::interviews::voice::{CallRequest, SessionEvent, StartedCall, VoiceError, VoiceProvider};
use crate::ledger::Ledger;
use crate::llm_client::{LlmBackend, LlmError};
use crate::models::candidate::{
    Candidate, CandidateAnalysis, DetailedFeedback, Recommendation, ScoreBreakdown,
};
use crate::models::interview::Interview;
use crate::models::run::Run;
use crate::notify::{MailError, Mailer, OutgoingEmail};
use crate::routes::build_router;
use crate::state::AppState;

// ── LLM ─────────────────────────────────────────────────────────────────────

enum Script {
    Reply(String),
    Fail,
}

/// LLM backend answering from a script. The first rule whose needle occurs in
/// the prompt wins; an empty needle matches everything.
#[derive(Default)]
pub struct ScriptedLlm {
    rules: Vec<(String, Script)>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, needle: &str, response: &str) -> Self {
        self.rules
            .push((needle.to_string(), Script::Reply(response.to_string())));
        self
    }

    pub fn fail(mut self, needle: &str) -> Self {
        self.rules.push((needle.to_string(), Script::Fail));
        self
    }
}

#[async_trait]
impl LlmBackend for ScriptedLlm {
    async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
        match self.rules.iter().find(|(needle, _)| prompt.contains(needle.as_str())) {
            Some((_, Script::Reply(text))) => Ok(text.clone()),
            Some((_, Script::Fail)) => Err(LlmError::Api {
                status: 503,
                message: "scripted failure".to_string(),
            }),
            None => Err(LlmError::Api {
                status: 500,
                message: "no scripted reply".to_string(),
            }),
        }
    }
}

// ── Domain fixtures ─────────────────────────────────────────────────────────

/// An analysis whose overall score and every dimension equal `score`.
pub fn analysis(name: &str, score: u32, recommendation: Recommendation) -> CandidateAnalysis {
    CandidateAnalysis {
        name: name.to_string(),
        email: None,
        top_skills: vec!["Python".to_string(), "Django".to_string()],
        summary: format!("{name} is a backend engineer."),
        match_score: score,
        recommendation,
        score_breakdown: ScoreBreakdown {
            skills_match: score,
            experience_match: score,
            role_match: score,
            education_match: score,
        },
        matched_skills: vec!["Python".to_string()],
        missing_skills: Vec::new(),
        experience_level: "senior".to_string(),
        detailed_feedback: DetailedFeedback {
            strengths: vec!["Relevant stack".to_string()],
            weaknesses: Vec::new(),
            gaps: Vec::new(),
            recommendations: Vec::new(),
            score_explanation: "Scripted".to_string(),
        },
    }
}

/// The model's JSON reply for `analysis`, with no email.
pub fn analysis_json(name: &str, score: u32, recommendation: &str) -> String {
    json!({
        "name": name,
        "email": null,
        "topSkills": ["Python", "Django"],
        "summary": format!("{name} is a backend engineer."),
        "matchScore": score,
        "recommendation": recommendation,
        "scoreBreakdown": {
            "skillsMatch": score,
            "experienceMatch": score,
            "roleMatch": score,
            "educationMatch": score
        },
        "matchedSkills": ["Python"],
        "missingSkills": [],
        "experienceLevel": "senior",
        "detailedFeedback": {
            "strengths": ["Relevant stack"],
            "weaknesses": [],
            "gaps": [],
            "recommendations": [],
            "scoreExplanation": "Scripted"
        }
    })
    .to_string()
}

/// A candidate of `run` reachable at `<name>@example.com`.
pub fn candidate(run: &Run, name: &str, score: u32, recommendation: Recommendation) -> Candidate {
    let email = format!("{name}@example.com");
    let mut analysis = analysis(name, score, recommendation);
    analysis.email = Some(email.clone());
    Candidate {
        id: uuid::Uuid::new_v4(),
        run_id: run.id,
        file_name: format!("{name}.pdf"),
        text_snippet: format!("{name} resume"),
        analysis,
        email: Some(email),
        source_key: None,
        created_at: Utc::now(),
    }
}

/// A `scheduled` interview for `candidate`, one hour from now.
pub fn interview_for(candidate: &Candidate) -> Interview {
    Interview::scheduled(
        candidate,
        candidate.email.clone().unwrap_or_default(),
        Utc::now() + Duration::hours(1),
        "https://api.calendly.com/scheduled_events/test".to_string(),
    )
}

// ── Mail ────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Address(email.to));
        }
        self.sent.lock().await.push(email);
        Ok(())
    }
}

// ── Voice ───────────────────────────────────────────────────────────────────

/// Starts calls instantly and replays `events` into the session registry, as
/// the provider's server messages would.
pub struct ScriptedVoice {
    sessions: SessionRegistry,
    events: Vec<SessionEvent>,
    fail: bool,
}

impl ScriptedVoice {
    pub fn new(sessions: SessionRegistry, events: Vec<SessionEvent>) -> Self {
        Self {
            sessions,
            events,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            sessions: SessionRegistry::default(),
            events: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl VoiceProvider for ScriptedVoice {
    async fn start_call(&self, request: CallRequest) -> Result<StartedCall, VoiceError> {
        if self.fail {
            return Err(VoiceError::Api {
                status: 500,
                body: "scripted failure".to_string(),
            });
        }
        for event in &self.events {
            self.sessions.dispatch(request.interview_id, event.clone());
        }
        Ok(StartedCall {
            call_ref: "call_scripted".to_string(),
        })
    }
}

// ── HTTP ────────────────────────────────────────────────────────────────────

/// State with every integration switched off.
pub fn test_state() -> AppState {
    AppState {
        config: Config::bare(),
        ledger: Ledger::unavailable(),
        llm: None,
        scorer: None,
        mailer: None,
        voice: None,
        sessions: SessionRegistry::default(),
        archive: None,
        http: reqwest::Client::new(),
    }
}

/// Drives the full router once and decodes the JSON body (`Null` if none).
pub async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = build_router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const BOUNDARY: &str = "----recruiter-test-boundary";

/// Hand-assembled `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, uri: &str) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Request::post(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}
