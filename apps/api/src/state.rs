use std::sync::Arc;

use serde::Serialize;

use crate::archive::ResumeArchive;
use crate::config::Config;
use crate::interviews::session::SessionRegistry;
use crate::interviews::voice::VoiceProvider;
use crate::ledger::Ledger;
use crate::llm_client::LlmClient;
use crate::notify::Mailer;
use crate::screening::scorer::CandidateScorer;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Each external client is optional; a handler that needs a missing one
/// answers `AppError::Unavailable` instead of consulting a global flag.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub ledger: Ledger,
    pub llm: Option<LlmClient>,
    pub scorer: Option<Arc<dyn CandidateScorer>>,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub voice: Option<Arc<dyn VoiceProvider>>,
    /// Live voice sessions keyed by interview id.
    pub sessions: SessionRegistry,
    pub archive: Option<ResumeArchive>,
    /// Used for the webhook's call into the interview runner.
    pub http: reqwest::Client,
}

/// Which integrations this deployment has, reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub store: bool,
    pub model: bool,
    pub mail: bool,
    pub voice: bool,
    pub archive: bool,
    pub webhook_verification: bool,
    pub runner_auth: bool,
    pub auto_trigger: bool,
}

impl AppState {
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            store: self.ledger.is_available(),
            model: self.llm.is_some(),
            mail: self.mailer.is_some(),
            voice: self.voice.is_some(),
            archive: self.archive.is_some(),
            webhook_verification: self.config.webhook_secret.is_some(),
            runner_auth: self.config.internal_api_key.is_some(),
            auto_trigger: self.config.public_base_url.is_some()
                && self.config.internal_api_key.is_some(),
        }
    }

    pub fn mailer(&self) -> Option<&dyn Mailer> {
        self.mailer.as_deref()
    }
}
