mod archive;
mod config;
mod dashboard;
mod errors;
mod extraction;
mod interviews;
mod ledger;
mod llm_client;
mod models;
mod notify;
mod practice;
mod routes;
mod screening;
mod state;
#[cfg(test)]
mod test_support;
mod webhook;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::archive::ResumeArchive;
use crate::config::Config;
use crate::extraction::MAX_FILE_BYTES;
use crate::interviews::session::SessionRegistry;
use crate::interviews::voice::{VapiClient, VoiceProvider};
use crate::ledger::postgres::PgDocumentStore;
use crate::ledger::Ledger;
use crate::llm_client::LlmClient;
use crate::notify::{Mailer, SmtpMailer};
use crate::routes::build_router;
use crate::screening::pipeline::MAX_FILES_PER_RUN;
use crate::screening::scorer::{CandidateScorer, LlmCandidateScorer};
use crate::state::AppState;

/// Headroom on top of the call limit for report generation and emails.
const RUNNER_GRACE: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first; logging depends on RUST_LOG from it
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Recruiter API v{}", env!("CARGO_PKG_VERSION"));

    let ledger = match &config.database_url {
        Some(url) => Ledger::new(Arc::new(PgDocumentStore::connect(url).await?)),
        None => {
            warn!("DATABASE_URL not set; running without a store (reads empty, writes skipped)");
            Ledger::unavailable()
        }
    };

    let llm = match &config.anthropic_api_key {
        Some(key) => {
            let client = LlmClient::anthropic(key.clone())?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(client)
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set; screening, reports and practice feedback are disabled");
            None
        }
    };
    let threshold = config.shortlist_policy.threshold();
    let scorer = llm.clone().map(|client| {
        Arc::new(LlmCandidateScorer::new(client, threshold)) as Arc<dyn CandidateScorer>
    });

    let mailer = match &config.mail {
        Some(mail) => {
            info!("SMTP mailer configured for {}", mail.smtp_host);
            Some(Arc::new(SmtpMailer::new(mail)?) as Arc<dyn Mailer>)
        }
        None => {
            warn!("SMTP settings incomplete; emails will be skipped");
            None
        }
    };

    let voice = match &config.voice {
        Some(voice) => {
            info!("Voice provider configured at {}", voice.api_url);
            Some(Arc::new(VapiClient::new(voice)?) as Arc<dyn VoiceProvider>)
        }
        None => {
            warn!("VOICE_API_KEY not set; interviews cannot be run");
            None
        }
    };

    let archive = match &config.archive {
        Some(archive) => {
            info!("Resume archive enabled (bucket: {})", archive.bucket);
            Some(ResumeArchive::connect(archive).await)
        }
        None => None,
    };

    if config.webhook_secret.is_none() {
        warn!("WEBHOOK_SECRET not set; scheduling webhooks will not be verified");
    }
    if config.internal_api_key.is_none() || config.public_base_url.is_none() {
        warn!("INTERNAL_API_KEY or PUBLIC_BASE_URL not set; interviews will not auto-trigger");
    }

    let max_call = Duration::from_secs(
        config
            .voice
            .as_ref()
            .map(|v| v.max_call_minutes * 60)
            .unwrap_or(30 * 60),
    );
    let http = reqwest::Client::builder()
        .timeout(max_call + RUNNER_GRACE)
        .build()?;

    let state = AppState {
        config: config.clone(),
        ledger,
        llm,
        scorer,
        mailer,
        voice,
        sessions: SessionRegistry::default(),
        archive,
        http,
    };
    info!(capabilities = ?state.capabilities(), "Capabilities resolved");

    let app = build_router(state)
        .layer(DefaultBodyLimit::max(MAX_FILES_PER_RUN * MAX_FILE_BYTES + 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the dashboard host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
