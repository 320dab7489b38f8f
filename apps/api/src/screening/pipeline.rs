//! Screening pipeline: one run over a batch of uploaded resumes.
//!
//! Flow per file (sequential): archive → extract → score → persist candidate →
//! shortlist decision → invitation email. A failure in any step skips that
//! file; the run always finishes with aggregate counts. Store failures are
//! logged and never abort the batch.

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::archive::ResumeArchive;
use crate::extraction::{extract_text, truncate_chars, MediaKind};
use crate::ledger::Ledger;
use crate::models::candidate::{Candidate, CandidateSummary};
use crate::models::run::{Run, ShortlistEntry};
use crate::notify::templates::ShortlistInvitation;
use crate::notify::{send_logged, Mailer};
use crate::screening::scorer::CandidateScorer;
use crate::screening::shortlist::ShortlistPolicy;

pub const MAX_FILES_PER_RUN: usize = 10;
pub const SNIPPET_CHARS: usize = 1000;

/// One validated upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub kind: MediaKind,
    pub bytes: Bytes,
}

/// Everything a run needs, borrowed from `AppState`.
pub struct Screening<'a> {
    pub ledger: &'a Ledger,
    pub scorer: &'a dyn CandidateScorer,
    pub policy: ShortlistPolicy,
    pub mailer: Option<&'a dyn Mailer>,
    pub archive: Option<&'a ResumeArchive>,
    pub scheduling_url: Option<&'a str>,
}

pub struct RunOutcome {
    pub run: Run,
    pub candidates: Vec<CandidateSummary>,
}

impl Screening<'_> {
    pub async fn process_run(
        &self,
        job_description: String,
        files: Vec<UploadedFile>,
    ) -> RunOutcome {
        let mut run = Run::new(job_description, files.len() as u32);
        if let Err(e) = self.ledger.create_run(&run).await {
            warn!(run_id = %run.id, "Failed to persist new run; processing anyway: {e}");
        }
        info!(run_id = %run.id, files = run.total, "Screening run started");

        let mut candidates = Vec::new();
        let mut shortlisted = Vec::new();
        let mut failed = 0u32;

        for file in files {
            match self.process_file(&run, file).await {
                Some(candidate) => {
                    let is_shortlisted = self.policy.is_shortlisted(&candidate.analysis);
                    if is_shortlisted {
                        shortlisted.push(ShortlistEntry {
                            candidate_id: candidate.id,
                            name: candidate.analysis.name.clone(),
                            email: candidate.email.clone(),
                            score: candidate.analysis.match_score,
                        });
                        self.invite(&candidate).await;
                    }
                    candidates.push(candidate.summary(is_shortlisted));
                }
                None => failed += 1,
            }
        }

        run.finish(candidates.len() as u32, failed, shortlisted);
        if let Err(e) = self.ledger.finish_run(&run).await {
            warn!(run_id = %run.id, "Failed to persist finished run: {e}");
        }
        info!(
            run_id = %run.id,
            processed = run.processed,
            failed = run.failed,
            shortlisted = run.shortlisted.len(),
            "Screening run finished"
        );

        RunOutcome { run, candidates }
    }

    /// Returns `None` when the file yields no text or cannot be scored.
    async fn process_file(&self, run: &Run, file: UploadedFile) -> Option<Candidate> {
        let candidate_id = Uuid::new_v4();

        let source_key = match self.archive {
            Some(archive) => archive
                .store(
                    run.id,
                    candidate_id,
                    &file.file_name,
                    file.bytes.to_vec(),
                    file.kind.content_type(),
                )
                .await
                .map_err(|e| warn!(file = %file.file_name, "Archive upload skipped: {e}"))
                .ok(),
            None => None,
        };

        let text = extract_text(&file.bytes, file.kind, &file.file_name);
        if text.is_empty() {
            warn!(run_id = %run.id, file = %file.file_name, "No text extracted; file skipped");
            return None;
        }

        let analysis = match self.scorer.score(&text, &run.job_description).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(run_id = %run.id, file = %file.file_name, "Scoring failed; file skipped: {e}");
                return None;
            }
        };

        let email = analysis.email.clone().or_else(|| find_email(&text));
        let candidate = Candidate {
            id: candidate_id,
            run_id: run.id,
            file_name: file.file_name,
            text_snippet: truncate_chars(&text, SNIPPET_CHARS).to_string(),
            analysis,
            email,
            source_key,
            created_at: Utc::now(),
        };

        if let Err(e) = self.ledger.save_candidate(&candidate).await {
            warn!(candidate_id = %candidate.id, "Failed to persist candidate: {e}");
        }
        Some(candidate)
    }

    async fn invite(&self, candidate: &Candidate) {
        let Some(email) = candidate.email.as_deref() else {
            warn!(candidate_id = %candidate.id, "Shortlisted candidate has no email; invitation skipped");
            return;
        };
        let invitation = ShortlistInvitation {
            candidate_name: &candidate.analysis.name,
            match_score: candidate.analysis.match_score,
            scheduling_url: self.scheduling_url,
        };
        send_logged(self.mailer, invitation.to_email(email)).await;
    }
}

/// First plausible email address in free text, lower-cased.
pub fn find_email(text: &str) -> Option<String> {
    text.split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '<' | '>' | '(' | ')' | '|'))
        .map(|token| token.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
        .find(|token| {
            let Some((local, domain)) = token.split_once('@') else {
                return false;
            };
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        })
        .map(str::to_lowercase)
}
