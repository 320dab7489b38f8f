//! Interview Runner: one voice interview from `scheduled` to a graded report.
//!
//! Every failure after the interview enters `in_progress` is recorded on the
//! interview as `failed` with a reason; nothing is retried.

use std::time::Duration;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interviews::prompts::{
    FIRST_MESSAGE_TEMPLATE, INTERVIEWER_PROMPT_TEMPLATE, REPORT_PROMPT_TEMPLATE, REPORT_ROLE,
};
use crate::interviews::session::{SessionError, SessionRegistry};
use crate::interviews::status::InterviewStatus;
use crate::interviews::voice::{CallRequest, VoiceProvider};
use crate::ledger::Ledger;
use crate::llm_client::prompts::{json_system, render, EVIDENCE_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::models::candidate::Candidate;
use crate::models::interview::{format_transcript, Interview, InterviewReport};
use crate::notify::templates::{InterviewOutcome, InterviewReportNotice};
use crate::notify::{send_logged, Mailer};

pub struct Runner<'a> {
    pub ledger: &'a Ledger,
    pub llm: &'a LlmClient,
    pub voice: &'a dyn VoiceProvider,
    pub sessions: &'a SessionRegistry,
    pub mailer: Option<&'a dyn Mailer>,
    pub hr_address: Option<&'a str>,
    pub max_call: Duration,
    pub events_url: Option<String>,
}

impl Runner<'_> {
    pub async fn run(&self, interview_id: Uuid) -> Result<Interview, AppError> {
        let mut interview = self
            .ledger
            .get_interview(interview_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Interview {interview_id} not found")))?;
        if interview.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Interview {interview_id} already finished ({:?})",
                interview.status
            )));
        }
        let candidate = self
            .ledger
            .get_candidate(interview.candidate_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Candidate {} not found", interview.candidate_id))
            })?;
        let job_description = match self.ledger.get_run(interview.run_id).await? {
            Some(run) => run.job_description,
            None => {
                warn!(run_id = %interview.run_id, "Run for interview is missing; grading without job description");
                String::new()
            }
        };

        // Registering first makes a concurrent second run fail before any state changes.
        let mut session = self
            .sessions
            .open(interview_id)
            .map_err(|e| AppError::Conflict(e.to_string()))?;
        interview.advance(InterviewStatus::InProgress)?;
        self.ledger.save_interview(&interview).await?;
        info!(%interview_id, candidate_id = %candidate.id, "Interview started");

        let request = self.call_request(&interview, &candidate, &job_description);
        let call = match self.voice.start_call(request).await {
            Ok(call) => call,
            Err(e) => return Err(self.fail(interview, format!("Could not start call: {e}")).await),
        };
        interview.voice_call_ref = Some(call.call_ref.clone());
        if let Err(e) = self.ledger.save_interview(&interview).await {
            warn!(%interview_id, "Failed to record call reference: {e}");
        }
        session
            .activate(call.call_ref)
            .map_err(|e| AppError::Internal(e.into()))?;

        let outcome = match session.run_to_end(self.max_call).await {
            Ok(outcome) => outcome,
            Err(e) => {
                interview.transcript = session.take_transcript();
                let reason = match e {
                    SessionError::TimedOut(_) => format!("Interview timed out: {e}"),
                    other => format!("Voice session failed: {other}"),
                };
                return Err(self.fail(interview, reason).await);
            }
        };
        interview.transcript = outcome.transcript;
        interview.recording_ref = outcome.recording_ref;

        if interview.transcript.is_empty() {
            return Err(self
                .fail(interview, "Call ended without any transcript".to_string())
                .await);
        }

        let report = match self.grade(&interview, &job_description).await {
            Ok(report) => report,
            Err(reason) => return Err(self.fail(interview, reason).await),
        };
        interview.report = Some(report.clone());
        interview.advance(InterviewStatus::Completed)?;
        // The report is already graded; a lost write must not discard it.
        if let Err(e) = self.ledger.save_interview(&interview).await {
            error!(%interview_id, "Failed to persist completed interview: {e}");
        }
        info!(
            %interview_id,
            score = report.overall_score,
            turns = interview.transcript.len(),
            "Interview completed"
        );

        self.notify(&interview, &report).await;
        Ok(interview)
    }

    fn call_request(
        &self,
        interview: &Interview,
        candidate: &Candidate,
        job_description: &str,
    ) -> CallRequest {
        let skills = candidate.analysis.top_skills.join(", ");
        let system_prompt = render(
            INTERVIEWER_PROMPT_TEMPLATE,
            &[
                ("candidate_name", interview.candidate_name.as_str()),
                ("job_description", job_description.trim()),
                ("candidate_summary", candidate.analysis.summary.as_str()),
                ("candidate_skills", skills.as_str()),
            ],
        );
        CallRequest {
            interview_id: interview.id,
            candidate_name: interview.candidate_name.clone(),
            candidate_email: interview.candidate_email.clone(),
            system_prompt,
            first_message: render(
                FIRST_MESSAGE_TEMPLATE,
                &[("candidate_name", interview.candidate_name.as_str())],
            ),
            max_duration: self.max_call,
            events_url: self.events_url.clone(),
        }
    }

    async fn grade(&self, interview: &Interview, job_description: &str) -> Result<InterviewReport, String> {
        let transcript = format_transcript(&interview.transcript);
        let prompt = render(
            REPORT_PROMPT_TEMPLATE,
            &[
                ("evidence_instruction", EVIDENCE_INSTRUCTION),
                ("candidate_name", interview.candidate_name.as_str()),
                ("job_description", job_description.trim()),
                ("transcript", transcript.as_str()),
            ],
        );
        let report: InterviewReport = self
            .llm
            .call_json(&prompt, &json_system(REPORT_ROLE))
            .await
            .map_err(|e| format!("Report generation failed: {e}"))?;
        if report.overall_score > 100 {
            return Err(format!(
                "Report generation failed: overallScore {} out of range",
                report.overall_score
            ));
        }
        Ok(report)
    }

    /// Marks the interview failed, persists it, and returns the 502 to answer with.
    async fn fail(&self, mut interview: Interview, reason: String) -> AppError {
        error!(interview_id = %interview.id, "{reason}");
        if let Err(e) = interview.fail(reason.clone()) {
            warn!(interview_id = %interview.id, "Could not mark interview failed: {e}");
        } else if let Err(e) = self.ledger.save_interview(&interview).await {
            warn!(interview_id = %interview.id, "Failed to persist failed interview: {e}");
        }
        AppError::Upstream(reason)
    }

    async fn notify(&self, interview: &Interview, report: &InterviewReport) {
        match self.hr_address {
            Some(hr) => {
                let notice = InterviewReportNotice { interview, report };
                send_logged(self.mailer, notice.to_email(hr)).await;
            }
            None => warn!(interview_id = %interview.id, "HR_EMAIL not set; report email skipped"),
        }
        let outcome = InterviewOutcome {
            candidate_name: &interview.candidate_name,
            recommendation: report.recommendation,
        };
        send_logged(self.mailer, outcome.to_email(&interview.candidate_email)).await;
    }
}
