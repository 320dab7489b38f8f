use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::{MediaKind, MAX_FILE_BYTES};
use crate::models::candidate::{Candidate, CandidateSummary};
use crate::models::run::{Run, RunStatus, ShortlistEntry};
use crate::screening::pipeline::{Screening, UploadedFile, MAX_FILES_PER_RUN};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRunResponse {
    pub success: bool,
    pub run_id: Uuid,
    pub status: RunStatus,
    pub total: u32,
    pub processed: u32,
    pub failed: u32,
    pub shortlisted: Vec<ShortlistEntry>,
    pub candidates: Vec<CandidateSummary>,
}

#[derive(Serialize)]
pub struct CandidateView {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub shortlisted: bool,
}

#[derive(Serialize)]
pub struct RunDetailResponse {
    pub success: bool,
    pub run: Run,
    pub candidates: Vec<CandidateView>,
}

/// POST /api/screening/runs
pub async fn handle_create_run(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CreateRunResponse>, AppError> {
    let (job_description, files) = read_upload(&mut multipart).await?;
    let scorer = state
        .scorer
        .as_deref()
        .ok_or(AppError::Unavailable("Candidate scorer"))?;

    let screening = Screening {
        ledger: &state.ledger,
        scorer,
        policy: state.config.shortlist_policy,
        mailer: state.mailer(),
        archive: state.archive.as_ref(),
        scheduling_url: state.config.scheduling_url.as_deref(),
    };
    let outcome = screening.process_run(job_description, files).await;

    Ok(Json(CreateRunResponse {
        success: true,
        run_id: outcome.run.id,
        status: outcome.run.status,
        total: outcome.run.total,
        processed: outcome.run.processed,
        failed: outcome.run.failed,
        shortlisted: outcome.run.shortlisted,
        candidates: outcome.candidates,
    }))
}

/// GET /api/screening/runs/:id
pub async fn handle_get_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RunDetailResponse>, AppError> {
    let run = state
        .ledger
        .get_run(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Run {id} not found")))?;

    let policy = state.config.shortlist_policy;
    let candidates = state
        .ledger
        .candidates_for_run(id)
        .await?
        .into_iter()
        .map(|candidate| CandidateView {
            shortlisted: policy.is_shortlisted(&candidate.analysis),
            candidate,
        })
        .collect();

    Ok(Json(RunDetailResponse {
        success: true,
        run,
        candidates,
    }))
}

/// Reads and validates the multipart upload before any external call is made.
async fn read_upload(multipart: &mut Multipart) -> Result<(String, Vec<UploadedFile>), AppError> {
    let mut job_description = String::new();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "jobDescription" | "job_description" => {
                job_description = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable job description: {e}")))?;
            }
            "files" | "file" => {
                if files.len() == MAX_FILES_PER_RUN {
                    return Err(AppError::Validation(format!(
                        "At most {MAX_FILES_PER_RUN} files per run"
                    )));
                }
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let kind = MediaKind::detect(field.content_type(), &file_name).ok_or_else(|| {
                    AppError::Validation(format!(
                        "Unsupported file type for '{file_name}'; upload PDF, DOCX or plain text"
                    ))
                })?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable file '{file_name}': {e}")))?;
                if bytes.len() > MAX_FILE_BYTES {
                    return Err(AppError::Validation(format!(
                        "File '{file_name}' exceeds {} MB",
                        MAX_FILE_BYTES / (1024 * 1024)
                    )));
                }
                files.push(UploadedFile {
                    file_name,
                    kind,
                    bytes,
                });
            }
            other => debug!("Ignoring multipart field '{other}'"),
        }
    }

    let job_description = job_description.trim().to_string();
    if job_description.is_empty() {
        return Err(AppError::Validation("jobDescription is required".to_string()));
    }
    if files.is_empty() {
        return Err(AppError::Validation("At least one resume file is required".to_string()));
    }
    Ok((job_description, files))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;

    use crate::ledger::memory::{MemoryStore, UnreachableStore};
    use crate::ledger::Ledger;
    use crate::llm_client::LlmClient;
    use crate::screening::scorer::LlmCandidateScorer;
    use crate::test_support::{analysis_json, get, send, test_state, MultipartForm, ScriptedLlm};

    fn with_scorer(state: &mut crate::state::AppState, llm: ScriptedLlm) {
        let client = LlmClient::with_backend(Arc::new(llm));
        state.scorer = Some(Arc::new(LlmCandidateScorer::new(
            client.clone(),
            state.config.shortlist_policy.threshold(),
        )));
        state.llm = Some(client);
    }

    #[tokio::test]
    async fn test_missing_job_description_is_rejected() {
        let request = MultipartForm::new()
            .file("files", "a.txt", "text/plain", b"Jane Doe")
            .into_request("/api/screening/runs");
        let (status, body) = send(test_state(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_too_many_files_are_rejected() {
        let mut form = MultipartForm::new().text("jobDescription", "Backend engineer");
        for i in 0..11 {
            form = form.file("files", &format!("cv{i}.txt"), "text/plain", b"resume");
        }
        let (status, _) = send(test_state(), form.into_request("/api/screening/runs")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unsupported_file_type_is_rejected() {
        let request = MultipartForm::new()
            .text("jobDescription", "Backend engineer")
            .file("files", "photo.png", "image/png", b"\x89PNG")
            .into_request("/api/screening/runs");
        let (status, body) = send(test_state(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("photo.png"));
    }

    #[tokio::test]
    async fn test_missing_scorer_is_unavailable() {
        let request = MultipartForm::new()
            .text("jobDescription", "Backend engineer")
            .file("files", "a.txt", "text/plain", b"Jane Doe")
            .into_request("/api/screening/runs");
        let (status, body) = send(test_state(), request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_run_is_created_and_readable() {
        let mut state = test_state();
        state.ledger = Ledger::new(Arc::new(MemoryStore::default()));
        with_scorer(
            &mut state,
            ScriptedLlm::new()
                .reply("Jane Doe", &analysis_json("Jane Doe", 95, "yes"))
                .reply("John Roe", &analysis_json("John Roe", 40, "no")),
        );

        let request = MultipartForm::new()
            .text("jobDescription", "Senior Python engineer")
            .file("files", "jane.txt", "text/plain", b"Jane Doe, jane@example.com")
            .file("files", "john.txt", "text/plain", b"John Roe, john@example.com")
            .into_request("/api/screening/runs");
        let (status, body) = send(state.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["total"], 2);
        assert_eq!(body["processed"], 2);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["shortlisted"].as_array().unwrap().len(), 1);

        let run_id = body["runId"].as_str().unwrap().to_string();
        let (status, detail) = send(state, get(&format!("/api/screening/runs/{run_id}"))).await;
        assert_eq!(status, StatusCode::OK);
        let candidates = detail["candidates"].as_array().unwrap();
        assert_eq!(candidates.len(), 2);
        let shortlisted: Vec<_> = candidates
            .iter()
            .filter(|c| c["shortlisted"] == true)
            .map(|c| c["analysis"]["name"].as_str().unwrap())
            .collect();
        assert_eq!(shortlisted, vec!["Jane Doe"]);
    }

    #[tokio::test]
    async fn test_run_completes_when_store_is_unreachable() {
        let mut state = test_state();
        state.ledger = Ledger::new(Arc::new(UnreachableStore));
        with_scorer(
            &mut state,
            ScriptedLlm::new().reply("Jane Doe", &analysis_json("Jane Doe", 95, "yes")),
        );

        let request = MultipartForm::new()
            .text("jobDescription", "Senior Python engineer")
            .file("files", "jane.txt", "text/plain", b"Jane Doe, jane@example.com")
            .into_request("/api/screening/runs");
        let (status, body) = send(state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["processed"], 1);
        assert_eq!(body["candidates"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_run_is_not_found() {
        let (status, _) = send(
            test_state(),
            get("/api/screening/runs/00000000-0000-0000-0000-000000000000"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
