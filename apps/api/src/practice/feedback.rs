use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::llm_client::prompts::{json_system, render, EVIDENCE_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::models::interview::{format_transcript, TranscriptTurn};
use crate::models::practice::{CategoryScore, Feedback, PracticeInterview};
use crate::practice::prompts::{FEEDBACK_CATEGORIES, FEEDBACK_PROMPT_TEMPLATE, FEEDBACK_ROLE};
use crate::practice::questions::PracticeError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackDraft {
    total_score: u32,
    category_scores: Vec<CategoryScore>,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    areas_for_improvement: Vec<String>,
    final_assessment: String,
}

/// Grades a finished practice transcript into a new Feedback record.
pub async fn grade(
    llm: &LlmClient,
    interview: &PracticeInterview,
    user_id: &str,
    transcript: &[TranscriptTurn],
) -> Result<Feedback, PracticeError> {
    let categories = FEEDBACK_CATEGORIES
        .iter()
        .map(|c| format!("- {c}"))
        .collect::<Vec<_>>()
        .join("\n");
    let formatted = format_transcript(transcript);
    let prompt = render(
        FEEDBACK_PROMPT_TEMPLATE,
        &[
            ("evidence_instruction", EVIDENCE_INSTRUCTION),
            ("role", interview.role.as_str()),
            ("level", interview.level.as_str()),
            ("categories", categories.as_str()),
            ("transcript", formatted.as_str()),
        ],
    );

    let draft: FeedbackDraft = llm.call_json(&prompt, &json_system(FEEDBACK_ROLE)).await?;

    Ok(Feedback {
        id: Uuid::new_v4(),
        interview_id: interview.id,
        user_id: user_id.to_string(),
        total_score: check_score("totalScore", draft.total_score)?,
        category_scores: normalise_categories(draft.category_scores)?,
        strengths: draft.strengths,
        areas_for_improvement: draft.areas_for_improvement,
        final_assessment: draft.final_assessment.trim().to_string(),
        created_at: Utc::now(),
    })
}

fn check_score(field: &str, score: u32) -> Result<u32, PracticeError> {
    if score > 100 {
        return Err(PracticeError::Invalid(format!("{field} {score} is out of range")));
    }
    Ok(score)
}

/// Puts the five categories in canonical order. Names match case-insensitively;
/// a missing category is an error, unknown extras are dropped.
fn normalise_categories(scores: Vec<CategoryScore>) -> Result<Vec<CategoryScore>, PracticeError> {
    FEEDBACK_CATEGORIES
        .iter()
        .map(|name| -> Result<CategoryScore, PracticeError> {
            let found = scores
                .iter()
                .find(|s| s.name.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| PracticeError::Invalid(format!("category '{name}' missing")))?;
            Ok(CategoryScore {
                name: name.to_string(),
                score: check_score(name, found.score)?,
                comment: found.comment.trim().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::models::interview::Speaker;
    use crate::test_support::ScriptedLlm;

    fn practice() -> PracticeInterview {
        PracticeInterview {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            role: "Frontend Developer".to_string(),
            level: "Junior".to_string(),
            interview_type: "technical".to_string(),
            techstack: vec!["React".to_string()],
            questions: vec!["What is a hook?".to_string()],
            created_at: Utc::now(),
        }
    }

    fn transcript() -> Vec<TranscriptTurn> {
        vec![
            TranscriptTurn {
                role: Speaker::Assistant,
                content: "What is a hook?".to_string(),
            },
            TranscriptTurn {
                role: Speaker::User,
                content: "A function that uses React state.".to_string(),
            },
        ]
    }

    fn draft(categories: serde_json::Value, total: u32) -> String {
        json!({
            "totalScore": total,
            "categoryScores": categories,
            "strengths": ["Concise"],
            "areasForImprovement": ["Give examples"],
            "finalAssessment": " Promising. "
        })
        .to_string()
    }

    fn all_categories() -> serde_json::Value {
        // Reverse order and mixed case on purpose.
        json!([
            { "name": "confidence & clarity", "score": 70, "comment": "ok" },
            { "name": "Cultural & Role Fit", "score": 65, "comment": "ok" },
            { "name": "Problem Solving", "score": 60, "comment": "ok" },
            { "name": "Technical Knowledge", "score": 55, "comment": "ok" },
            { "name": "Communication Skills", "score": 75, "comment": "clear" },
            { "name": "Humour", "score": 99, "comment": "extra" }
        ])
    }

    #[tokio::test]
    async fn test_feedback_categories_are_canonical() {
        let llm = LlmClient::with_backend(Arc::new(
            ScriptedLlm::new().reply("Frontend Developer", &draft(all_categories(), 66)),
        ));
        let feedback = grade(&llm, &practice(), "user-1", &transcript()).await.unwrap();
        let names: Vec<_> = feedback.category_scores.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, FEEDBACK_CATEGORIES.to_vec());
        assert_eq!(feedback.category_scores[0].score, 75);
        assert_eq!(feedback.total_score, 66);
        assert_eq!(feedback.final_assessment, "Promising.");
    }

    #[tokio::test]
    async fn test_missing_category_is_invalid() {
        let partial = json!([{ "name": "Communication Skills", "score": 75, "comment": "clear" }]);
        let llm = LlmClient::with_backend(Arc::new(ScriptedLlm::new().reply("", &draft(partial, 66))));
        let err = grade(&llm, &practice(), "user-1", &transcript()).await.unwrap_err();
        assert!(matches!(err, PracticeError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_out_of_range_total_is_invalid() {
        let llm = LlmClient::with_backend(Arc::new(
            ScriptedLlm::new().reply("", &draft(all_categories(), 140)),
        ));
        let err = grade(&llm, &practice(), "user-1", &transcript()).await.unwrap_err();
        assert!(err.to_string().contains("totalScore"));
    }
}
