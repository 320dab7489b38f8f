use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::llm_client::prompts::{json_system, render};
use crate::llm_client::{LlmClient, LlmError};
use crate::practice::prompts::{QUESTIONS_PROMPT_TEMPLATE, QUESTIONS_ROLE};

pub const MIN_QUESTIONS: u32 = 1;
pub const MAX_QUESTIONS: u32 = 20;

#[derive(Debug, Error)]
pub enum PracticeError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("model returned an unusable result: {0}")]
    Invalid(String),
}

/// What the user asked to practise.
#[derive(Debug, Clone)]
pub struct QuestionBrief<'a> {
    pub role: &'a str,
    pub level: &'a str,
    pub interview_type: &'a str,
    pub techstack: &'a [String],
    pub amount: u32,
}

#[derive(Deserialize)]
struct GeneratedQuestions {
    questions: Vec<String>,
}

pub async fn generate_questions(
    llm: &LlmClient,
    brief: &QuestionBrief<'_>,
) -> Result<Vec<String>, PracticeError> {
    let techstack = brief.techstack.join(", ");
    let amount = brief.amount.to_string();
    let prompt = render(
        QUESTIONS_PROMPT_TEMPLATE,
        &[
            ("role", brief.role),
            ("level", brief.level),
            ("interview_type", brief.interview_type),
            ("techstack", techstack.as_str()),
            ("amount", amount.as_str()),
        ],
    );

    let generated: GeneratedQuestions = llm.call_json(&prompt, &json_system(QUESTIONS_ROLE)).await?;
    let questions: Vec<String> = generated
        .questions
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .take(brief.amount as usize)
        .collect();

    if questions.is_empty() {
        return Err(PracticeError::Invalid("no questions generated".to_string()));
    }
    debug!(count = questions.len(), role = brief.role, "Practice questions generated");
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support::ScriptedLlm;

    fn brief(amount: u32) -> (Vec<String>, u32) {
        (vec!["Rust".to_string(), "Postgres".to_string()], amount)
    }

    #[tokio::test]
    async fn test_questions_are_trimmed_and_capped() {
        let llm = LlmClient::with_backend(Arc::new(ScriptedLlm::new().reply(
            "number of questions required is: 2",
            r#"{"questions": [" What is ownership? ", "", "Explain MVCC.", "Extra question"]}"#,
        )));
        let (techstack, amount) = brief(2);
        let questions = generate_questions(
            &llm,
            &QuestionBrief {
                role: "Backend Engineer",
                level: "Senior",
                interview_type: "technical",
                techstack: &techstack,
                amount,
            },
        )
        .await
        .unwrap();
        assert_eq!(questions, vec!["What is ownership?", "Explain MVCC."]);
    }

    #[tokio::test]
    async fn test_empty_question_list_is_invalid() {
        let llm = LlmClient::with_backend(Arc::new(
            ScriptedLlm::new().reply("", r#"{"questions": []}"#),
        ));
        let (techstack, amount) = brief(3);
        let err = generate_questions(
            &llm,
            &QuestionBrief {
                role: "Backend Engineer",
                level: "Junior",
                interview_type: "mixed",
                techstack: &techstack,
                amount,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PracticeError::Invalid(_)));
    }
}
