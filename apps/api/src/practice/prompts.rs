// Prompt constants for the practice-interview track.

/// Feedback categories, in the order they are reported.
pub const FEEDBACK_CATEGORIES: [&str; 5] = [
    "Communication Skills",
    "Technical Knowledge",
    "Problem Solving",
    "Cultural & Role Fit",
    "Confidence & Clarity",
];

pub const QUESTIONS_ROLE: &str = "You prepare questions for spoken mock job interviews.";

/// Replace `{role}`, `{level}`, `{interview_type}`, `{techstack}` and `{amount}`.
pub const QUESTIONS_PROMPT_TEMPLATE: &str = r#"Prepare questions for a job interview.
The job role is {role}.
The experience level is {level}.
The tech stack used in the job is: {techstack}.
The focus between behavioural and technical questions should lean towards: {interview_type}.
The number of questions required is: {amount}.

The questions will be read aloud by a voice assistant, so do not use "/", "*" or any
other characters that might break a text-to-speech voice.

Return a JSON object with this EXACT schema:
{
  "questions": ["Question 1", "Question 2"]
}"#;

pub const FEEDBACK_ROLE: &str = "You are a professional interviewer analysing a mock interview. \
    Be thorough and detailed. Do not be lenient: point out every mistake and area for improvement.";

/// Replace `{evidence_instruction}`, `{role}`, `{level}`, `{categories}` and `{transcript}`.
pub const FEEDBACK_PROMPT_TEMPLATE: &str = r#"{evidence_instruction}

You are grading a mock interview for a {level} {role} position.

Score the candidate from 0 to 100 in EXACTLY these categories, using these names verbatim:
{categories}

Return a JSON object with this EXACT schema:
{
  "totalScore": 0,
  "categoryScores": [
    { "name": "Communication Skills", "score": 0, "comment": "..." }
  ],
  "strengths": ["..."],
  "areasForImprovement": ["..."],
  "finalAssessment": "A short paragraph"
}

TRANSCRIPT:
{transcript}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_have_placeholders() {
        for placeholder in ["{role}", "{level}", "{interview_type}", "{techstack}", "{amount}"] {
            assert!(QUESTIONS_PROMPT_TEMPLATE.contains(placeholder), "{placeholder}");
        }
        for placeholder in ["{evidence_instruction}", "{categories}", "{transcript}"] {
            assert!(FEEDBACK_PROMPT_TEMPLATE.contains(placeholder), "{placeholder}");
        }
    }
}
