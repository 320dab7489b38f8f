// Practice interviews: LLM-generated question sets and graded feedback on
// finished mock-interview transcripts.

pub mod feedback;
pub mod handlers;
pub mod prompts;
pub mod questions;
