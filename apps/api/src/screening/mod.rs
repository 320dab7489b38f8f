// Resume screening: upload, extraction, scoring, shortlist and invitation.
// All model calls go through llm_client via the CandidateScorer seam.

pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod scorer;
pub mod shortlist;
