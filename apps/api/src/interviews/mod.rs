// Recruitment interviews: status machine, voice session plumbing and the
// runner that turns a scheduled interview into a graded report.
// Provider events reach a running interview only through SessionRegistry.

pub mod handlers;
pub mod prompts;
pub mod runner;
pub mod session;
pub mod status;
pub mod voice;
