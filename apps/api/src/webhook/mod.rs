// Scheduling-provider webhook: signature check, interview creation and the
// look-ahead trigger into the interview runner.

pub mod handlers;
pub mod signature;
