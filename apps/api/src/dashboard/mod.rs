// Dashboard reads: recent runs, interviews and the statistics snapshot.

pub mod handlers;
