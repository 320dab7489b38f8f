pub mod candidate;
pub mod interview;
pub mod practice;
pub mod run;
