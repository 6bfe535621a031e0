pub mod candidate;
pub mod evaluator;
pub mod interview;
pub mod job;
