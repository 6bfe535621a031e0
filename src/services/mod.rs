pub mod candidates;
pub mod interviews;
pub mod pipeline;
pub mod reports;
pub mod resumes;
