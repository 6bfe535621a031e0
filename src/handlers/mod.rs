pub mod auth;
pub mod candidates;
pub mod evaluators;
pub mod events;
pub mod files;
pub mod interviews;
pub mod jobs;
pub mod reports;
