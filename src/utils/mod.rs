pub mod database;
pub mod errors;
pub mod extract;
pub mod logger;
