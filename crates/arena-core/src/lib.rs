pub mod catalog;
pub mod config;
pub mod engine;
pub mod errors;
pub mod leaderboard;
pub mod matchmaker;
pub mod model;
pub mod providers;
pub mod rating;
pub mod redaction;
pub mod report;
pub mod storage;

pub use errors::ArenaError;
