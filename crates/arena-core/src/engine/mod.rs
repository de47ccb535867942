pub mod generation;
pub mod locks;
pub mod orchestrator;
pub mod round;

pub use orchestrator::{OpenedRound, Orchestrator, SweepReport, VoteReceipt};
