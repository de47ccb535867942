pub mod schema;
pub mod store;

pub use store::{CommitOutcome, RatingChange, Store, StoreStats};
