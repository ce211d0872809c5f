//! Incremental comment synchronization and auto-reply.

pub mod delta;
pub mod orchestrator;
pub mod reply;

pub use delta::{find_new, merge_with_previous};
pub use orchestrator::{RunSummary, Synchronizer};
pub use reply::{ReplyDispatcher, ReplyOutcome, ReplyTally};
