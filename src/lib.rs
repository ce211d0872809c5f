//! Page reply sync library.
//!
//! Walks a page's (or group's) feed through the Graph API, keeps a JSON snapshot of
//! every post and its comments on disk, and replies to comments that were not in the
//! previous snapshot. Each run also reports keyword sentiment over the stored comments.

pub mod auth;
pub mod config;
pub mod constants;
pub mod graph;
pub mod scheduler;
pub mod sentiment;
pub mod store;
pub mod sync;
