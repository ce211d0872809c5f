//! Graph API access: client, typed payloads, and pagination.

pub mod client;
pub mod error;
pub mod models;
pub mod paginator;

pub use client::{redact_url, GraphClient};
pub use error::GraphError;
pub use models::{ApiErrorBody, Author, Comment, Page, PageAccount, PermissionEntry, Post};
pub use paginator::{Collected, Paginator};
