// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod format;
pub mod freshness;
pub mod ingest;
pub mod media;
pub mod metrics;
pub mod notify;
pub mod publisher;
pub mod relevance;
pub mod selector;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::ingest::types::{ContentSource, NormalizedItem, RawItem, SourceFetchError};
pub use crate::selector::{ItemSelector, SelectionPolicy, SourcePick};
