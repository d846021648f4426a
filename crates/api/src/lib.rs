//! Outbound character-API integration.
//!
//! - `client` - reqwest wrapper normalizing every failure to a single
//!   `TransportError`, behind the `CharacterSource` seam
//! - `cache` - lazily populated, never-expiring roster cache
//! - `lookup` - detail fetch with bounded fixed-delay retry and
//!   permanent/transient classification

pub mod cache;
pub mod client;
pub mod lookup;

pub use cache::CharacterCache;
pub use client::{ApiClient, CharacterSource, TransportError};
pub use lookup::{LookupPipeline, RetryPolicy};
