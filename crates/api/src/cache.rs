use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use wuwabot_core::CharacterSummary;

use crate::client::CharacterSource;

/// Process-wide roster cache. Populated lazily on first use (or warmed at
/// startup), never invalidated until the process restarts.
///
/// Overlapping populate calls may both hit the network; the fetch runs
/// outside the lock and the last writer wins. Both writers carry the same
/// source data, so the race is benign. A populated non-empty roster is
/// never replaced by an empty one.
pub struct CharacterCache {
    source: Arc<dyn CharacterSource>,
    entries: RwLock<Vec<CharacterSummary>>,
}

impl CharacterCache {
    pub fn new(source: Arc<dyn CharacterSource>) -> Self {
        Self { source, entries: RwLock::new(Vec::new()) }
    }

    /// Returns the cached roster, fetching it first if the cache is
    /// empty. A fetch failure degrades to an empty roster without
    /// touching whatever is already stored.
    pub async fn get_all(&self) -> Vec<CharacterSummary> {
        {
            let entries = self.entries.read().await;
            if !entries.is_empty() {
                debug!(count = entries.len(), "serving roster from cache");
                return entries.clone();
            }
        }

        match self.source.list_characters().await {
            Ok(slugs) => {
                let roster = dedup_preserving_order(slugs);
                if roster.is_empty() {
                    warn!("character roster fetch returned no entries");
                    return Vec::new();
                }

                info!(count = roster.len(), "character roster cached");
                let mut entries = self.entries.write().await;
                *entries = roster.clone();
                roster
            }
            Err(error) => {
                warn!(%error, "character roster fetch failed");
                Vec::new()
            }
        }
    }

    /// Startup warm-up: populate once so the first command and the first
    /// autocomplete keystroke do not pay the fetch. Failure is tolerated;
    /// the next `get_all` simply tries again.
    pub async fn warm(&self) {
        let roster = self.get_all().await;
        if roster.is_empty() {
            warn!("roster prefetch came back empty; will retry on first use");
        }
    }
}

fn dedup_preserving_order(slugs: Vec<String>) -> Vec<CharacterSummary> {
    let mut seen = HashSet::new();
    slugs
        .into_iter()
        .filter(|slug| seen.insert(slug.clone()))
        .map(CharacterSummary::new)
        .collect()
}
