//! # Creator Resolver
//! Batch-resolves creator ids to lightweight summaries for adapters
//! whose rows only carry a foreign key. One call per adapter page, never
//! one per row. Failures and misses degrade to the `Unknown` sentinel so
//! callers never null-check.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::record::CreatorSummary;
use crate::store::{CreatorDirectory, CreatorProfile};

#[derive(Clone)]
pub struct CreatorResolver {
    directory: Arc<dyn CreatorDirectory>,
}

impl CreatorResolver {
    pub fn new(directory: Arc<dyn CreatorDirectory>) -> Self {
        Self { directory }
    }

    /// Resolve a batch of distinct ids. Empty input returns an empty map
    /// without touching the directory. Every requested id is present in
    /// the result: misses and lookup failures map to `Unknown`.
    pub async fn resolve(&self, ids: &HashSet<String>) -> HashMap<String, CreatorSummary> {
        if ids.is_empty() {
            return HashMap::new();
        }

        let wanted: Vec<String> = ids.iter().cloned().collect();
        let found = match self.directory.lookup(&wanted).await {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(error = ?e, ids = wanted.len(), "creator lookup failed");
                HashMap::new()
            }
        };

        wanted
            .into_iter()
            .map(|id| {
                let summary = found
                    .get(&id)
                    .map(summary_from_profile)
                    .unwrap_or_else(CreatorSummary::unknown);
                (id, summary)
            })
            .collect()
    }
}

fn summary_from_profile(p: &CreatorProfile) -> CreatorSummary {
    CreatorSummary {
        username: p.username.clone(),
        avatar_url: p.avatar_url.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn empty_input_skips_the_directory() {
        let store = Arc::new(MemoryStore::new());
        let resolver = CreatorResolver::new(store.clone());
        let out = resolver.resolve(&HashSet::new()).await;
        assert!(out.is_empty());
        assert_eq!(store.lookup_calls(), 0);
    }

    #[tokio::test]
    async fn missing_ids_resolve_to_unknown() {
        let store = Arc::new(MemoryStore::new());
        store.insert_profile(
            "u1",
            CreatorProfile {
                username: "alexcreates".into(),
                avatar_url: "https://cdn.test/u1.png".into(),
            },
        );
        let resolver = CreatorResolver::new(store.clone());

        let ids: HashSet<String> = ["u1".to_string(), "ghost".to_string()].into();
        let out = resolver.resolve(&ids).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out["u1"].username, "alexcreates");
        assert_eq!(out["ghost"], CreatorSummary::unknown());
        assert_eq!(store.lookup_calls(), 1);
    }

    #[tokio::test]
    async fn lookup_failure_degrades_to_unknown() {
        let store = Arc::new(MemoryStore::new());
        store.fail_lookups(true);
        let resolver = CreatorResolver::new(store);

        let ids: HashSet<String> = ["u1".to_string()].into();
        let out = resolver.resolve(&ids).await;
        assert_eq!(out["u1"], CreatorSummary::unknown());
    }
}
