use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::record::{ContentRecord, Counters, CreatorSummary, Monetization, SourceType, Visibility};
use crate::store::{ContentStore, MediaRow};

use super::{FetchParams, SourceAdapter};

/// Standalone media assets. Ownerless rows are system-owned and map to
/// the `System` sentinel with an empty creator id. The search term
/// matches against alt text.
pub struct MediaAdapter {
    store: Arc<dyn ContentStore>,
    page_cap: usize,
}

impl MediaAdapter {
    pub fn new(store: Arc<dyn ContentStore>, page_cap: usize) -> Self {
        Self { store, page_cap }
    }

    fn normalize(row: MediaRow) -> ContentRecord {
        let creator = match &row.owner {
            Some(p) => CreatorSummary {
                username: p.username.clone(),
                avatar_url: p.avatar_url.clone(),
            },
            None => CreatorSummary::system(),
        };
        let (media_refs, video_refs) = if row.is_video {
            (Vec::new(), vec![row.url])
        } else {
            (vec![row.url], Vec::new())
        };
        ContentRecord {
            id: row.id,
            origin: SourceType::Media,
            creator_id: row.owner_id.unwrap_or_default(),
            creator,
            text_excerpt: row.alt_text,
            media_refs,
            video_refs,
            visibility: Visibility::Public,
            monetization: Monetization::default(),
            tags: row.tags,
            counters: Counters::default(),
            created_at: row.created_at,
            is_deleted: row.deleted,
        }
    }
}

#[async_trait]
impl SourceAdapter for MediaAdapter {
    fn source(&self) -> SourceType {
        SourceType::Media
    }

    async fn fetch_page(&self, params: &FetchParams) -> Result<Vec<ContentRecord>> {
        let rows = self
            .store
            .recent_media(&params.page_query(self.page_cap))
            .await
            .context("querying recent media")?;
        Ok(rows.into_iter().map(Self::normalize).collect())
    }
}
