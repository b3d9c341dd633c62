use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::creators::CreatorResolver;
use crate::record::{ContentRecord, Counters, CreatorSummary, Monetization, SourceType, Visibility};
use crate::store::{ContentStore, PageQuery};

use super::{FetchParams, SourceAdapter};

/// Story rows carry a creator foreign key and no free text: the excerpt
/// is a synthetic placeholder and the search term does not apply.
pub struct StoryAdapter {
    store: Arc<dyn ContentStore>,
    resolver: CreatorResolver,
    page_cap: usize,
}

impl StoryAdapter {
    pub fn new(store: Arc<dyn ContentStore>, resolver: CreatorResolver, page_cap: usize) -> Self {
        Self {
            store,
            resolver,
            page_cap,
        }
    }
}

#[async_trait]
impl SourceAdapter for StoryAdapter {
    fn source(&self) -> SourceType {
        SourceType::Story
    }

    async fn fetch_page(&self, params: &FetchParams) -> Result<Vec<ContentRecord>> {
        let q = PageQuery {
            limit: self.page_cap,
            search_term: None, // stories have no searchable text
            include_deleted: params.include_deleted,
        };
        let rows = self
            .store
            .recent_stories(&q)
            .await
            .context("querying recent stories")?;

        // One batched resolution for the whole page, not one per row.
        let ids: HashSet<String> = rows.iter().map(|r| r.creator_id.clone()).collect();
        let creators = self.resolver.resolve(&ids).await;

        Ok(rows
            .into_iter()
            .map(|row| {
                let creator = creators
                    .get(&row.creator_id)
                    .cloned()
                    .unwrap_or_else(CreatorSummary::unknown);
                ContentRecord {
                    id: row.id,
                    origin: SourceType::Story,
                    creator_id: row.creator_id,
                    creator,
                    text_excerpt: "Story content".to_string(),
                    media_refs: row.image_refs,
                    video_refs: row.video_refs,
                    visibility: Visibility::from_source_label(&row.visibility_label),
                    monetization: Monetization::default(),
                    tags: Vec::new(),
                    counters: Counters {
                        views: row.views,
                        ..Counters::default()
                    },
                    created_at: row.created_at,
                    is_deleted: row.deleted,
                }
            })
            .collect())
    }
}
