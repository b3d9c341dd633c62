use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::creators::CreatorResolver;
use crate::record::{ContentRecord, Counters, CreatorSummary, Monetization, SourceType, Visibility};
use crate::store::ContentStore;

use super::{FetchParams, SourceAdapter};

/// Comments are text-only: no media refs, no monetization. Authors are
/// foreign keys, batch-resolved per page.
pub struct CommentAdapter {
    store: Arc<dyn ContentStore>,
    resolver: CreatorResolver,
    page_cap: usize,
}

impl CommentAdapter {
    pub fn new(store: Arc<dyn ContentStore>, resolver: CreatorResolver, page_cap: usize) -> Self {
        Self {
            store,
            resolver,
            page_cap,
        }
    }
}

#[async_trait]
impl SourceAdapter for CommentAdapter {
    fn source(&self) -> SourceType {
        SourceType::Comment
    }

    async fn fetch_page(&self, params: &FetchParams) -> Result<Vec<ContentRecord>> {
        let rows = self
            .store
            .recent_comments(&params.page_query(self.page_cap))
            .await
            .context("querying recent comments")?;

        let ids: HashSet<String> = rows.iter().map(|r| r.author_id.clone()).collect();
        let creators = self.resolver.resolve(&ids).await;

        Ok(rows
            .into_iter()
            .map(|row| {
                let creator = creators
                    .get(&row.author_id)
                    .cloned()
                    .unwrap_or_else(CreatorSummary::unknown);
                ContentRecord {
                    id: row.id,
                    origin: SourceType::Comment,
                    creator_id: row.author_id,
                    creator,
                    text_excerpt: row.text,
                    media_refs: Vec::new(),
                    video_refs: Vec::new(),
                    visibility: Visibility::Public,
                    monetization: Monetization::default(),
                    tags: Vec::new(),
                    counters: Counters {
                        likes: row.likes,
                        ..Counters::default()
                    },
                    created_at: row.created_at,
                    is_deleted: row.deleted,
                }
            })
            .collect())
    }
}
