use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::record::{ContentRecord, Counters, CreatorSummary, Monetization, SourceType, Visibility};
use crate::store::{ContentStore, PostRow};

use super::{FetchParams, SourceAdapter};

/// Posts embed their author profile, so no resolver round-trip is
/// needed; everything else maps field-for-field.
pub struct PostAdapter {
    store: Arc<dyn ContentStore>,
    page_cap: usize,
}

impl PostAdapter {
    pub fn new(store: Arc<dyn ContentStore>, page_cap: usize) -> Self {
        Self { store, page_cap }
    }

    fn normalize(row: PostRow) -> ContentRecord {
        ContentRecord {
            id: row.id,
            origin: SourceType::Post,
            creator_id: row.author_id,
            creator: CreatorSummary {
                username: row.author.username,
                avatar_url: row.author.avatar_url,
            },
            text_excerpt: row.body,
            media_refs: row.image_refs,
            video_refs: row.video_refs,
            visibility: Visibility::from_source_label(&row.visibility_label),
            monetization: match row.ppv_price {
                Some(amount) => Monetization::pay_per_view(amount),
                None => Monetization::default(),
            },
            tags: row.tags,
            counters: Counters {
                likes: row.likes,
                comments: row.comments,
                views: row.views,
            },
            created_at: row.created_at,
            is_deleted: row.deleted,
        }
    }
}

#[async_trait]
impl SourceAdapter for PostAdapter {
    fn source(&self) -> SourceType {
        SourceType::Post
    }

    async fn fetch_page(&self, params: &FetchParams) -> Result<Vec<ContentRecord>> {
        let rows = self
            .store
            .recent_posts(&params.page_query(self.page_cap))
            .await
            .context("querying recent posts")?;
        Ok(rows.into_iter().map(Self::normalize).collect())
    }
}
