use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::creators::CreatorResolver;
use crate::record::{ContentRecord, Counters, CreatorSummary, Monetization, SourceType, Visibility};
use crate::store::ContentStore;

use super::{FetchParams, SourceAdapter};

/// Direct messages. Sender is a foreign key (batch-resolved); image
/// attachments surface as media refs. Messages have no visibility
/// vocabulary of their own — they are private by construction.
pub struct MessageAdapter {
    store: Arc<dyn ContentStore>,
    resolver: CreatorResolver,
    page_cap: usize,
}

impl MessageAdapter {
    pub fn new(store: Arc<dyn ContentStore>, resolver: CreatorResolver, page_cap: usize) -> Self {
        Self {
            store,
            resolver,
            page_cap,
        }
    }
}

#[async_trait]
impl SourceAdapter for MessageAdapter {
    fn source(&self) -> SourceType {
        SourceType::Message
    }

    async fn fetch_page(&self, params: &FetchParams) -> Result<Vec<ContentRecord>> {
        let rows = self
            .store
            .recent_messages(&params.page_query(self.page_cap))
            .await
            .context("querying recent messages")?;

        let ids: HashSet<String> = rows.iter().map(|r| r.sender_id.clone()).collect();
        let creators = self.resolver.resolve(&ids).await;

        Ok(rows
            .into_iter()
            .map(|row| {
                let creator = creators
                    .get(&row.sender_id)
                    .cloned()
                    .unwrap_or_else(CreatorSummary::unknown);
                ContentRecord {
                    id: row.id,
                    origin: SourceType::Message,
                    creator_id: row.sender_id,
                    creator,
                    text_excerpt: row.text,
                    media_refs: row.attachment_image_refs,
                    video_refs: Vec::new(),
                    visibility: Visibility::Private,
                    monetization: match row.ppv_price {
                        Some(amount) => Monetization::pay_per_view(amount),
                        None => Monetization::default(),
                    },
                    tags: Vec::new(),
                    counters: Counters::default(),
                    created_at: row.created_at,
                    is_deleted: row.deleted,
                }
            })
            .collect())
    }
}
