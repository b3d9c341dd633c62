//! # Source Adapters
//! One adapter per backing collection. Each knows how to query its
//! collection (bounded, recency-ordered) and normalize raw rows into
//! `ContentRecord`. The `fetch` entry point never fails: a broken source
//! logs, counts the error, and contributes an empty page so it cannot
//! blank the merged feed.

pub mod comment;
pub mod media;
pub mod message;
pub mod post;
pub mod story;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use metrics::counter;

use crate::creators::CreatorResolver;
use crate::record::{ContentRecord, SourceType};
use crate::store::{ContentStore, CreatorDirectory, PageQuery};

pub use comment::CommentAdapter;
pub use media::MediaAdapter;
pub use message::MessageAdapter;
pub use post::PostAdapter;
pub use story::StoryAdapter;

/// What the engine passes down per refresh. Everything else in the
/// predicate is evaluated post-merge.
#[derive(Debug, Clone, Default)]
pub struct FetchParams {
    pub search_term: Option<String>,
    pub include_deleted: bool,
}

impl FetchParams {
    pub(crate) fn page_query(&self, limit: usize) -> PageQuery {
        PageQuery {
            limit,
            search_term: self.search_term.clone(),
            include_deleted: self.include_deleted,
        }
    }
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// The origin this adapter emits. Never `Deleted`.
    fn source(&self) -> SourceType;

    /// Query + normalize one page. May fail; `fetch` absorbs the error.
    async fn fetch_page(&self, params: &FetchParams) -> Result<Vec<ContentRecord>>;

    /// Failure-isolating wrapper: one broken source must not blank the
    /// feed, so errors become an empty contribution.
    async fn fetch(&self, params: &FetchParams) -> Vec<ContentRecord> {
        match self.fetch_page(params).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = ?e, source = %self.source(), "adapter fetch failed, contributing empty page");
                counter!("surveil_adapter_errors_total").increment(1);
                Vec::new()
            }
        }
    }
}

/// Wire up the five standard adapters over one store + directory.
pub fn standard_adapters(
    store: Arc<dyn ContentStore>,
    directory: Arc<dyn CreatorDirectory>,
    page_cap: usize,
) -> Vec<Arc<dyn SourceAdapter>> {
    let resolver = CreatorResolver::new(directory);
    vec![
        Arc::new(PostAdapter::new(store.clone(), page_cap)),
        Arc::new(StoryAdapter::new(store.clone(), resolver.clone(), page_cap)),
        Arc::new(MessageAdapter::new(
            store.clone(),
            resolver.clone(),
            page_cap,
        )),
        Arc::new(MediaAdapter::new(store.clone(), page_cap)),
        Arc::new(CommentAdapter::new(store, resolver, page_cap)),
    ]
}
