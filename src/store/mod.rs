//! # Backing Content Store
//! Trait seams for the external content store: five queryable
//! collections, count queries, and a payload-free change-notification
//! channel per collection. The aggregator only ever reads; mutation is
//! someone else's concern.

pub mod memory;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

/// The five backing collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Posts,
    Stories,
    Messages,
    Media,
    Comments,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Posts,
        Collection::Stories,
        Collection::Messages,
        Collection::Media,
        Collection::Comments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Posts => "posts",
            Collection::Stories => "stories",
            Collection::Messages => "messages",
            Collection::Media => "media",
            Collection::Comments => "comments",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounded, recency-ordered page query. `search_term` is a
/// case-insensitive substring match on the collection's primary text
/// field; collections without free text ignore it.
#[derive(Debug, Clone, Default)]
pub struct PageQuery {
    pub limit: usize,
    pub search_term: Option<String>,
    pub include_deleted: bool,
}

/// Count-query scope for the statistics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountFilter {
    /// Every row in the collection, soft-deleted included.
    All,
    /// Rows carrying the soft-deletion marker.
    Deleted,
    /// Rows flagged for moderation review.
    Flagged,
}

/// Change notifications carry no payload: any change means
/// "invalidate and refetch".
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeNotice;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorProfile {
    pub username: String,
    pub avatar_url: String,
}

// ---- raw rows, one shape per collection -------------------------------

#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: String,
    pub author_id: String,
    /// Posts embed their author; no resolver round-trip needed.
    pub author: CreatorProfile,
    pub body: String,
    pub image_refs: Vec<String>,
    pub video_refs: Vec<String>,
    /// Source-specific visibility label ("free", "subs", "paid", ...).
    pub visibility_label: String,
    pub ppv_price: Option<f64>,
    pub tags: Vec<String>,
    pub likes: u64,
    pub comments: u64,
    pub views: u64,
    pub created_at: DateTime<Utc>,
    pub deleted: bool,
    pub flagged: bool,
}

#[derive(Debug, Clone)]
pub struct StoryRow {
    pub id: String,
    /// Foreign key only; resolved in a batch per page.
    pub creator_id: String,
    pub image_refs: Vec<String>,
    pub video_refs: Vec<String>,
    pub visibility_label: String,
    pub views: u64,
    pub created_at: DateTime<Utc>,
    pub deleted: bool,
    pub flagged: bool,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: String,
    pub sender_id: String,
    pub text: String,
    pub attachment_image_refs: Vec<String>,
    pub ppv_price: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub deleted: bool,
    pub flagged: bool,
}

#[derive(Debug, Clone)]
pub struct MediaRow {
    pub id: String,
    /// Absent owner means system-owned (seed assets, watermarks, ...).
    pub owner: Option<CreatorProfile>,
    pub owner_id: Option<String>,
    pub alt_text: String,
    pub url: String,
    pub is_video: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub deleted: bool,
    pub flagged: bool,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: String,
    pub author_id: String,
    pub text: String,
    pub likes: u64,
    pub created_at: DateTime<Utc>,
    pub deleted: bool,
    pub flagged: bool,
}

/// Read-only seam onto the backing store. All query methods are bounded
/// and ordered by creation time descending.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn recent_posts(&self, q: &PageQuery) -> Result<Vec<PostRow>>;
    async fn recent_stories(&self, q: &PageQuery) -> Result<Vec<StoryRow>>;
    async fn recent_messages(&self, q: &PageQuery) -> Result<Vec<MessageRow>>;
    async fn recent_media(&self, q: &PageQuery) -> Result<Vec<MediaRow>>;
    async fn recent_comments(&self, q: &PageQuery) -> Result<Vec<CommentRow>>;

    /// Count over the entire collection, not a page.
    async fn count(&self, collection: Collection, filter: CountFilter) -> Result<u64>;

    /// Change-notification channel for one collection.
    fn subscribe(&self, collection: Collection) -> Result<broadcast::Receiver<ChangeNotice>>;
}

/// Batch lookup of creator profiles by id. Missing ids are simply absent
/// from the returned map; the resolver turns them into sentinels.
#[async_trait]
pub trait CreatorDirectory: Send + Sync {
    async fn lookup(&self, ids: &[String]) -> Result<HashMap<String, CreatorProfile>>;
}
