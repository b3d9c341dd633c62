//! # In-memory content store
//! Reference `ContentStore`/`CreatorDirectory` implementation backed by
//! plain vectors, with per-collection change channels and fault
//! injection. This is the in-process stand-in used by the test suite
//! and by demos; production deployments implement the traits over a
//! real backend.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use super::{
    ChangeNotice, Collection, CommentRow, ContentStore, CountFilter, CreatorDirectory,
    CreatorProfile, MediaRow, MessageRow, PageQuery, PostRow, StoryRow,
};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

pub struct MemoryStore {
    inner: Mutex<Inner>,
    channels: HashMap<Collection, broadcast::Sender<ChangeNotice>>,
    lookup_calls: AtomicUsize,
}

#[derive(Default)]
struct Inner {
    posts: Vec<PostRow>,
    stories: Vec<StoryRow>,
    messages: Vec<MessageRow>,
    media: Vec<MediaRow>,
    comments: Vec<CommentRow>,
    profiles: HashMap<String, CreatorProfile>,
    // Fault injection for isolation tests.
    fail_queries: HashSet<Collection>,
    fail_counts: HashSet<Collection>,
    fail_subscribe: HashSet<Collection>,
    fail_lookup: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut channels = HashMap::new();
        for c in Collection::ALL {
            let (tx, _rx) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
            channels.insert(c, tx);
        }
        Self {
            inner: Mutex::new(Inner::default()),
            channels,
            lookup_calls: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store mutex poisoned")
    }

    // ---- seeding -------------------------------------------------------

    pub fn insert_post(&self, row: PostRow) {
        self.lock().posts.push(row);
        self.notify(Collection::Posts);
    }

    pub fn insert_story(&self, row: StoryRow) {
        self.lock().stories.push(row);
        self.notify(Collection::Stories);
    }

    pub fn insert_message(&self, row: MessageRow) {
        self.lock().messages.push(row);
        self.notify(Collection::Messages);
    }

    pub fn insert_media(&self, row: MediaRow) {
        self.lock().media.push(row);
        self.notify(Collection::Media);
    }

    pub fn insert_comment(&self, row: CommentRow) {
        self.lock().comments.push(row);
        self.notify(Collection::Comments);
    }

    pub fn insert_profile(&self, id: impl Into<String>, profile: CreatorProfile) {
        self.lock().profiles.insert(id.into(), profile);
    }

    /// Emit a change notice without mutating anything (the channel is
    /// payload-free, so this is indistinguishable from a real write).
    pub fn notify(&self, collection: Collection) {
        if let Some(tx) = self.channels.get(&collection) {
            // No receivers is fine; nobody is watching yet.
            let _ = tx.send(ChangeNotice);
        }
    }

    // ---- fault injection ------------------------------------------------

    pub fn fail_queries_for(&self, collection: Collection, fail: bool) {
        let mut inner = self.lock();
        if fail {
            inner.fail_queries.insert(collection);
        } else {
            inner.fail_queries.remove(&collection);
        }
    }

    pub fn fail_counts_for(&self, collection: Collection, fail: bool) {
        let mut inner = self.lock();
        if fail {
            inner.fail_counts.insert(collection);
        } else {
            inner.fail_counts.remove(&collection);
        }
    }

    pub fn fail_subscribe_for(&self, collection: Collection, fail: bool) {
        let mut inner = self.lock();
        if fail {
            inner.fail_subscribe.insert(collection);
        } else {
            inner.fail_subscribe.remove(&collection);
        }
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.lock().fail_lookup = fail;
    }

    /// How many batch lookups have hit the directory (N+1 guard).
    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    fn check_query(&self, collection: Collection) -> Result<()> {
        if self.lock().fail_queries.contains(&collection) {
            return Err(anyhow!("injected query failure for {collection}"));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Recency page over any row type: filter, stable sort desc, cap.
fn page<R: Clone>(
    rows: &[R],
    q: &PageQuery,
    created_at: impl Fn(&R) -> DateTime<Utc>,
    deleted: impl Fn(&R) -> bool,
    term_matches: impl Fn(&R, &str) -> bool,
) -> Vec<R> {
    let needle = q.search_term.as_deref().map(|t| t.to_lowercase());
    let mut out: Vec<R> = rows
        .iter()
        .filter(|r| q.include_deleted || !deleted(r))
        .filter(|r| match &needle {
            Some(n) => term_matches(r, n),
            None => true,
        })
        .cloned()
        .collect();
    // Stable sort keeps insertion order on timestamp ties.
    out.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    if q.limit > 0 {
        out.truncate(q.limit);
    }
    out
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn recent_posts(&self, q: &PageQuery) -> Result<Vec<PostRow>> {
        self.check_query(Collection::Posts)?;
        let inner = self.lock();
        Ok(page(
            &inner.posts,
            q,
            |r| r.created_at,
            |r| r.deleted,
            |r, n| r.body.to_lowercase().contains(n),
        ))
    }

    async fn recent_stories(&self, q: &PageQuery) -> Result<Vec<StoryRow>> {
        self.check_query(Collection::Stories)?;
        let inner = self.lock();
        Ok(page(
            &inner.stories,
            q,
            |r| r.created_at,
            |r| r.deleted,
            |_, _| true, // no free text: the term does not apply
        ))
    }

    async fn recent_messages(&self, q: &PageQuery) -> Result<Vec<MessageRow>> {
        self.check_query(Collection::Messages)?;
        let inner = self.lock();
        Ok(page(
            &inner.messages,
            q,
            |r| r.created_at,
            |r| r.deleted,
            |r, n| r.text.to_lowercase().contains(n),
        ))
    }

    async fn recent_media(&self, q: &PageQuery) -> Result<Vec<MediaRow>> {
        self.check_query(Collection::Media)?;
        let inner = self.lock();
        Ok(page(
            &inner.media,
            q,
            |r| r.created_at,
            |r| r.deleted,
            |r, n| r.alt_text.to_lowercase().contains(n),
        ))
    }

    async fn recent_comments(&self, q: &PageQuery) -> Result<Vec<CommentRow>> {
        self.check_query(Collection::Comments)?;
        let inner = self.lock();
        Ok(page(
            &inner.comments,
            q,
            |r| r.created_at,
            |r| r.deleted,
            |r, n| r.text.to_lowercase().contains(n),
        ))
    }

    async fn count(&self, collection: Collection, filter: CountFilter) -> Result<u64> {
        let inner = self.lock();
        if inner.fail_counts.contains(&collection) {
            return Err(anyhow!("injected count failure for {collection}"));
        }
        fn tally<R>(
            rows: &[R],
            filter: CountFilter,
            deleted: impl Fn(&R) -> bool,
            flagged: impl Fn(&R) -> bool,
        ) -> u64 {
            match filter {
                CountFilter::All => rows.len() as u64,
                CountFilter::Deleted => rows.iter().filter(|r| deleted(r)).count() as u64,
                CountFilter::Flagged => rows.iter().filter(|r| flagged(r)).count() as u64,
            }
        }
        Ok(match collection {
            Collection::Posts => tally(&inner.posts, filter, |r| r.deleted, |r| r.flagged),
            Collection::Stories => tally(&inner.stories, filter, |r| r.deleted, |r| r.flagged),
            Collection::Messages => tally(&inner.messages, filter, |r| r.deleted, |r| r.flagged),
            Collection::Media => tally(&inner.media, filter, |r| r.deleted, |r| r.flagged),
            Collection::Comments => tally(&inner.comments, filter, |r| r.deleted, |r| r.flagged),
        })
    }

    fn subscribe(&self, collection: Collection) -> Result<broadcast::Receiver<ChangeNotice>> {
        if self.lock().fail_subscribe.contains(&collection) {
            return Err(anyhow!("injected subscribe failure for {collection}"));
        }
        let tx = self
            .channels
            .get(&collection)
            .ok_or_else(|| anyhow!("no channel for {collection}"))?;
        Ok(tx.subscribe())
    }
}

#[async_trait]
impl CreatorDirectory for MemoryStore {
    async fn lookup(&self, ids: &[String]) -> Result<HashMap<String, CreatorProfile>> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        let inner = self.lock();
        if inner.fail_lookup {
            return Err(anyhow!("injected lookup failure"));
        }
        let mut out = HashMap::new();
        for id in ids {
            if let Some(p) = inner.profiles.get(id) {
                out.insert(id.clone(), p.clone());
            }
        }
        Ok(out)
    }
}
