//! # Filter Predicate
//! Immutable, fully serializable filter value object with two-phase
//! evaluation: `FilterKind::implicated_sources` decides which adapters
//! the engine invokes (cheap prefilter), `FilterPredicate::matches` is
//! the authoritative post-merge pass (content shape, creator, tags,
//! deletion overlay). Two predicates with equal fields select identical
//! result sets from the same input.

use serde::{Deserialize, Serialize};

use crate::record::{ContentRecord, SourceType, Visibility};

/// Recognized filter options from the console. Source-kind variants
/// narrow by origin; `Images`/`Videos` are content-shape checks;
/// `Ppv`/`Public`/`Private`/`Deleted` test record attributes after merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    #[default]
    All,
    Posts,
    Stories,
    Messages,
    Media,
    Comments,
    Deleted,
    Ppv,
    Public,
    Private,
    Images,
    Videos,
}

impl FilterKind {
    /// Which adapters a refresh must invoke for this kind. Attribute and
    /// deletion filters can match anything, so they implicate everything;
    /// shape filters implicate only the sources that can carry that shape
    /// (comments are text-only, messages carry image attachments).
    pub fn implicated_sources(self) -> &'static [SourceType] {
        use SourceType::*;
        match self {
            FilterKind::All
            | FilterKind::Deleted
            | FilterKind::Ppv
            | FilterKind::Public
            | FilterKind::Private => &SourceType::ORIGINS,
            FilterKind::Posts => &[Post],
            FilterKind::Stories => &[Story],
            FilterKind::Messages => &[Message],
            FilterKind::Media => &[Media],
            FilterKind::Comments => &[Comment],
            FilterKind::Images => &[Post, Story, Message, Media],
            FilterKind::Videos => &[Post, Story, Media],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::All => "all",
            FilterKind::Posts => "posts",
            FilterKind::Stories => "stories",
            FilterKind::Messages => "messages",
            FilterKind::Media => "media",
            FilterKind::Comments => "comments",
            FilterKind::Deleted => "deleted",
            FilterKind::Ppv => "ppv",
            FilterKind::Public => "public",
            FilterKind::Private => "private",
            FilterKind::Images => "images",
            FilterKind::Videos => "videos",
        }
    }
}

impl std::str::FromStr for FilterKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(FilterKind::All),
            "posts" => Ok(FilterKind::Posts),
            "stories" => Ok(FilterKind::Stories),
            "messages" => Ok(FilterKind::Messages),
            "media" => Ok(FilterKind::Media),
            "comments" => Ok(FilterKind::Comments),
            "deleted" => Ok(FilterKind::Deleted),
            "ppv" => Ok(FilterKind::Ppv),
            "public" => Ok(FilterKind::Public),
            "private" => Ok(FilterKind::Private),
            "images" => Ok(FilterKind::Images),
            "videos" => Ok(FilterKind::Videos),
            other => Err(anyhow::anyhow!("unrecognized filter kind: {other:?}")),
        }
    }
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The active filter. Empty strings mean "dimension not constrained".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FilterPredicate {
    #[serde(default)]
    pub search_term: String,
    #[serde(default)]
    pub kind: FilterKind,
    #[serde(default)]
    pub creator_username: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub include_deleted: bool,
}

impl FilterPredicate {
    pub fn with_kind(kind: FilterKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Search term the adapters should push down to the store, if any.
    /// Search lives entirely at the adapter level: sources without free
    /// text ignore it, and no post-merge pass re-applies it.
    pub fn store_search_term(&self) -> Option<String> {
        let t = self.search_term.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    }

    /// Post-merge predicate. Pure: no mutation, deterministic.
    pub fn matches(&self, r: &ContentRecord) -> bool {
        // Deleted overlay first: soft-deleted rows are invisible unless
        // explicitly requested.
        if r.is_deleted && !self.include_deleted {
            return false;
        }

        if !self.kind_matches(r) {
            return false;
        }

        if !self.creator_username.is_empty() {
            let want = self.creator_username.to_lowercase();
            if !r.creator.username.to_lowercase().contains(&want) {
                return false;
            }
        }

        if !self.tag.is_empty() {
            let want = self.tag.to_lowercase();
            if !r.tags.iter().any(|t| t.to_lowercase() == want) {
                return false;
            }
        }

        true
    }

    fn kind_matches(&self, r: &ContentRecord) -> bool {
        match self.kind {
            FilterKind::All => true,
            // Source-kind narrowing sees the overlay: a soft-deleted post
            // is selected by `deleted`, not by `posts`.
            FilterKind::Posts => r.source_type() == SourceType::Post,
            FilterKind::Stories => r.source_type() == SourceType::Story,
            FilterKind::Messages => r.source_type() == SourceType::Message,
            FilterKind::Media => r.source_type() == SourceType::Media,
            FilterKind::Comments => r.source_type() == SourceType::Comment,
            FilterKind::Deleted => r.is_deleted,
            FilterKind::Ppv => r.monetization.is_pay_per_view,
            FilterKind::Public => r.visibility == Visibility::Public,
            FilterKind::Private => r.visibility == Visibility::Private,
            FilterKind::Images => !r.media_refs.is_empty(),
            FilterKind::Videos => !r.video_refs.is_empty(),
        }
    }

    /// Apply the predicate as a pure function over a slice. Idempotent:
    /// `apply(apply(xs)) == apply(xs)`.
    pub fn apply(&self, records: &[ContentRecord]) -> Vec<ContentRecord> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Counters, CreatorSummary, Monetization};
    use chrono::Utc;

    fn rec(origin: SourceType) -> ContentRecord {
        ContentRecord {
            id: "x".into(),
            origin,
            creator_id: "c".into(),
            creator: CreatorSummary {
                username: "alexcreates".into(),
                avatar_url: String::new(),
            },
            text_excerpt: "hello world".into(),
            media_refs: vec![],
            video_refs: vec![],
            visibility: Visibility::Public,
            monetization: Monetization::default(),
            tags: vec!["travel".into()],
            counters: Counters::default(),
            created_at: Utc::now(),
            is_deleted: false,
        }
    }

    #[test]
    fn kind_roundtrips_through_str() {
        for kind in [
            FilterKind::All,
            FilterKind::Posts,
            FilterKind::Stories,
            FilterKind::Messages,
            FilterKind::Media,
            FilterKind::Comments,
            FilterKind::Deleted,
            FilterKind::Ppv,
            FilterKind::Public,
            FilterKind::Private,
            FilterKind::Images,
            FilterKind::Videos,
        ] {
            assert_eq!(kind.as_str().parse::<FilterKind>().unwrap(), kind);
        }
        assert!("nonsense".parse::<FilterKind>().is_err());
    }

    #[test]
    fn attribute_kinds_implicate_every_source() {
        assert_eq!(
            FilterKind::Ppv.implicated_sources(),
            &SourceType::ORIGINS[..]
        );
        assert_eq!(
            FilterKind::Videos.implicated_sources(),
            &[SourceType::Post, SourceType::Story, SourceType::Media][..]
        );
        assert_eq!(
            FilterKind::Comments.implicated_sources(),
            &[SourceType::Comment][..]
        );
    }

    #[test]
    fn images_is_a_shape_check_not_a_source_check() {
        let mut post = rec(SourceType::Post);
        post.media_refs.push("img-1".into());
        let comment = rec(SourceType::Comment);

        let p = FilterPredicate::with_kind(FilterKind::Images);
        assert!(p.matches(&post));
        assert!(!p.matches(&comment));
    }

    #[test]
    fn deleted_selects_by_overlay_not_origin() {
        let mut r = rec(SourceType::Post);
        r.is_deleted = true;

        let mut deleted = FilterPredicate::with_kind(FilterKind::Deleted);
        deleted.include_deleted = true;
        assert!(deleted.matches(&r));

        let mut posts = FilterPredicate::with_kind(FilterKind::Posts);
        posts.include_deleted = true;
        assert!(!posts.matches(&r));
    }

    #[test]
    fn creator_and_tag_are_case_insensitive() {
        let r = rec(SourceType::Post);
        let p = FilterPredicate {
            creator_username: "Alex".into(),
            tag: "TRAVEL".into(),
            ..Default::default()
        };
        assert!(p.matches(&r));
    }

    #[test]
    fn search_term_is_pushdown_only_never_post_merge() {
        // A story's synthetic excerpt cannot match any real term; the
        // post-merge pass must not drop it for that.
        let mut story = rec(SourceType::Story);
        story.text_excerpt = "Story content".into();

        let p = FilterPredicate {
            search_term: "matching".into(),
            ..Default::default()
        };
        assert_eq!(p.store_search_term().as_deref(), Some("matching"));
        assert!(p.matches(&story));
    }

    #[test]
    fn apply_is_idempotent() {
        let mut a = rec(SourceType::Post);
        a.id = "a".into();
        let mut b = rec(SourceType::Story);
        b.id = "b".into();
        b.tags.clear();

        let p = FilterPredicate {
            tag: "travel".into(),
            ..Default::default()
        };
        let once = p.apply(&[a, b]);
        let twice = p.apply(&once);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 1);
    }

    #[test]
    fn predicate_is_serializable() {
        let p = FilterPredicate {
            search_term: "x".into(),
            kind: FilterKind::Videos,
            creator_username: "a".into(),
            tag: "t".into(),
            include_deleted: true,
        };
        let json = serde_json::to_string(&p).unwrap();
        let back: FilterPredicate = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
