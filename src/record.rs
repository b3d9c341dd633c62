//! # Content Record
//! The unified shape every source adapter normalizes into. Records are
//! plain data: `Clone`, serializable, no behavior beyond the deleted
//! overlay. Uniqueness key is `(source_type, id)` — ids are only stable
//! within their source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a record came from. `Deleted` is a terminal overlay state used
/// in the merged view; adapters never emit it as an origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Post,
    Story,
    Message,
    Media,
    Comment,
    Deleted,
}

impl SourceType {
    /// The five real origins, in adapter dispatch order.
    pub const ORIGINS: [SourceType; 5] = [
        SourceType::Post,
        SourceType::Story,
        SourceType::Message,
        SourceType::Media,
        SourceType::Comment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Post => "post",
            SourceType::Story => "story",
            SourceType::Message => "message",
            SourceType::Media => "media",
            SourceType::Comment => "comment",
            SourceType::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized visibility vocabulary. Adapters map source-specific labels
/// onto this enum (see `Visibility::from_source_label`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    SubscribersOnly,
    Private,
}

impl Visibility {
    /// Map a raw source label onto the shared vocabulary. Unknown labels
    /// default to `Public` rather than dropping the record.
    pub fn from_source_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "public" | "free" | "everyone" => Visibility::Public,
            "subscribers_only" | "subs" | "subscribers" | "followers" => {
                Visibility::SubscribersOnly
            }
            "private" | "paid" | "hidden" => Visibility::Private,
            _ => Visibility::Public,
        }
    }
}

/// Resolved creator summary. Sentinels cover resolution failure
/// (`unknown`) and system-owned content (`system`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorSummary {
    pub username: String,
    pub avatar_url: String,
}

impl CreatorSummary {
    pub fn unknown() -> Self {
        Self {
            username: "Unknown".to_string(),
            avatar_url: String::new(),
        }
    }

    pub fn system() -> Self {
        Self {
            username: "System".to_string(),
            avatar_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Monetization {
    pub is_pay_per_view: bool,
    pub amount: Option<f64>,
}

impl Monetization {
    pub fn pay_per_view(amount: f64) -> Self {
        Self {
            is_pay_per_view: true,
            amount: Some(amount),
        }
    }
}

/// Engagement counters; 0 where the source has no equivalent concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Counters {
    pub likes: u64,
    pub comments: u64,
    pub views: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Stable within its source type only.
    pub id: String,
    /// The adapter that produced this record. Stays on the original
    /// source even for soft-deleted rows, so per-source statistics stay
    /// correct; the merged view reads `source_type()` instead.
    pub origin: SourceType,
    /// Empty for system-owned media.
    pub creator_id: String,
    pub creator: CreatorSummary,
    pub text_excerpt: String,
    pub media_refs: Vec<String>,
    pub video_refs: Vec<String>,
    pub visibility: Visibility,
    pub monetization: Monetization,
    pub tags: Vec<String>,
    pub counters: Counters,
    /// The sole sort key for the merged feed.
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
}

impl ContentRecord {
    /// Source type as seen in the merged view: soft-deleted rows are
    /// overlaid with `Deleted`, everything else reports its origin.
    pub fn source_type(&self) -> SourceType {
        if self.is_deleted {
            SourceType::Deleted
        } else {
            self.origin
        }
    }

    /// Uniqueness key within the merged feed.
    pub fn key(&self) -> (SourceType, &str) {
        (self.source_type(), self.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(origin: SourceType) -> ContentRecord {
        ContentRecord {
            id: "r1".into(),
            origin,
            creator_id: "c1".into(),
            creator: CreatorSummary::unknown(),
            text_excerpt: String::new(),
            media_refs: vec![],
            video_refs: vec![],
            visibility: Visibility::Public,
            monetization: Monetization::default(),
            tags: vec![],
            counters: Counters::default(),
            created_at: Utc::now(),
            is_deleted: false,
        }
    }

    #[test]
    fn deleted_overlay_keeps_origin() {
        let mut r = blank(SourceType::Post);
        assert_eq!(r.source_type(), SourceType::Post);
        r.is_deleted = true;
        assert_eq!(r.source_type(), SourceType::Deleted);
        assert_eq!(r.origin, SourceType::Post);
    }

    #[test]
    fn visibility_label_mapping() {
        assert_eq!(Visibility::from_source_label("free"), Visibility::Public);
        assert_eq!(
            Visibility::from_source_label("FOLLOWERS"),
            Visibility::SubscribersOnly
        );
        assert_eq!(Visibility::from_source_label("paid"), Visibility::Private);
        // Unknown vocab degrades to public instead of dropping the row.
        assert_eq!(
            Visibility::from_source_label("weird-new-mode"),
            Visibility::Public
        );
    }

    #[test]
    fn source_type_serializes_lowercase() {
        let s = serde_json::to_string(&SourceType::Media).unwrap();
        assert_eq!(s, "\"media\"");
    }
}
