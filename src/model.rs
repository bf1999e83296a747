//! Records stored in the catalog and the request payloads that create or
//! modify them.
//!
//! Records serialize with camelCase keys because that is what the browser
//! client reads and writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TAG_COLOR: &str = "#3B82F6";
pub const DEFAULT_PRIORITY: u8 = 3;
pub const MAX_VIDEO_NAME_LEN: usize = 200;
pub const MAX_TAG_NAME_LEN: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    #[default]
    Learning,
    Later,
    Watched,
}

impl VideoStatus {
    pub const ALL: [Self; 3] = [Self::Learning, Self::Later, Self::Watched];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Learning => "learning",
            Self::Later => "later",
            Self::Watched => "watched",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value.trim())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Self; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.as_str() == value.trim())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagCategory {
    Technology,
    Language,
    Framework,
    Concept,
    #[default]
    Other,
}

impl TagCategory {
    pub const ALL: [Self; 5] = [
        Self::Technology,
        Self::Language,
        Self::Framework,
        Self::Concept,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Technology => "technology",
            Self::Language => "language",
            Self::Framework => "framework",
            Self::Concept => "concept",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value.trim())
    }
}

/// Tag names are compared after trimming and lower-casing, everywhere.
pub fn normalize_tag_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A tag reference as embedded in a video response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSummary {
    pub id: String,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub name: String,
    pub url: String,
    /// Missing on entries saved before ids were derived; filled in on read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: VideoStatus,
    pub difficulty: Difficulty,
    pub priority: u8,
    pub progress: u8,
    pub date_added: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_watched: Option<DateTime<Utc>>,
    #[serde(default)]
    pub collection_tags: Vec<TagSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn tag_ids(&self) -> Vec<String> {
        self.collection_tags.iter().map(|tag| tag.id.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: TagCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of create and update requests for videos. Every field is optional so
/// the same shape serves partial updates; validation decides what is required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInput {
    pub name: Option<String>,
    pub url: Option<String>,
    pub collection_tags: Option<Vec<String>>,
    pub status: Option<String>,
    pub difficulty: Option<String>,
    pub priority: Option<i64>,
    pub progress: Option<i64>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagInput {
    pub name: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}
