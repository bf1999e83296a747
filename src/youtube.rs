//! YouTube link parsing and thumbnail URL templating.
//!
//! Everything here is pure string work. Nothing checks that a video or its
//! thumbnail actually exists upstream.

use std::sync::LazyLock;

use regex::Regex;

static LINK_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([A-Za-z0-9_-]{11})")
        .expect("static link pattern compiles")
});

static BARE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("static id pattern compiles")
});

static VALID_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.)?(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)[A-Za-z0-9_-]{11}",
    )
    .expect("static url pattern compiles")
});

/// Returns the 11-character video id contained in `input`.
///
/// Watch, short-link and embed URLs are tried first, then a bare id. `None`
/// means the input is not recognized; callers decide whether that is fatal.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if let Some(captures) = LINK_ID.captures(input) {
        return captures.get(1).map(|id| id.as_str().to_string());
    }
    BARE_ID.is_match(input).then(|| input.to_string())
}

/// Accepts only full links (scheme and `www.` optional). Bare ids are not
/// valid URLs even though [`extract_video_id`] understands them.
pub fn is_valid_url(url: &str) -> bool {
    VALID_URL.is_match(url.trim())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThumbnailQuality {
    Default,
    #[default]
    Medium,
    High,
    Standard,
    MaxRes,
}

impl ThumbnailQuality {
    fn file_stem(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Medium => "mqdefault",
            Self::High => "hqdefault",
            Self::Standard => "sddefault",
            Self::MaxRes => "maxresdefault",
        }
    }
}

pub fn thumbnail_url(video_id: &str, quality: ThumbnailQuality) -> String {
    format!(
        "https://img.youtube.com/vi/{video_id}/{}.jpg",
        quality.file_stem()
    )
}

pub fn embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{video_id}")
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Every derived link for a single video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoLinks {
    pub video_id: String,
    pub thumbnail: String,
    pub embed_url: String,
    pub watch_url: String,
}

impl VideoLinks {
    pub fn from_url(url: &str) -> Option<Self> {
        extract_video_id(url).map(|video_id| Self::for_id(&video_id))
    }

    pub fn for_id(video_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            thumbnail: thumbnail_url(video_id, ThumbnailQuality::default()),
            embed_url: embed_url(video_id),
            watch_url: watch_url(video_id),
        }
    }
}
