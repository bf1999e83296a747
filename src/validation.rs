//! Boundary checks for request bodies.
//!
//! Each check turns a loosely typed input into a draft whose fields are
//! already known to satisfy the catalog invariants, so nothing reaches the
//! store unless every check passed.

use crate::error::{CatalogError, CatalogResult};
use crate::model::{
    DEFAULT_PRIORITY, DEFAULT_TAG_COLOR, Difficulty, MAX_TAG_NAME_LEN, MAX_VIDEO_NAME_LEN,
    TagCategory, TagInput, VideoInput, VideoStatus, normalize_tag_name,
};
use crate::youtube::{self, VideoLinks};

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub name: String,
    pub url: String,
    pub links: VideoLinks,
    pub tag_names: Vec<String>,
    pub status: VideoStatus,
    pub difficulty: Difficulty,
    pub priority: u8,
    pub progress: u8,
    pub description: Option<String>,
    pub notes: Option<String>,
}

/// Fields present in a partial update. `None` leaves the stored value alone;
/// for `description`/`notes` an inner `None` clears the stored text.
#[derive(Debug, Clone, Default)]
pub struct VideoChanges {
    pub name: Option<String>,
    pub url: Option<(String, VideoLinks)>,
    pub tag_names: Option<Vec<String>>,
    pub status: Option<VideoStatus>,
    pub difficulty: Option<Difficulty>,
    pub priority: Option<u8>,
    pub progress: Option<u8>,
    pub description: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct NewTag {
    pub name: String,
    pub color: String,
    pub description: Option<String>,
    pub category: TagCategory,
}

#[derive(Debug, Clone, Default)]
pub struct TagChanges {
    pub name: Option<String>,
    pub color: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<TagCategory>,
}

pub fn validate_new_video(input: VideoInput) -> CatalogResult<NewVideo> {
    let mut errors = Vec::new();

    let name = match input.name.as_deref() {
        Some(name) => check_video_name(name, &mut errors),
        None => {
            errors.push("name is required".to_string());
            None
        }
    };
    let url = match input.url.as_deref() {
        Some(url) => check_url(url, &mut errors),
        None => {
            errors.push("url is required".to_string());
            None
        }
    };
    let status = check_optional(input.status.as_deref(), check_status, &mut errors);
    let difficulty = check_optional(input.difficulty.as_deref(), check_difficulty, &mut errors);
    let priority = check_optional(input.priority, check_priority, &mut errors);
    let progress = check_optional(input.progress, check_progress, &mut errors);

    let (Some(name), Some((url, links))) = (name, url) else {
        return Err(CatalogError::invalid_fields(errors));
    };
    if !errors.is_empty() {
        return Err(CatalogError::invalid_fields(errors));
    }

    Ok(NewVideo {
        name,
        url,
        links,
        tag_names: normalize_tag_names(input.collection_tags.unwrap_or_default()),
        status: status.unwrap_or_default(),
        difficulty: difficulty.unwrap_or_default(),
        priority: priority.unwrap_or(DEFAULT_PRIORITY),
        progress: progress.unwrap_or(0),
        description: clean_text(input.description),
        notes: clean_text(input.notes),
    })
}

pub fn validate_video_changes(input: VideoInput) -> CatalogResult<VideoChanges> {
    let mut errors = Vec::new();

    let name = check_optional(input.name.as_deref(), check_video_name_required, &mut errors);
    let url = check_optional(input.url.as_deref(), check_url_required, &mut errors);
    let status = check_optional(input.status.as_deref(), check_status, &mut errors);
    let difficulty = check_optional(input.difficulty.as_deref(), check_difficulty, &mut errors);
    let priority = check_optional(input.priority, check_priority, &mut errors);
    let progress = check_optional(input.progress, check_progress, &mut errors);

    if !errors.is_empty() {
        return Err(CatalogError::invalid_fields(errors));
    }

    Ok(VideoChanges {
        name,
        url,
        tag_names: input.collection_tags.map(normalize_tag_names),
        status,
        difficulty,
        priority,
        progress,
        description: input.description.map(|text| clean_text(Some(text))),
        notes: input.notes.map(|text| clean_text(Some(text))),
    })
}

pub fn validate_priority(priority: Option<i64>) -> CatalogResult<u8> {
    let priority = priority.ok_or_else(|| CatalogError::invalid("priority is required"))?;
    check_priority(priority).map_err(CatalogError::invalid)
}

pub fn validate_progress(progress: Option<i64>) -> CatalogResult<u8> {
    let progress = progress.ok_or_else(|| CatalogError::invalid("progress is required"))?;
    check_progress(progress).map_err(CatalogError::invalid)
}

pub fn validate_new_tag(input: TagInput) -> CatalogResult<NewTag> {
    let mut errors = Vec::new();

    let name = match input.name.as_deref() {
        Some(name) => check_tag_name(name).map_err(|err| errors.push(err)).ok(),
        None => {
            errors.push("tag name is required".to_string());
            None
        }
    };
    let color = check_optional(input.color.as_deref(), check_color, &mut errors);
    let category = check_optional(input.category.as_deref(), check_category, &mut errors);

    let Some(name) = name else {
        return Err(CatalogError::invalid_fields(errors));
    };
    if !errors.is_empty() {
        return Err(CatalogError::invalid_fields(errors));
    }

    Ok(NewTag {
        name,
        color: color.unwrap_or_else(|| DEFAULT_TAG_COLOR.to_string()),
        description: clean_text(input.description),
        category: category.unwrap_or_default(),
    })
}

pub fn validate_tag_changes(input: TagInput) -> CatalogResult<TagChanges> {
    let mut errors = Vec::new();

    let name = check_optional(input.name.as_deref(), check_tag_name, &mut errors);
    let color = check_optional(input.color.as_deref(), check_color, &mut errors);
    let category = check_optional(input.category.as_deref(), check_category, &mut errors);

    if !errors.is_empty() {
        return Err(CatalogError::invalid_fields(errors));
    }

    Ok(TagChanges {
        name,
        color,
        description: input.description.map(|text| clean_text(Some(text))),
        category,
    })
}

/// Normalizes and de-duplicates tag names while keeping their first-seen
/// order. Blank names are dropped.
pub fn normalize_tag_names(names: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = normalize_tag_name(&name);
        if !name.is_empty() && !normalized.contains(&name) {
            normalized.push(name);
        }
    }
    normalized
}

fn check_optional<T: Copy, U>(
    value: Option<T>,
    check: impl Fn(T) -> Result<U, String>,
    errors: &mut Vec<String>,
) -> Option<U> {
    value.and_then(|value| check(value).map_err(|err| errors.push(err)).ok())
}

fn check_video_name(name: &str, errors: &mut Vec<String>) -> Option<String> {
    check_video_name_required(name)
        .map_err(|err| errors.push(err))
        .ok()
}

fn check_video_name_required(name: &str) -> Result<String, String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("name is required".to_string());
    }
    if trimmed.chars().count() > MAX_VIDEO_NAME_LEN {
        return Err(format!(
            "name cannot exceed {MAX_VIDEO_NAME_LEN} characters"
        ));
    }
    Ok(trimmed.to_string())
}

fn check_url(url: &str, errors: &mut Vec<String>) -> Option<(String, VideoLinks)> {
    check_url_required(url).map_err(|err| errors.push(err)).ok()
}

fn check_url_required(url: &str) -> Result<(String, VideoLinks), String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err("url is required".to_string());
    }
    if !youtube::is_valid_url(trimmed) {
        return Err("url must be a valid YouTube link".to_string());
    }
    let links = VideoLinks::from_url(trimmed)
        .ok_or_else(|| "url must be a valid YouTube link".to_string())?;
    Ok((trimmed.to_string(), links))
}

fn check_status(value: &str) -> Result<VideoStatus, String> {
    VideoStatus::parse(value)
        .ok_or_else(|| "status must be one of: learning, later, watched".to_string())
}

fn check_difficulty(value: &str) -> Result<Difficulty, String> {
    Difficulty::parse(value)
        .ok_or_else(|| "difficulty must be one of: beginner, intermediate, advanced".to_string())
}

fn check_priority(value: i64) -> Result<u8, String> {
    if (1..=5).contains(&value) {
        Ok(value as u8)
    } else {
        Err("priority must be an integer between 1 and 5".to_string())
    }
}

fn check_progress(value: i64) -> Result<u8, String> {
    if (0..=100).contains(&value) {
        Ok(value as u8)
    } else {
        Err("progress must be an integer between 0 and 100".to_string())
    }
}

fn check_tag_name(name: &str) -> Result<String, String> {
    let normalized = normalize_tag_name(name);
    if normalized.is_empty() {
        return Err("tag name is required".to_string());
    }
    if normalized.chars().count() > MAX_TAG_NAME_LEN {
        return Err(format!(
            "tag name cannot exceed {MAX_TAG_NAME_LEN} characters"
        ));
    }
    Ok(normalized)
}

fn check_color(color: &str) -> Result<String, String> {
    let trimmed = color.trim();
    if trimmed.is_empty() {
        Err("color must be a non-empty string".to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

fn check_category(value: &str) -> Result<TagCategory, String> {
    TagCategory::parse(value).ok_or_else(|| {
        "category must be one of: technology, language, framework, concept, other".to_string()
    })
}

fn clean_text(text: Option<String>) -> Option<String> {
    text.map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
