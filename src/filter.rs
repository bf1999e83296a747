//! Turns raw query-string pairs into validated listing queries and computes
//! pagination metadata for their results.
//!
//! Every value arrives as a string. Coercion is explicit: a value that does
//! not parse is a validation error, never silently clamped or ignored.

use serde::Serialize;

use crate::error::{CatalogError, CatalogResult};
use crate::model::{Difficulty, TagCategory, VideoStatus};
use crate::validation::normalize_tag_names;

pub const VIDEO_LIST_LIMIT: u32 = 10;
pub const SEARCH_LIMIT: u32 = 20;
pub const BY_TAG_LIMIT: u32 = 10;
pub const TAG_LIST_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 100;

/// Query parameters exactly as the client sent them, minus empty values.
#[derive(Debug, Clone, Default)]
pub struct ListingParams {
    pub status: Option<String>,
    pub difficulty: Option<String>,
    pub priority: Option<String>,
    pub tags: Vec<String>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl ListingParams {
    /// Collects recognized keys from decoded query pairs. `tags` may repeat,
    /// use the `tags[]` form, or hold a comma-separated list. When both `q`
    /// and `search` are present, `q` wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = Self::default();
        let mut q = None;
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "status" => &mut params.status,
                "difficulty" => &mut params.difficulty,
                "priority" => &mut params.priority,
                "search" => &mut params.search,
                "q" => &mut q,
                "category" => &mut params.category,
                "page" => &mut params.page,
                "limit" => &mut params.limit,
                "sortBy" => &mut params.sort_by,
                "order" => &mut params.order,
                "tags" | "tags[]" => {
                    params.tags.extend(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|name| !name.is_empty())
                            .map(str::to_string),
                    );
                    continue;
                }
                _ => continue,
            };
            *slot = Some(value.to_string());
        }
        if q.is_some() {
            params.search = q;
        }
        params
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    Name,
    #[default]
    DateAdded,
    Priority,
    Status,
    Difficulty,
    Progress,
}

impl SortField {
    pub const ALL: [Self; 6] = [
        Self::Name,
        Self::DateAdded,
        Self::Priority,
        Self::Status,
        Self::Difficulty,
        Self::Progress,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::DateAdded => "dateAdded",
            Self::Priority => "priority",
            Self::Status => "status",
            Self::Difficulty => "difficulty",
            Self::Progress => "progress",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// Conditions a video must satisfy to be listed. `None` fields are not
/// constrained. `tag_ids` is filled in after tag names have been resolved;
/// an empty list there matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoPredicate {
    pub status: Option<VideoStatus>,
    pub difficulty: Option<Difficulty>,
    pub priority: Option<u8>,
    pub tag_ids: Option<Vec<String>>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub predicate: VideoPredicate,
    pub sort: Sort,
    pub page: PageRequest,
    /// Normalized tag names still waiting for resolution.
    pub tag_names: Vec<String>,
}

impl ListingQuery {
    /// Attaches resolved tag ids. Without requested names the predicate stays
    /// unconstrained, whatever `ids` holds.
    pub fn with_tag_ids(mut self, ids: Vec<String>) -> Self {
        if !self.tag_names.is_empty() {
            self.predicate.tag_ids = Some(ids);
        }
        self
    }
}

pub fn build_query(params: &ListingParams, default_limit: u32) -> CatalogResult<ListingQuery> {
    let status = params
        .status
        .as_deref()
        .map(|value| {
            VideoStatus::parse(value).ok_or_else(|| {
                CatalogError::invalid("status must be one of: learning, later, watched")
            })
        })
        .transpose()?;
    let difficulty = params
        .difficulty
        .as_deref()
        .map(|value| {
            Difficulty::parse(value).ok_or_else(|| {
                CatalogError::invalid("difficulty must be one of: beginner, intermediate, advanced")
            })
        })
        .transpose()?;
    let priority = params
        .priority
        .as_deref()
        .map(|value| match value.parse::<u8>() {
            Ok(priority @ 1..=5) => Ok(priority),
            _ => Err(CatalogError::invalid(
                "priority must be an integer between 1 and 5",
            )),
        })
        .transpose()?;

    Ok(ListingQuery {
        predicate: VideoPredicate {
            status,
            difficulty,
            priority,
            tag_ids: None,
            text: params.search.clone(),
        },
        sort: parse_sort(params)?,
        page: parse_page(params, default_limit)?,
        tag_names: normalize_tag_names(params.tags.clone()),
    })
}

pub fn parse_sort(params: &ListingParams) -> CatalogResult<Sort> {
    let field = match params.sort_by.as_deref() {
        Some(value) => SortField::parse(value).ok_or_else(|| {
            let allowed: Vec<&str> = SortField::ALL.iter().map(|field| field.as_str()).collect();
            CatalogError::invalid(format!("sortBy must be one of: {}", allowed.join(", ")))
        })?,
        None => SortField::default(),
    };
    let order = match params.order.as_deref() {
        Some(value) => SortOrder::parse(value)
            .ok_or_else(|| CatalogError::invalid("order must be one of: asc, desc"))?,
        None => SortOrder::default(),
    };
    Ok(Sort { field, order })
}

pub fn parse_page(params: &ListingParams, default_limit: u32) -> CatalogResult<PageRequest> {
    let page = match params.page.as_deref() {
        Some(value) => match value.parse::<u32>() {
            Ok(page) if page >= 1 => page,
            _ => return Err(CatalogError::invalid("page must be an integer greater than 0")),
        },
        None => 1,
    };
    let limit = match params.limit.as_deref() {
        Some(value) => match value.parse::<u32>() {
            Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => limit,
            _ => {
                return Err(CatalogError::invalid(format!(
                    "limit must be an integer between 1 and {MAX_LIMIT}"
                )));
            }
        },
        None => default_limit,
    };
    Ok(PageRequest { page, limit })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagQuery {
    pub category: Option<TagCategory>,
    pub text: Option<String>,
    pub page: PageRequest,
}

pub fn build_tag_query(params: &ListingParams) -> CatalogResult<TagQuery> {
    let category = params
        .category
        .as_deref()
        .map(|value| {
            TagCategory::parse(value).ok_or_else(|| {
                CatalogError::invalid(
                    "category must be one of: technology, language, framework, concept, other",
                )
            })
        })
        .transpose()?;
    Ok(TagQuery {
        category,
        text: params.search.clone(),
        page: parse_page(params, TAG_LIST_LIMIT)?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(request: PageRequest, total: u64) -> Self {
        let pages = total.div_ceil(u64::from(request.limit));
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages,
            has_next: u64::from(request.page) < pages,
            has_prev: request.page > 1,
        }
    }
}
