//! Catalog operations as seen by the HTTP surface: listings, single-entry
//! reads, mutations, tag management and statistics.
//!
//! Every operation validates its input before touching the store and returns
//! the fresh record so callers never need a second round trip.

use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::{CatalogStore, TagStats, VideoStats};
use crate::error::{CatalogError, CatalogResult};
use crate::filter::{
    BY_TAG_LIMIT, ListingParams, ListingQuery, PageRequest, Pagination, SEARCH_LIMIT,
    VIDEO_LIST_LIMIT, build_query, build_tag_query,
};
use crate::model::{Tag, TagInput, Video, VideoInput, VideoStatus};
use crate::rules::{RuleContext, apply_post_update_rules};
use crate::validation::{
    normalize_tag_names, validate_new_tag, validate_new_video, validate_priority,
    validate_progress, validate_tag_changes, validate_video_changes,
};
use crate::youtube::VideoLinks;

const RECENT_VIDEOS: u32 = 5;
const MOST_USED_TAGS: u32 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct VideoPage {
    pub videos: Vec<Video>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagPage {
    pub tags: Vec<Tag>,
    pub pagination: Pagination,
}

#[derive(Clone)]
pub struct Catalog {
    store: CatalogStore,
}

impl Catalog {
    pub fn new(store: CatalogStore) -> Self {
        Self { store }
    }

    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(CatalogStore::open(path).await?))
    }

    /// Maps tag names to ids after normalizing them. Unknown names are
    /// dropped without error.
    pub async fn resolve_tags(&self, names: Vec<String>) -> CatalogResult<Vec<String>> {
        self.store.resolve_tag_ids(&normalize_tag_names(names)).await
    }

    pub async fn list_videos(&self, params: &ListingParams) -> CatalogResult<VideoPage> {
        let query = build_query(params, VIDEO_LIST_LIMIT)?;
        self.run_listing(query).await
    }

    pub async fn search_videos(&self, params: &ListingParams) -> CatalogResult<VideoPage> {
        let query = build_query(params, SEARCH_LIMIT)?;
        self.run_listing(query).await
    }

    /// Lists the videos referencing one tag. The remaining filters still
    /// apply, except that any `tags` parameter is superseded by the path.
    pub async fn videos_by_tag(
        &self,
        tag_id: &str,
        params: &ListingParams,
    ) -> CatalogResult<VideoPage> {
        if self.store.get_tag(tag_id).await?.is_none() {
            return Err(CatalogError::not_found("tag not found"));
        }
        let mut query = build_query(params, BY_TAG_LIMIT)?;
        query.tag_names.clear();
        query.predicate.tag_ids = Some(vec![tag_id.to_string()]);
        self.query_page(query).await
    }

    async fn run_listing(&self, query: ListingQuery) -> CatalogResult<VideoPage> {
        let ids = self.store.resolve_tag_ids(&query.tag_names).await?;
        self.query_page(query.with_tag_ids(ids)).await
    }

    async fn query_page(&self, query: ListingQuery) -> CatalogResult<VideoPage> {
        let (mut videos, total) = self
            .store
            .query_videos(&query.predicate, &query.sort, &query.page)
            .await?;
        for video in &mut videos {
            self.backfill(video).await?;
        }
        Ok(VideoPage {
            videos,
            pagination: Pagination::new(query.page, total),
        })
    }

    pub async fn get_video(&self, id: &str) -> CatalogResult<Video> {
        let mut video = self.load_video(id).await?;
        self.backfill(&mut video).await?;
        Ok(video)
    }

    /// Derives and persists the platform id for entries saved without one.
    /// A derived id already owned by another entry is left unpersisted.
    async fn backfill(&self, video: &mut Video) -> CatalogResult<()> {
        if video.video_id.is_some() {
            return Ok(());
        }
        let Some(links) = VideoLinks::from_url(&video.url) else {
            return Ok(());
        };
        // Any stored thumbnail predates the id and may point at another video.
        match self
            .store
            .backfill_video_id(&video.id, &links.video_id, &links.thumbnail)
            .await
        {
            Ok(()) => {}
            Err(CatalogError::Conflict(_)) => {
                warn!(
                    video = %video.id,
                    video_id = %links.video_id,
                    "derived video id already belongs to another entry; not persisted"
                );
                return Ok(());
            }
            Err(err) => return Err(err),
        }
        video.video_id = Some(links.video_id);
        video.thumbnail = Some(links.thumbnail);
        video.embed_url = Some(links.embed_url);
        Ok(())
    }

    pub async fn create_video(&self, input: VideoInput) -> CatalogResult<Video> {
        let draft = validate_new_video(input)?;
        let tag_ids = self.store.resolve_tag_ids(&draft.tag_names).await?;

        let now = Utc::now();
        let mut video = Video {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            url: draft.url,
            video_id: Some(draft.links.video_id),
            thumbnail: Some(draft.links.thumbnail),
            embed_url: Some(draft.links.embed_url),
            description: draft.description,
            notes: draft.notes,
            status: draft.status,
            difficulty: draft.difficulty,
            priority: draft.priority,
            progress: draft.progress,
            date_added: now,
            date_watched: None,
            collection_tags: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        apply_post_update_rules(
            &mut video,
            &RuleContext {
                previous_status: None,
                now,
            },
        );
        self.store.insert_video(&video, &tag_ids).await?;
        info!(video = %video.id, name = %video.name, "video created");
        self.load_video(&video.id).await
    }

    pub async fn update_video(&self, id: &str, input: VideoInput) -> CatalogResult<Video> {
        let changes = validate_video_changes(input)?;
        let mut video = self.load_video(id).await?;
        let previous_status = video.status;

        if let Some(name) = changes.name {
            video.name = name;
        }
        if let Some((url, links)) = changes.url {
            video.url = url;
            video.video_id = Some(links.video_id);
            video.thumbnail = Some(links.thumbnail);
            video.embed_url = Some(links.embed_url);
        }
        if let Some(status) = changes.status {
            video.status = status;
        }
        if let Some(difficulty) = changes.difficulty {
            video.difficulty = difficulty;
        }
        if let Some(priority) = changes.priority {
            video.priority = priority;
        }
        if let Some(progress) = changes.progress {
            video.progress = progress;
        }
        if let Some(description) = changes.description {
            video.description = description;
        }
        if let Some(notes) = changes.notes {
            video.notes = notes;
        }
        let tag_ids = match changes.tag_names {
            Some(names) => Some(self.store.resolve_tag_ids(&names).await?),
            None => None,
        };

        self.save(video, previous_status, tag_ids).await
    }

    pub async fn update_priority(&self, id: &str, priority: Option<i64>) -> CatalogResult<Video> {
        let priority = validate_priority(priority)?;
        let mut video = self.load_video(id).await?;
        let previous_status = video.status;
        video.priority = priority;
        self.save(video, previous_status, None).await
    }

    pub async fn update_progress(&self, id: &str, progress: Option<i64>) -> CatalogResult<Video> {
        let progress = validate_progress(progress)?;
        let mut video = self.load_video(id).await?;
        let previous_status = video.status;
        video.progress = progress;
        self.save(video, previous_status, None).await
    }

    /// Marks a video watched and stamps the watch date with the current time,
    /// even when it was already watched.
    pub async fn mark_watched(&self, id: &str) -> CatalogResult<Video> {
        let mut video = self.load_video(id).await?;
        let previous_status = video.status;
        video.status = VideoStatus::Watched;
        video.date_watched = Some(Utc::now());
        self.save(video, previous_status, None).await
    }

    /// Removes a video and returns it as it was before deletion.
    pub async fn delete_video(&self, id: &str) -> CatalogResult<Video> {
        let video = self.load_video(id).await?;
        if !self.store.delete_video(id).await? {
            return Err(CatalogError::not_found("video not found"));
        }
        info!(video = %video.id, "video deleted");
        Ok(video)
    }

    pub async fn video_stats(&self) -> CatalogResult<VideoStats> {
        let mut stats = self
            .store
            .video_stats(&PageRequest {
                page: 1,
                limit: RECENT_VIDEOS,
            })
            .await?;
        for video in &mut stats.recent_videos {
            self.backfill(video).await?;
        }
        Ok(stats)
    }

    pub async fn create_tag(&self, input: TagInput) -> CatalogResult<Tag> {
        let draft = validate_new_tag(input)?;
        let now = Utc::now();
        let tag = Tag {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            color: draft.color,
            description: draft.description,
            category: draft.category,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_tag(&tag).await?;
        info!(tag = %tag.id, name = %tag.name, "tag created");
        Ok(tag)
    }

    pub async fn list_tags(&self, params: &ListingParams) -> CatalogResult<TagPage> {
        let query = build_tag_query(params)?;
        let (tags, total) = self.store.list_tags(&query).await?;
        Ok(TagPage {
            tags,
            pagination: Pagination::new(query.page, total),
        })
    }

    pub async fn get_tag(&self, id: &str) -> CatalogResult<Tag> {
        self.store
            .get_tag(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("tag not found"))
    }

    pub async fn update_tag(&self, id: &str, input: TagInput) -> CatalogResult<Tag> {
        let changes = validate_tag_changes(input)?;
        let mut tag = self.get_tag(id).await?;
        if let Some(name) = changes.name {
            tag.name = name;
        }
        if let Some(color) = changes.color {
            tag.color = color;
        }
        if let Some(description) = changes.description {
            tag.description = description;
        }
        if let Some(category) = changes.category {
            tag.category = category;
        }
        tag.updated_at = Utc::now();
        self.store.update_tag(&tag).await?;
        Ok(tag)
    }

    /// Deletes a tag nobody references. Referenced tags are reported with
    /// the number of videos still pointing at them.
    pub async fn delete_tag(&self, id: &str) -> CatalogResult<Tag> {
        let tag = self.get_tag(id).await?;
        let video_count = self.store.count_videos_with_tag(id).await?;
        if video_count > 0 {
            return Err(CatalogError::InUse {
                message: format!("tag is still used by {video_count} video(s)"),
                video_count,
            });
        }
        if !self.store.delete_tag(id).await? {
            return Err(CatalogError::not_found("tag not found"));
        }
        info!(tag = %tag.id, name = %tag.name, "tag deleted");
        Ok(tag)
    }

    pub async fn tag_stats(&self) -> CatalogResult<TagStats> {
        self.store.tag_stats(MOST_USED_TAGS).await
    }

    async fn load_video(&self, id: &str) -> CatalogResult<Video> {
        self.store
            .get_video(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("video not found"))
    }

    /// Runs the post-update rules, writes the record and reads it back.
    async fn save(
        &self,
        mut video: Video,
        previous_status: VideoStatus,
        tag_ids: Option<Vec<String>>,
    ) -> CatalogResult<Video> {
        let now = Utc::now();
        video.updated_at = now;
        apply_post_update_rules(
            &mut video,
            &RuleContext {
                previous_status: Some(previous_status),
                now,
            },
        );
        self.store.update_video(&video, tag_ids.as_deref()).await?;
        self.get_video(&video.id).await
    }
}
