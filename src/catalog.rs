//! Persistence layer for the catalog.
//!
//! Videos and tags live in a local SQLite database reached through libsql.
//! Tags are attached to videos by reference through the `video_tags` join
//! table; nothing at this level stops a referenced tag from being deleted,
//! that guard belongs to the service layer.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Builder, Connection, Row, Value, params, params::Params};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{CatalogError, CatalogResult, is_unique_violation};
use crate::filter::{PageRequest, Sort, SortField, SortOrder, TagQuery, VideoPredicate};
use crate::model::{Difficulty, Tag, TagCategory, TagSummary, Video, VideoStatus};
use crate::youtube;

async fn configure_connection(conn: &Connection) -> anyhow::Result<()> {
    conn.query("PRAGMA journal_mode=WAL", ()).await?;
    conn.execute_batch(
        r#"
        PRAGMA synchronous=NORMAL;
        PRAGMA foreign_keys=ON;
        "#,
    )
    .await?;
    Ok(())
}

async fn ensure_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            color TEXT NOT NULL DEFAULT '#3B82F6',
            description TEXT,
            category TEXT NOT NULL DEFAULT 'other'
                CHECK (category IN ('technology', 'language', 'framework', 'concept', 'other')),
            search_text TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS videos (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            url TEXT NOT NULL,
            video_id TEXT,
            thumbnail TEXT,
            description TEXT,
            notes TEXT,
            status TEXT NOT NULL DEFAULT 'learning'
                CHECK (status IN ('learning', 'later', 'watched')),
            difficulty TEXT NOT NULL DEFAULT 'beginner'
                CHECK (difficulty IN ('beginner', 'intermediate', 'advanced')),
            priority INTEGER NOT NULL DEFAULT 3 CHECK (priority BETWEEN 1 AND 5),
            progress INTEGER NOT NULL DEFAULT 0 CHECK (progress BETWEEN 0 AND 100),
            date_added TEXT NOT NULL,
            date_watched TEXT,
            search_text TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS video_tags (
            video_id TEXT NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
            tag_id TEXT NOT NULL,
            PRIMARY KEY (video_id, tag_id)
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_videos_video_id ON videos(video_id);
        CREATE INDEX IF NOT EXISTS idx_videos_status_added ON videos(status, date_added);
        CREATE INDEX IF NOT EXISTS idx_videos_priority ON videos(priority);
        CREATE INDEX IF NOT EXISTS idx_videos_difficulty ON videos(difficulty);
        CREATE INDEX IF NOT EXISTS idx_video_tags_tag ON video_tags(tag_id);
        "#,
    )
    .await?;

    migrate_search_text(conn).await?;

    Ok(())
}

/// Databases created before the folded search column existed get it added and
/// filled from the stored text fields.
async fn migrate_search_text(conn: &Connection) -> anyhow::Result<()> {
    for (table, fields) in [
        ("videos", "name, description, notes"),
        ("tags", "name, description"),
    ] {
        if has_column(conn, table, "search_text").await? {
            continue;
        }
        conn.execute(
            &format!("ALTER TABLE {table} ADD COLUMN search_text TEXT NOT NULL DEFAULT ''"),
            params![],
        )
        .await
        .with_context(|| format!("adding search_text to {table}"))?;

        let mut rows = conn
            .query(&format!("SELECT id, {fields} FROM {table}"), params![])
            .await?;
        let mut folded = Vec::new();
        while let Some(row) = rows.next().await? {
            let id: String = row.get(0)?;
            let mut parts = vec![row.get::<String>(1)?];
            for index in 2..rows.column_count() {
                parts.extend(row.get::<Option<String>>(index)?);
            }
            let parts = parts.iter().map(String::as_str).collect::<Vec<_>>();
            folded.push((id, search_text(&parts)));
        }
        for (id, text) in folded {
            conn.execute(
                &format!("UPDATE {table} SET search_text = ?2 WHERE id = ?1"),
                params![id, text],
            )
            .await?;
        }
    }
    Ok(())
}

async fn has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let mut rows = conn
        .query(&format!("PRAGMA table_info({table})"), params![])
        .await?;
    while let Some(row) = rows.next().await? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

// Column order must match row_to_video.
const VIDEO_COLUMNS: &str = r#"
    v.id, v.name, v.url, v.video_id, v.thumbnail, v.description, v.notes,
    v.status, v.difficulty, v.priority, v.progress, v.date_added, v.date_watched,
    v.created_at, v.updated_at
"#;

// Column order must match row_to_tag.
const TAG_COLUMNS: &str =
    "t.id, t.name, t.color, t.description, t.category, t.created_at, t.updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub watched: u64,
    pub learning: u64,
    pub later: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStats {
    pub total: u64,
    pub by_status: StatusCounts,
    pub average_progress: f64,
    pub by_difficulty: BTreeMap<String, u64>,
    pub by_priority: BTreeMap<String, u64>,
    pub recent_videos: Vec<Video>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagUsage {
    pub name: String,
    pub color: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagStats {
    pub total: u64,
    pub by_category: BTreeMap<String, u64>,
    pub most_used: Vec<TagUsage>,
    pub unused: Vec<Tag>,
}

/// Shared handle over the catalog database. Cloning is cheap and every clone
/// talks to the same connection.
#[derive(Clone)]
pub struct CatalogStore {
    conn: Connection,
    // Every statement shares one connection, so nothing may run while another
    // caller holds a transaction open on it.
    conn_lock: Arc<Mutex<()>>,
}

impl CatalogStore {
    /// Opens (and if necessary creates) the database file and provisions the
    /// schema.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating catalog directory {}", parent.display()))?;
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .with_context(|| format!("opening catalog DB {}", path.display()))?;
        let conn = db.connect()?;
        configure_connection(&conn).await?;
        ensure_schema(&conn).await?;
        Ok(Self {
            conn,
            conn_lock: Arc::new(Mutex::new(())),
        })
    }

    pub async fn insert_tag(&self, tag: &Tag) -> CatalogResult<()> {
        let _guard = self.conn_lock.lock().await;
        let result = self
            .conn
            .execute(
                r#"
                INSERT INTO tags (
                    id, name, color, description, category, search_text, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    tag.id.as_str(),
                    tag.name.as_str(),
                    tag.color.as_str(),
                    tag.description.as_deref(),
                    tag.category.as_str(),
                    tag_search_text(tag),
                    timestamp(&tag.created_at),
                    timestamp(&tag.updated_at),
                ],
            )
            .await;
        map_write(result, "tag already exists")
    }

    pub async fn update_tag(&self, tag: &Tag) -> CatalogResult<()> {
        let _guard = self.conn_lock.lock().await;
        let result = self
            .conn
            .execute(
                r#"
                UPDATE tags
                SET name = ?2, color = ?3, description = ?4, category = ?5,
                    search_text = ?6, updated_at = ?7
                WHERE id = ?1
                "#,
                params![
                    tag.id.as_str(),
                    tag.name.as_str(),
                    tag.color.as_str(),
                    tag.description.as_deref(),
                    tag.category.as_str(),
                    tag_search_text(tag),
                    timestamp(&tag.updated_at),
                ],
            )
            .await;
        map_write(result, "tag already exists")
    }

    pub async fn get_tag(&self, id: &str) -> CatalogResult<Option<Tag>> {
        let _guard = self.conn_lock.lock().await;
        let mut rows = self
            .conn
            .query(&format!("SELECT {TAG_COLUMNS} FROM tags t WHERE t.id = ?1"), [id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_tag(&row)?)),
            None => Ok(None),
        }
    }

    /// Returns one page of tags ordered by name plus the total match count.
    pub async fn list_tags(&self, query: &TagQuery) -> CatalogResult<(Vec<Tag>, u64)> {
        let mut clauses = Vec::new();
        let mut values = Vec::new();
        if let Some(category) = query.category {
            clauses.push("t.category = ?".to_string());
            values.push(Value::Text(category.as_str().to_string()));
        }
        if let Some(text) = query.text.as_deref() {
            clauses.push("instr(t.search_text, ?) > 0".to_string());
            values.push(Value::Text(fold(text)));
        }
        let where_sql = where_clause(&clauses);

        let _guard = self.conn_lock.lock().await;
        let total = self
            .count(&format!("SELECT COUNT(*) FROM tags t {where_sql}"), values.clone())
            .await?;

        values.push(page_limit(&query.page));
        values.push(page_offset(&query.page));
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {TAG_COLUMNS} FROM tags t {where_sql} ORDER BY t.name ASC LIMIT ? OFFSET ?"
                ),
                Params::Positional(values),
            )
            .await?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next().await? {
            tags.push(row_to_tag(&row)?);
        }
        Ok((tags, total))
    }

    pub async fn delete_tag(&self, id: &str) -> CatalogResult<bool> {
        let _guard = self.conn_lock.lock().await;
        let deleted = self
            .conn
            .execute("DELETE FROM tags WHERE id = ?1", [id])
            .await?;
        Ok(deleted > 0)
    }

    pub async fn count_videos_with_tag(&self, tag_id: &str) -> CatalogResult<u64> {
        let _guard = self.conn_lock.lock().await;
        self.count(
            "SELECT COUNT(*) FROM video_tags WHERE tag_id = ?",
            vec![Value::Text(tag_id.to_string())],
        )
        .await
    }

    /// Maps tag names to stored ids. Names without a stored tag are dropped;
    /// the caller decides what an empty result means.
    pub async fn resolve_tag_ids(&self, names: &[String]) -> CatalogResult<Vec<String>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let values = names
            .iter()
            .map(|name| Value::Text(name.clone()))
            .collect::<Vec<_>>();
        let _guard = self.conn_lock.lock().await;
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT id FROM tags WHERE name IN ({}) ORDER BY name",
                    placeholders(names.len())
                ),
                Params::Positional(values),
            )
            .await?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(row.get::<String>(0)?);
        }
        Ok(ids)
    }

    /// Inserts a video and its tag references. A duplicate `video_id` is
    /// reported as a conflict and leaves nothing behind.
    pub async fn insert_video(&self, video: &Video, tag_ids: &[String]) -> CatalogResult<()> {
        let _guard = self.conn_lock.lock().await;
        let tx = self.conn.transaction().await?;
        let result = tx
            .execute(
                r#"
                INSERT INTO videos (
                    id, name, url, video_id, thumbnail, description, notes,
                    status, difficulty, priority, progress, date_added, date_watched,
                    search_text, created_at, updated_at
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16
                )
                "#,
                params![
                    video.id.as_str(),
                    video.name.as_str(),
                    video.url.as_str(),
                    video.video_id.as_deref(),
                    video.thumbnail.as_deref(),
                    video.description.as_deref(),
                    video.notes.as_deref(),
                    video.status.as_str(),
                    video.difficulty.as_str(),
                    i64::from(video.priority),
                    i64::from(video.progress),
                    timestamp(&video.date_added),
                    video.date_watched.as_ref().map(timestamp),
                    video_search_text(video),
                    timestamp(&video.created_at),
                    timestamp(&video.updated_at),
                ],
            )
            .await;
        if let Err(err) = map_write(result, "video already exists") {
            tx.rollback().await?;
            return Err(err);
        }
        for tag_id in tag_ids {
            tx.execute(
                "INSERT OR IGNORE INTO video_tags (video_id, tag_id) VALUES (?1, ?2)",
                params![video.id.as_str(), tag_id.as_str()],
            )
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Rewrites every mutable column of a video. When `tag_ids` is given the
    /// stored tag set is replaced by it, not merged.
    pub async fn update_video(
        &self,
        video: &Video,
        tag_ids: Option<&[String]>,
    ) -> CatalogResult<()> {
        let _guard = self.conn_lock.lock().await;
        let tx = self.conn.transaction().await?;
        let result = tx
            .execute(
                r#"
                UPDATE videos SET
                    name = ?2, url = ?3, video_id = ?4, thumbnail = ?5,
                    description = ?6, notes = ?7, status = ?8, difficulty = ?9,
                    priority = ?10, progress = ?11, date_watched = ?12, search_text = ?13,
                    updated_at = ?14
                WHERE id = ?1
                "#,
                params![
                    video.id.as_str(),
                    video.name.as_str(),
                    video.url.as_str(),
                    video.video_id.as_deref(),
                    video.thumbnail.as_deref(),
                    video.description.as_deref(),
                    video.notes.as_deref(),
                    video.status.as_str(),
                    video.difficulty.as_str(),
                    i64::from(video.priority),
                    i64::from(video.progress),
                    video.date_watched.as_ref().map(timestamp),
                    video_search_text(video),
                    timestamp(&video.updated_at),
                ],
            )
            .await;
        if let Err(err) = map_write(result, "video already exists") {
            tx.rollback().await?;
            return Err(err);
        }
        if let Some(tag_ids) = tag_ids {
            tx.execute(
                "DELETE FROM video_tags WHERE video_id = ?1",
                [video.id.as_str()],
            )
            .await?;
            for tag_id in tag_ids {
                tx.execute(
                    "INSERT OR IGNORE INTO video_tags (video_id, tag_id) VALUES (?1, ?2)",
                    params![video.id.as_str(), tag_id.as_str()],
                )
                .await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }

    /// Persists a lazily derived id. Repeating the same write is harmless.
    pub async fn backfill_video_id(
        &self,
        id: &str,
        video_id: &str,
        thumbnail: &str,
    ) -> CatalogResult<()> {
        let _guard = self.conn_lock.lock().await;
        let result = self
            .conn
            .execute(
                "UPDATE videos SET video_id = ?2, thumbnail = ?3 WHERE id = ?1",
                params![id, video_id, thumbnail],
            )
            .await;
        map_write(result, "video already exists")
    }

    pub async fn get_video(&self, id: &str) -> CatalogResult<Option<Video>> {
        let _guard = self.conn_lock.lock().await;
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {VIDEO_COLUMNS} FROM videos v WHERE v.id = ?1"),
                [id],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let mut videos = vec![row_to_video(&row)?];
        self.attach_tags(&mut videos).await?;
        Ok(videos.pop())
    }

    /// Runs a listing query and returns the requested page plus the total
    /// number of matches. Equal sort keys fall back to insertion order in the
    /// same direction.
    pub async fn query_videos(
        &self,
        predicate: &VideoPredicate,
        sort: &Sort,
        page: &PageRequest,
    ) -> CatalogResult<(Vec<Video>, u64)> {
        let _guard = self.conn_lock.lock().await;
        self.fetch_videos(predicate, sort, page).await
    }

    // Callers hold conn_lock.
    async fn fetch_videos(
        &self,
        predicate: &VideoPredicate,
        sort: &Sort,
        page: &PageRequest,
    ) -> CatalogResult<(Vec<Video>, u64)> {
        let (where_sql, mut values) = compile_predicate(predicate);

        let total = self
            .count(
                &format!("SELECT COUNT(*) FROM videos v {where_sql}"),
                values.clone(),
            )
            .await?;

        let direction = match sort.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let column = sort_column(sort.field);
        values.push(page_limit(page));
        values.push(page_offset(page));
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {VIDEO_COLUMNS} FROM videos v {where_sql} \
                     ORDER BY {column} {direction}, v.rowid {direction} LIMIT ? OFFSET ?"
                ),
                Params::Positional(values),
            )
            .await?;
        let mut videos = Vec::new();
        while let Some(row) = rows.next().await? {
            videos.push(row_to_video(&row)?);
        }
        self.attach_tags(&mut videos).await?;
        Ok((videos, total))
    }

    pub async fn delete_video(&self, id: &str) -> CatalogResult<bool> {
        let _guard = self.conn_lock.lock().await;
        let deleted = self
            .conn
            .execute("DELETE FROM videos WHERE id = ?1", [id])
            .await?;
        Ok(deleted > 0)
    }

    pub async fn video_stats(&self, recent: &PageRequest) -> CatalogResult<VideoStats> {
        let _guard = self.conn_lock.lock().await;
        let total = self.count("SELECT COUNT(*) FROM videos", Vec::new()).await?;

        let mut by_status = StatusCounts {
            watched: 0,
            learning: 0,
            later: 0,
        };
        for (status, count) in self
            .grouped_counts("SELECT status, COUNT(*) FROM videos GROUP BY status")
            .await?
        {
            match VideoStatus::parse(&status) {
                Some(VideoStatus::Watched) => by_status.watched = count,
                Some(VideoStatus::Learning) => by_status.learning = count,
                Some(VideoStatus::Later) => by_status.later = count,
                None => return Err(anyhow!("unknown stored status {status}").into()),
            }
        }

        let mut rows = self
            .conn
            .query("SELECT COALESCE(AVG(progress), 0.0) FROM videos", params![])
            .await?;
        let average_progress = match rows.next().await? {
            Some(row) => row.get::<f64>(0)?,
            None => 0.0,
        };

        let by_difficulty = self
            .grouped_counts("SELECT difficulty, COUNT(*) FROM videos GROUP BY difficulty")
            .await?
            .into_iter()
            .collect();
        let by_priority = self
            .grouped_counts(
                "SELECT CAST(priority AS TEXT), COUNT(*) FROM videos GROUP BY priority",
            )
            .await?
            .into_iter()
            .collect();

        let newest_first = Sort {
            field: SortField::DateAdded,
            order: SortOrder::Desc,
        };
        let (recent_videos, _) = self
            .fetch_videos(&VideoPredicate::default(), &newest_first, recent)
            .await?;

        Ok(VideoStats {
            total,
            by_status,
            average_progress: (average_progress * 100.0).round() / 100.0,
            by_difficulty,
            by_priority,
            recent_videos,
        })
    }

    pub async fn tag_stats(&self, most_used_limit: u32) -> CatalogResult<TagStats> {
        let _guard = self.conn_lock.lock().await;
        let total = self.count("SELECT COUNT(*) FROM tags", Vec::new()).await?;
        let by_category = self
            .grouped_counts("SELECT category, COUNT(*) FROM tags GROUP BY category")
            .await?
            .into_iter()
            .collect();

        let mut rows = self
            .conn
            .query(
                r#"
                SELECT t.name, t.color, COUNT(vt.video_id) AS uses
                FROM tags t
                JOIN video_tags vt ON vt.tag_id = t.id
                GROUP BY t.id
                ORDER BY uses DESC, t.name ASC
                LIMIT ?1
                "#,
                [i64::from(most_used_limit)],
            )
            .await?;
        let mut most_used = Vec::new();
        while let Some(row) = rows.next().await? {
            most_used.push(TagUsage {
                name: row.get(0)?,
                color: row.get(1)?,
                count: non_negative(row.get::<i64>(2)?),
            });
        }

        let mut rows = self
            .conn
            .query(
                &format!(
                    r#"
                    SELECT {TAG_COLUMNS} FROM tags t
                    WHERE NOT EXISTS (SELECT 1 FROM video_tags vt WHERE vt.tag_id = t.id)
                    ORDER BY t.name ASC
                    "#
                ),
                params![],
            )
            .await?;
        let mut unused = Vec::new();
        while let Some(row) = rows.next().await? {
            unused.push(row_to_tag(&row)?);
        }

        Ok(TagStats {
            total,
            by_category,
            most_used,
            unused,
        })
    }

    /// Loads tag summaries for every video in `videos`. References to tags
    /// that no longer exist are skipped by the join.
    async fn attach_tags(&self, videos: &mut [Video]) -> CatalogResult<()> {
        if videos.is_empty() {
            return Ok(());
        }
        let values = videos
            .iter()
            .map(|video| Value::Text(video.id.clone()))
            .collect::<Vec<_>>();
        let mut rows = self
            .conn
            .query(
                &format!(
                    r#"
                    SELECT vt.video_id, t.id, t.name, t.color
                    FROM video_tags vt
                    JOIN tags t ON t.id = vt.tag_id
                    WHERE vt.video_id IN ({})
                    ORDER BY t.name ASC
                    "#,
                    placeholders(videos.len())
                ),
                Params::Positional(values),
            )
            .await?;

        let mut by_video: HashMap<String, Vec<TagSummary>> = HashMap::new();
        while let Some(row) = rows.next().await? {
            let video_id: String = row.get(0)?;
            by_video.entry(video_id).or_default().push(TagSummary {
                id: row.get(1)?,
                name: row.get(2)?,
                color: row.get(3)?,
            });
        }
        for video in videos.iter_mut() {
            video.collection_tags = by_video.remove(&video.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn count(&self, sql: &str, values: Vec<Value>) -> CatalogResult<u64> {
        let mut rows = self.conn.query(sql, Params::Positional(values)).await?;
        let row = rows.next().await?.context("missing COUNT row")?;
        Ok(non_negative(row.get::<i64>(0)?))
    }

    async fn grouped_counts(&self, sql: &str) -> CatalogResult<Vec<(String, u64)>> {
        let mut rows = self.conn.query(sql, params![]).await?;
        let mut counts = Vec::new();
        while let Some(row) = rows.next().await? {
            counts.push((row.get::<String>(0)?, non_negative(row.get::<i64>(1)?)));
        }
        Ok(counts)
    }
}

/// Builds the WHERE clause for a predicate together with its positional
/// arguments.
fn compile_predicate(predicate: &VideoPredicate) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if let Some(status) = predicate.status {
        clauses.push("v.status = ?".to_string());
        values.push(Value::Text(status.as_str().to_string()));
    }
    if let Some(difficulty) = predicate.difficulty {
        clauses.push("v.difficulty = ?".to_string());
        values.push(Value::Text(difficulty.as_str().to_string()));
    }
    if let Some(priority) = predicate.priority {
        clauses.push("v.priority = ?".to_string());
        values.push(Value::Integer(i64::from(priority)));
    }
    match predicate.tag_ids.as_deref() {
        None => {}
        Some([]) => clauses.push("0".to_string()),
        Some(ids) => {
            clauses.push(format!(
                "v.id IN (SELECT vt.video_id FROM video_tags vt WHERE vt.tag_id IN ({}))",
                placeholders(ids.len())
            ));
            values.extend(ids.iter().map(|id| Value::Text(id.clone())));
        }
    }
    if let Some(text) = predicate.text.as_deref() {
        clauses.push("instr(v.search_text, ?) > 0".to_string());
        values.push(Value::Text(fold(text)));
    }

    (where_clause(&clauses), values)
}

fn where_clause(clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    }
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::Name => "v.name",
        SortField::DateAdded => "v.date_added",
        SortField::Priority => "v.priority",
        SortField::Status => "v.status",
        SortField::Difficulty => "v.difficulty",
        SortField::Progress => "v.progress",
    }
}

/// Unicode lowercase, applied to stored search text and needles alike.
fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Folded searchable fields joined by newlines, so a needle typed on one line
/// never matches across two fields.
fn search_text(fields: &[&str]) -> String {
    fold(&fields.join("\n"))
}

fn video_search_text(video: &Video) -> String {
    let mut fields = vec![video.name.as_str()];
    fields.extend(video.description.as_deref());
    fields.extend(video.notes.as_deref());
    search_text(&fields)
}

fn tag_search_text(tag: &Tag) -> String {
    let mut fields = vec![tag.name.as_str()];
    fields.extend(tag.description.as_deref());
    search_text(&fields)
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn page_limit(page: &PageRequest) -> Value {
    Value::Integer(i64::from(page.limit))
}

fn page_offset(page: &PageRequest) -> Value {
    Value::Integer(i64::try_from(page.offset()).unwrap_or(i64::MAX))
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn map_write(result: Result<u64, libsql::Error>, conflict: &str) -> CatalogResult<()> {
    match result {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => Err(CatalogError::conflict(conflict)),
        Err(err) => Err(err.into()),
    }
}

/// Timestamps are stored as fixed-width RFC 3339 strings so that text order
/// equals chronological order.
fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("parsing stored timestamp {raw}"))?
        .with_timezone(&Utc))
}

fn row_to_video(row: &Row) -> anyhow::Result<Video> {
    let id: String = row.get(0)?;
    let status: String = row.get(7)?;
    let difficulty: String = row.get(8)?;
    let date_added: String = row.get(11)?;
    let date_watched: Option<String> = row.get(12)?;
    let created_at: String = row.get(13)?;
    let updated_at: String = row.get(14)?;
    let video_id: Option<String> = row.get(3)?;

    Ok(Video {
        name: row.get(1)?,
        url: row.get(2)?,
        embed_url: video_id.as_deref().map(youtube::embed_url),
        video_id,
        thumbnail: row.get(4)?,
        description: row.get(5)?,
        notes: row.get(6)?,
        status: VideoStatus::parse(&status)
            .ok_or_else(|| anyhow!("unknown status {status} stored for video {id}"))?,
        difficulty: Difficulty::parse(&difficulty)
            .ok_or_else(|| anyhow!("unknown difficulty {difficulty} stored for video {id}"))?,
        priority: u8::try_from(row.get::<i64>(9)?).context("stored priority out of range")?,
        progress: u8::try_from(row.get::<i64>(10)?).context("stored progress out of range")?,
        date_added: parse_timestamp(&date_added)?,
        date_watched: date_watched.as_deref().map(parse_timestamp).transpose()?,
        collection_tags: Vec::new(),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
        id,
    })
}

fn row_to_tag(row: &Row) -> anyhow::Result<Tag> {
    let id: String = row.get(0)?;
    let category: String = row.get(4)?;
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;
    Ok(Tag {
        name: row.get(1)?,
        color: row.get(2)?,
        description: row.get(3)?,
        category: TagCategory::parse(&category)
            .ok_or_else(|| anyhow!("unknown category {category} stored for tag {id}"))?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::path::PathBuf;
    use tempfile::tempdir;

    async fn create_store() -> anyhow::Result<(tempfile::TempDir, CatalogStore, PathBuf)> {
        let dir = tempdir()?;
        let path = dir.path().join("catalog/test.db");
        let store = CatalogStore::open(&path).await?;
        Ok((dir, store, path))
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn sample_tag(id: &str, name: &str) -> Tag {
        Tag {
            id: id.into(),
            name: name.into(),
            color: "#3B82F6".into(),
            description: None,
            category: TagCategory::Other,
            created_at: base_time(),
            updated_at: base_time(),
        }
    }

    fn sample_video(id: &str, youtube_id: &str, minutes: i64) -> Video {
        let added = base_time() + Duration::minutes(minutes);
        Video {
            id: id.into(),
            name: format!("Video {id}"),
            url: format!("https://youtu.be/{youtube_id}"),
            video_id: Some(youtube_id.into()),
            thumbnail: Some(youtube::thumbnail_url(
                youtube_id,
                youtube::ThumbnailQuality::Medium,
            )),
            embed_url: None,
            description: None,
            notes: None,
            status: VideoStatus::Learning,
            difficulty: Difficulty::Beginner,
            priority: 3,
            progress: 0,
            date_added: added,
            date_watched: None,
            collection_tags: vec![],
            created_at: added,
            updated_at: added,
        }
    }

    fn first_page(limit: u32) -> PageRequest {
        PageRequest { page: 1, limit }
    }

    async fn ids(store: &CatalogStore, predicate: &VideoPredicate, sort: Sort) -> Vec<String> {
        let (videos, _) = store
            .query_videos(predicate, &sort, &first_page(100))
            .await
            .unwrap();
        videos.into_iter().map(|video| video.id).collect()
    }

    #[tokio::test]
    async fn opens_store_and_creates_schema() -> anyhow::Result<()> {
        let (_temp, _store, path) = create_store().await?;
        assert!(path.exists(), "database file should be created");

        let db = Builder::new_local(&path).build().await?;
        let conn = db.connect()?;
        for table in ["videos", "tags", "video_tags"] {
            let mut rows = conn
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                )
                .await?;
            let exists: Option<String> = rows
                .next()
                .await?
                .map(|row| row.get::<String>(0))
                .transpose()?;
            assert_eq!(exists.as_deref(), Some(table));
        }
        Ok(())
    }

    #[tokio::test]
    async fn video_roundtrip_populates_tags() -> anyhow::Result<()> {
        let (_temp, store, _path) = create_store().await?;
        store.insert_tag(&sample_tag("t-react", "react")).await?;
        store.insert_tag(&sample_tag("t-rust", "rust")).await?;

        let video = sample_video("v1", "dQw4w9WgXcQ", 0);
        store
            .insert_video(&video, &["t-rust".into(), "t-react".into()])
            .await?;

        let fetched = store.get_video("v1").await?.expect("video stored");
        assert_eq!(fetched.name, video.name);
        assert_eq!(fetched.date_added, video.date_added);
        assert_eq!(
            fetched.embed_url.as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
        let names: Vec<_> = fetched.collection_tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["react", "rust"]);
        assert!(store.get_video("ghost").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_video_id_is_a_conflict() -> anyhow::Result<()> {
        let (_temp, store, _path) = create_store().await?;
        store
            .insert_video(&sample_video("v1", "dQw4w9WgXcQ", 0), &[])
            .await?;
        let err = store
            .insert_video(&sample_video("v2", "dQw4w9WgXcQ", 1), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Conflict(_)));
        assert!(store.get_video("v2").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn missing_video_ids_do_not_collide() -> anyhow::Result<()> {
        let (_temp, store, _path) = create_store().await?;
        let mut first = sample_video("v1", "aaaaaaaaaaa", 0);
        first.video_id = None;
        let mut second = sample_video("v2", "bbbbbbbbbbb", 1);
        second.video_id = None;
        store.insert_video(&first, &[]).await?;
        store.insert_video(&second, &[]).await?;
        let (_, total) = store
            .query_videos(&VideoPredicate::default(), &Sort::default(), &first_page(10))
            .await?;
        assert_eq!(total, 2);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_tag_name_is_a_conflict() -> anyhow::Result<()> {
        let (_temp, store, _path) = create_store().await?;
        store.insert_tag(&sample_tag("t1", "react")).await?;
        let err = store
            .insert_tag(&sample_tag("t2", "react"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Conflict(_)));

        store.insert_tag(&sample_tag("t3", "vue")).await?;
        let mut renamed = sample_tag("t3", "react");
        renamed.updated_at = base_time() + Duration::hours(1);
        let err = store.update_tag(&renamed).await.unwrap_err();
        assert!(matches!(err, CatalogError::Conflict(_)));
        Ok(())
    }

    #[tokio::test]
    async fn update_replaces_the_tag_set() -> anyhow::Result<()> {
        let (_temp, store, _path) = create_store().await?;
        store.insert_tag(&sample_tag("t1", "react")).await?;
        store.insert_tag(&sample_tag("t2", "rust")).await?;
        let video = sample_video("v1", "dQw4w9WgXcQ", 0);
        store.insert_video(&video, &["t1".into()]).await?;

        store.update_video(&video, Some(&["t2".into()])).await?;
        let fetched = store.get_video("v1").await?.unwrap();
        assert_eq!(fetched.tag_ids(), vec!["t2".to_string()]);

        store.update_video(&video, None).await?;
        assert_eq!(store.get_video("v1").await?.unwrap().tag_ids(), vec!["t2"]);

        store.update_video(&video, Some(&[])).await?;
        assert!(store.get_video("v1").await?.unwrap().collection_tags.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn resolve_drops_unknown_names() -> anyhow::Result<()> {
        let (_temp, store, _path) = create_store().await?;
        store.insert_tag(&sample_tag("t1", "react")).await?;
        let ids = store
            .resolve_tag_ids(&["react".into(), "ghost".into()])
            .await?;
        assert_eq!(ids, vec!["t1"]);
        assert!(store.resolve_tag_ids(&[]).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn predicate_filters_status_and_tags() -> anyhow::Result<()> {
        let (_temp, store, _path) = create_store().await?;
        store.insert_tag(&sample_tag("tx", "x")).await?;
        store.insert_tag(&sample_tag("ty", "y")).await?;
        store.insert_tag(&sample_tag("tz", "z")).await?;

        let mut watched = sample_video("v1", "aaaaaaaaaaa", 0);
        watched.status = VideoStatus::Watched;
        store.insert_video(&watched, &["tx".into()]).await?;
        store
            .insert_video(&sample_video("v2", "bbbbbbbbbbb", 1), &["ty".into()])
            .await?;
        store
            .insert_video(&sample_video("v3", "ccccccccccc", 2), &["tz".into()])
            .await?;

        let all = ids(&store, &VideoPredicate::default(), Sort::default()).await;
        assert_eq!(all, vec!["v3", "v2", "v1"]);

        let by_status = VideoPredicate {
            status: Some(VideoStatus::Watched),
            ..VideoPredicate::default()
        };
        assert_eq!(ids(&store, &by_status, Sort::default()).await, vec!["v1"]);

        let any_of = VideoPredicate {
            tag_ids: Some(vec!["tx".into(), "ty".into()]),
            ..VideoPredicate::default()
        };
        assert_eq!(ids(&store, &any_of, Sort::default()).await, vec!["v2", "v1"]);

        let nothing = VideoPredicate {
            tag_ids: Some(vec![]),
            ..VideoPredicate::default()
        };
        assert!(ids(&store, &nothing, Sort::default()).await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn text_search_is_case_insensitive_across_fields() -> anyhow::Result<()> {
        let (_temp, store, _path) = create_store().await?;
        let mut by_name = sample_video("v1", "aaaaaaaaaaa", 0);
        by_name.name = "Learning RUST".into();
        let mut by_notes = sample_video("v2", "bbbbbbbbbbb", 1);
        by_notes.notes = Some("rewatch the rust part".into());
        let mut literal = sample_video("v3", "ccccccccccc", 2);
        literal.description = Some("100% coverage".into());
        for video in [&by_name, &by_notes, &literal] {
            store.insert_video(video, &[]).await?;
        }

        let rust = VideoPredicate {
            text: Some("Rust".into()),
            ..VideoPredicate::default()
        };
        assert_eq!(ids(&store, &rust, Sort::default()).await, vec!["v2", "v1"]);

        let percent = VideoPredicate {
            text: Some("0%".into()),
            ..VideoPredicate::default()
        };
        assert_eq!(ids(&store, &percent, Sort::default()).await, vec!["v3"]);
        Ok(())
    }

    #[tokio::test]
    async fn text_search_folds_non_ascii_letters() -> anyhow::Result<()> {
        let (_temp, store, _path) = create_store().await?;
        let mut ethics = sample_video("v1", "aaaaaaaaaaa", 0);
        ethics.name = "Introdução à Ética".into();
        store.insert_video(&ethics, &[]).await?;
        let mut other = sample_video("v2", "bbbbbbbbbbb", 1);
        other.description = Some("Straße und Verkehr".into());
        store.insert_video(&other, &[]).await?;

        let upper = VideoPredicate {
            text: Some("ÉTICA".into()),
            ..VideoPredicate::default()
        };
        assert_eq!(ids(&store, &upper, Sort::default()).await, vec!["v1"]);

        let accented = VideoPredicate {
            text: Some("INTRODUÇÃO".into()),
            ..VideoPredicate::default()
        };
        assert_eq!(ids(&store, &accented, Sort::default()).await, vec!["v1"]);

        let sharp_s = VideoPredicate {
            text: Some("STRAßE".into()),
            ..VideoPredicate::default()
        };
        assert_eq!(ids(&store, &sharp_s, Sort::default()).await, vec!["v2"]);

        // An update refreshes the searchable text.
        ethics.name = "Moral philosophy".into();
        store.update_video(&ethics, None).await?;
        assert!(ids(&store, &upper, Sort::default()).await.is_empty());

        let mut tag = sample_tag("t1", "ética");
        tag.description = Some("Filosofía MORAL".into());
        store.insert_tag(&tag).await?;
        let (tags, total) = store
            .list_tags(&TagQuery {
                category: None,
                text: Some("FILOSOFÍA".into()),
                page: first_page(10),
            })
            .await?;
        assert_eq!(total, 1);
        assert_eq!(tags[0].name, "ética");
        Ok(())
    }

    #[tokio::test]
    async fn legacy_database_gains_search_text() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("legacy.db");
        {
            let db = Builder::new_local(&path).build().await?;
            let conn = db.connect()?;
            conn.execute_batch(
                r#"
                CREATE TABLE tags (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    color TEXT NOT NULL DEFAULT '#3B82F6',
                    description TEXT,
                    category TEXT NOT NULL DEFAULT 'other',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE TABLE videos (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    url TEXT NOT NULL,
                    video_id TEXT,
                    thumbnail TEXT,
                    description TEXT,
                    notes TEXT,
                    status TEXT NOT NULL DEFAULT 'learning',
                    difficulty TEXT NOT NULL DEFAULT 'beginner',
                    priority INTEGER NOT NULL DEFAULT 3,
                    progress INTEGER NOT NULL DEFAULT 0,
                    date_added TEXT NOT NULL,
                    date_watched TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                INSERT INTO videos (id, name, url, notes, date_added, created_at, updated_at)
                VALUES ('v1', 'Ética', 'https://youtu.be/aaaaaaaaaaa', NULL,
                        '2024-01-01T00:00:00.000Z', '2024-01-01T00:00:00.000Z',
                        '2024-01-01T00:00:00.000Z');
                INSERT INTO tags (id, name, description, created_at, updated_at)
                VALUES ('t1', 'rust', 'Systems', '2024-01-01T00:00:00.000Z',
                        '2024-01-01T00:00:00.000Z');
                "#,
            )
            .await?;
        }

        let store = CatalogStore::open(&path).await?;
        let upper = VideoPredicate {
            text: Some("ÉTICA".into()),
            ..VideoPredicate::default()
        };
        assert_eq!(ids(&store, &upper, Sort::default()).await, vec!["v1"]);
        let (tags, _) = store
            .list_tags(&TagQuery {
                category: None,
                text: Some("systems".into()),
                page: first_page(10),
            })
            .await?;
        assert_eq!(tags.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn listing_never_sees_a_rolled_back_insert() -> anyhow::Result<()> {
        let (_temp, store, _path) = create_store().await?;
        store.insert_tag(&sample_tag("t1", "react")).await?;
        store
            .insert_video(&sample_video("v1", "dQw4w9WgXcQ", 0), &["t1".into()])
            .await?;

        for attempt in 0..5 {
            let duplicate = sample_video(&format!("dup{attempt}"), "dQw4w9WgXcQ", 1);
            let tags = ["t1".to_string()];
            let predicate = VideoPredicate::default();
            let sort = Sort::default();
            let page = first_page(10);
            let (inserted, listed) = tokio::join!(
                store.insert_video(&duplicate, &tags),
                store.query_videos(&predicate, &sort, &page),
            );
            assert!(matches!(inserted, Err(CatalogError::Conflict(_))));
            let (videos, total) = listed?;
            assert_eq!(total, 1);
            assert_eq!(videos[0].id, "v1");
        }
        assert_eq!(store.count_videos_with_tag("t1").await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn sort_ties_follow_insertion_order() -> anyhow::Result<()> {
        let (_temp, store, _path) = create_store().await?;
        for (index, id) in ["a", "b", "c"].into_iter().enumerate() {
            let mut video = sample_video(id, &format!("{id}{}", "x".repeat(10)), index as i64);
            video.priority = 2;
            store.insert_video(&video, &[]).await?;
        }
        let asc = Sort {
            field: SortField::Priority,
            order: SortOrder::Asc,
        };
        assert_eq!(
            ids(&store, &VideoPredicate::default(), asc).await,
            vec!["a", "b", "c"]
        );
        let desc = Sort {
            field: SortField::Priority,
            order: SortOrder::Desc,
        };
        assert_eq!(
            ids(&store, &VideoPredicate::default(), desc).await,
            vec!["c", "b", "a"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn pages_and_totals() -> anyhow::Result<()> {
        let (_temp, store, _path) = create_store().await?;
        for index in 0..12 {
            let youtube_id = format!("{index:0>11}");
            store
                .insert_video(&sample_video(&format!("v{index}"), &youtube_id, index), &[])
                .await?;
        }
        let (page, total) = store
            .query_videos(
                &VideoPredicate::default(),
                &Sort::default(),
                &PageRequest { page: 2, limit: 5 },
            )
            .await?;
        assert_eq!(total, 12);
        let ids: Vec<_> = page.into_iter().map(|video| video.id).collect();
        assert_eq!(ids, vec!["v6", "v5", "v4", "v3", "v2"]);
        Ok(())
    }

    #[tokio::test]
    async fn deleting_a_video_drops_its_references_only() -> anyhow::Result<()> {
        let (_temp, store, _path) = create_store().await?;
        store.insert_tag(&sample_tag("t1", "react")).await?;
        store
            .insert_video(&sample_video("v1", "dQw4w9WgXcQ", 0), &["t1".into()])
            .await?;
        assert_eq!(store.count_videos_with_tag("t1").await?, 1);

        assert!(store.delete_video("v1").await?);
        assert!(!store.delete_video("v1").await?);
        assert_eq!(store.count_videos_with_tag("t1").await?, 0);
        assert!(store.get_tag("t1").await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn tag_listing_filters_and_pages() -> anyhow::Result<()> {
        let (_temp, store, _path) = create_store().await?;
        let mut rust = sample_tag("t1", "rust");
        rust.category = TagCategory::Language;
        let mut go = sample_tag("t2", "go");
        go.category = TagCategory::Language;
        let mut react = sample_tag("t3", "react");
        react.description = Some("UI library".into());
        for tag in [&rust, &go, &react] {
            store.insert_tag(tag).await?;
        }

        let (tags, total) = store
            .list_tags(&TagQuery {
                category: Some(TagCategory::Language),
                text: None,
                page: first_page(1),
            })
            .await?;
        assert_eq!(total, 2);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "go");

        let (tags, _) = store
            .list_tags(&TagQuery {
                category: None,
                text: Some("ui".into()),
                page: first_page(10),
            })
            .await?;
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "react");
        Ok(())
    }

    #[tokio::test]
    async fn stats_summarize_videos_and_tags() -> anyhow::Result<()> {
        let (_temp, store, _path) = create_store().await?;
        store.insert_tag(&sample_tag("t1", "react")).await?;
        store.insert_tag(&sample_tag("t2", "rust")).await?;
        store.insert_tag(&sample_tag("t3", "unused")).await?;

        let mut done = sample_video("v1", "aaaaaaaaaaa", 0);
        done.status = VideoStatus::Watched;
        done.progress = 100;
        done.priority = 5;
        store
            .insert_video(&done, &["t1".into(), "t2".into()])
            .await?;
        let mut half = sample_video("v2", "bbbbbbbbbbb", 1);
        half.progress = 50;
        half.difficulty = Difficulty::Advanced;
        store.insert_video(&half, &["t1".into()]).await?;

        let stats = store.video_stats(&first_page(5)).await?;
        assert_eq!(stats.total, 2);
        assert_eq!(
            stats.by_status,
            StatusCounts {
                watched: 1,
                learning: 1,
                later: 0
            }
        );
        assert_eq!(stats.average_progress, 75.0);
        assert_eq!(stats.by_difficulty.get("advanced"), Some(&1));
        assert_eq!(stats.by_priority.get("5"), Some(&1));
        assert_eq!(stats.recent_videos[0].id, "v2");

        let tags = store.tag_stats(10).await?;
        assert_eq!(tags.total, 3);
        assert_eq!(tags.by_category.get("other"), Some(&3));
        assert_eq!(tags.most_used[0].name, "react");
        assert_eq!(tags.most_used[0].count, 2);
        assert_eq!(tags.unused.len(), 1);
        assert_eq!(tags.unused[0].name, "unused");
        Ok(())
    }

    #[test]
    fn search_text_folds_unicode_and_separates_fields() {
        let mut video = sample_video("v1", "aaaaaaaaaaa", 0);
        video.name = "Introdução à Ética".into();
        video.notes = Some("ÇA VA".into());
        assert_eq!(video_search_text(&video), "introdução à ética\nça va");
        assert_eq!(fold("ÉTICA"), "ética");

        let mut tag = sample_tag("t1", "rust");
        tag.description = Some("Systems LANGUAGE".into());
        assert_eq!(tag_search_text(&tag), "rust\nsystems language");
    }

    #[test]
    fn predicate_compiles_to_sql() {
        let (sql, values) = compile_predicate(&VideoPredicate::default());
        assert!(sql.is_empty());
        assert!(values.is_empty());

        let (sql, values) = compile_predicate(&VideoPredicate {
            status: Some(VideoStatus::Later),
            priority: Some(2),
            tag_ids: Some(vec!["a".into(), "b".into()]),
            ..VideoPredicate::default()
        });
        assert!(sql.starts_with("WHERE v.status = ? AND v.priority = ? AND v.id IN"));
        assert_eq!(values.len(), 4);
    }
}
