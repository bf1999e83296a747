#![forbid(unsafe_code)]

//! JSON API in front of the video catalog.
//!
//! Every handler is a thin adapter: it pulls the path, query or body out of
//! the request, hands it to [`Catalog`] and maps the outcome onto an HTTP
//! status. Validation and business rules never live here.

use std::{path::PathBuf, sync::Arc, time::Instant};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono::Utc;
use clap::Parser;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use vidshelf::{
    catalog::{TagStats, VideoStats},
    config::{RuntimeOverrides, resolve_runtime_config},
    error::CatalogError,
    filter::ListingParams,
    model::{Tag, TagInput, Video, VideoInput},
    service::{Catalog, TagPage, VideoPage},
};

#[derive(Debug, Parser)]
#[command(name = "backend", version, about = "Serves the video catalog JSON API")]
struct BackendArgs {
    /// SQLite database file (overrides CATALOG_DB).
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
    /// Address to listen on (overrides CATALOG_HOST).
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on (overrides CATALOG_PORT).
    #[arg(long)]
    port: Option<u16>,
    /// Alternate `.env` file.
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,
    /// Origin allowed by CORS (overrides FRONTEND_URL).
    #[arg(long, value_name = "URL")]
    frontend_url: Option<String>,
}

impl From<BackendArgs> for RuntimeOverrides {
    fn from(args: BackendArgs) -> Self {
        Self {
            database_path: args.db,
            host: args.host,
            port: args.port,
            frontend_url: args.frontend_url,
            env_path: args.env_file,
        }
    }
}

/// Shared state injected into every handler.
#[derive(Clone)]
struct AppState {
    catalog: Arc<Catalog>,
    started_at: Instant,
}

impl AppState {
    fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            started_at: Instant::now(),
        }
    }
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
    /// Per-field messages, present on validation failures only.
    errors: Option<Vec<String>>,
    video_count: Option<u64>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: None,
            video_count: None,
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation { message, errors } => Self {
                errors: Some(errors),
                ..Self::new(StatusCode::BAD_REQUEST, message)
            },
            CatalogError::NotFound(message) => Self::not_found(message),
            CatalogError::Conflict(message) => Self::new(StatusCode::CONFLICT, message),
            CatalogError::InUse {
                message,
                video_count,
            } => Self {
                video_count: Some(video_count),
                ..Self::new(StatusCode::CONFLICT, message)
            },
            CatalogError::Internal(err) => {
                error!(error = ?err, "request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            errors: Some(vec![rejection.body_text()]),
            ..Self::new(StatusCode::BAD_REQUEST, "invalid request body")
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self {
            errors: Some(vec![rejection.body_text()]),
            ..Self::new(StatusCode::BAD_REQUEST, "invalid query string")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "error": self.message });
        if let Some(errors) = self.errors {
            body["errors"] = json!(errors);
        }
        if let Some(video_count) = self.video_count {
            body["videoCount"] = json!(video_count);
        }
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;
type JsonBody<T> = Result<Json<T>, JsonRejection>;
type QueryPairs = Result<Query<Vec<(String, String)>>, QueryRejection>;

fn listing_params(query: QueryPairs) -> ApiResult<ListingParams> {
    let Query(pairs) = query?;
    Ok(ListingParams::from_pairs(pairs))
}

#[derive(Debug, Deserialize)]
struct PriorityBody {
    priority: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ProgressBody {
    progress: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = resolve_runtime_config(BackendArgs::parse().into())?;
    let catalog = Catalog::open(&config.database_path)
        .await
        .with_context(|| format!("opening catalog at {}", config.database_path.display()))?;
    info!(db = %config.database_path.display(), "catalog ready");

    let app = build_router(AppState::new(catalog), cors_layer(&config.frontend_url)?);

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("binding {}:{}", config.host, config.port))?;
    info!(
        addr = %listener.local_addr()?,
        frontend = %config.frontend_url,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running API server")?;

    Ok(())
}

fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/videos", get(list_videos).post(create_video))
        .route("/api/videos/create", post(create_video))
        .route("/api/videos/search", get(search_videos))
        .route("/api/videos/stats", get(video_stats))
        .route("/api/videos/by-tag/{tag_id}", get(videos_by_tag))
        .route(
            "/api/videos/{id}",
            get(get_video).put(update_video).delete(delete_video),
        )
        .route("/api/videos/{id}/priority", patch(update_priority))
        .route("/api/videos/{id}/progress", patch(update_progress))
        .route("/api/videos/{id}/watched", patch(mark_watched))
        .route("/api/tags", get(list_tags).post(create_tag))
        .route("/api/tags/create", post(create_tag))
        .route("/api/tags/stats", get(tag_stats))
        .route(
            "/api/tags/{id}",
            get(get_tag).put(update_tag).delete(delete_tag),
        )
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(frontend_url: &str) -> Result<CorsLayer> {
    let origin = frontend_url
        .parse::<HeaderValue>()
        .with_context(|| format!("invalid FRONTEND_URL {frontend_url:?}"))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}

async fn shutdown_signal() {
    // The process still exits on Ctrl+C; only the graceful drain is lost.
    if let Err(err) = signal::ctrl_c().await {
        warn!(error = %err, "failed to install Ctrl+C handler");
    }
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("route {} not found", uri.path()))
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "video catalog API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now(),
        "uptime": state.started_at.elapsed().as_secs_f64(),
    }))
}

async fn list_videos(
    State(state): State<AppState>,
    query: QueryPairs,
) -> ApiResult<Json<VideoPage>> {
    let page = state
        .catalog
        .list_videos(&listing_params(query)?)
        .await?;
    Ok(Json(page))
}

async fn search_videos(
    State(state): State<AppState>,
    query: QueryPairs,
) -> ApiResult<Json<VideoPage>> {
    let page = state
        .catalog
        .search_videos(&listing_params(query)?)
        .await?;
    Ok(Json(page))
}

async fn video_stats(State(state): State<AppState>) -> ApiResult<Json<VideoStats>> {
    Ok(Json(state.catalog.video_stats().await?))
}

async fn videos_by_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<String>,
    query: QueryPairs,
) -> ApiResult<Json<VideoPage>> {
    let page = state
        .catalog
        .videos_by_tag(&tag_id, &listing_params(query)?)
        .await?;
    Ok(Json(page))
}

async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Video>> {
    Ok(Json(state.catalog.get_video(&id).await?))
}

async fn create_video(
    State(state): State<AppState>,
    body: JsonBody<VideoInput>,
) -> ApiResult<(StatusCode, Json<Video>)> {
    let Json(input) = body?;
    let video = state.catalog.create_video(input).await?;
    Ok((StatusCode::CREATED, Json(video)))
}

async fn update_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonBody<VideoInput>,
) -> ApiResult<Json<Video>> {
    let Json(input) = body?;
    Ok(Json(state.catalog.update_video(&id, input).await?))
}

async fn update_priority(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonBody<PriorityBody>,
) -> ApiResult<Json<Video>> {
    let Json(body) = body?;
    Ok(Json(state.catalog.update_priority(&id, body.priority).await?))
}

async fn update_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonBody<ProgressBody>,
) -> ApiResult<Json<Video>> {
    let Json(body) = body?;
    Ok(Json(state.catalog.update_progress(&id, body.progress).await?))
}

async fn mark_watched(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Video>> {
    Ok(Json(state.catalog.mark_watched(&id).await?))
}

async fn delete_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Video>> {
    Ok(Json(state.catalog.delete_video(&id).await?))
}

async fn list_tags(
    State(state): State<AppState>,
    query: QueryPairs,
) -> ApiResult<Json<TagPage>> {
    let page = state
        .catalog
        .list_tags(&listing_params(query)?)
        .await?;
    Ok(Json(page))
}

async fn tag_stats(State(state): State<AppState>) -> ApiResult<Json<TagStats>> {
    Ok(Json(state.catalog.tag_stats().await?))
}

async fn get_tag(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Tag>> {
    Ok(Json(state.catalog.get_tag(&id).await?))
}

async fn create_tag(
    State(state): State<AppState>,
    body: JsonBody<TagInput>,
) -> ApiResult<(StatusCode, Json<Tag>)> {
    let Json(input) = body?;
    let tag = state.catalog.create_tag(input).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonBody<TagInput>,
) -> ApiResult<Json<Tag>> {
    let Json(input) = body?;
    Ok(Json(state.catalog.update_tag(&id, input).await?))
}

async fn delete_tag(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Tag>> {
    Ok(Json(state.catalog.delete_tag(&id).await?))
}
