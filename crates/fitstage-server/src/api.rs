//! REST API for the FitStage voting and engagement core.
//!
//! The handlers are thin: validate the request shape, take the store lock,
//! call the typed store operation, and map `StoreError` to an HTTP status
//! through [`ServerError`]. All quota/role/membership rules live in the
//! store, where they run inside one transaction per request.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, Method},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use fitstage_shared::constants::{
    MAX_DISPLAY_NAME_LEN, MAX_POST_CONTENT_LEN, MAX_POST_MEDIA, MAX_POST_TAGS,
};
use fitstage_shared::{EngagementKind, Role, SortBy};
use fitstage_store::categories::NewCategory;
use fitstage_store::{
    Category, Competitor, Database, EngagementCounters, LeaderboardEntry, Post, PostFilter, User,
    VoteReceipt, VotingProgressEntry,
};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
    pub started_at: Instant,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/votes", post(cast_vote))
        .route("/categories", get(list_categories))
        .route("/categories/:id/leaderboard", get(get_leaderboard))
        .route("/spectators/:id/voting-progress", get(get_voting_progress))
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:id/engagement", post(record_engagement))
        .route("/users", post(create_user))
        .route("/competitors", post(register_competitor))
        .route("/admin/categories", post(admin_create_category))
        .route("/admin/status", get(admin_status))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ─── Voting ───

#[derive(Deserialize)]
struct CastVoteRequest {
    spectator_id: Uuid,
    competitor_id: Uuid,
    category_id: Uuid,
}

#[derive(Serialize)]
struct CastVoteResponse {
    competitor_vote_count: u64,
    voting_progress: VotingProgressEntry,
}

async fn cast_vote(
    State(state): State<AppState>,
    Json(req): Json<CastVoteRequest>,
) -> Result<Json<CastVoteResponse>, ServerError> {
    let mut db = state.db.lock().await;
    let VoteReceipt {
        competitor_vote_count,
        voting_progress,
    } = db.cast_vote(req.spectator_id, req.competitor_id, req.category_id)?;

    info!(
        spectator = %req.spectator_id,
        competitor = %req.competitor_id,
        category = %req.category_id,
        tally = competitor_vote_count,
        "Vote cast via API"
    );

    Ok(Json(CastVoteResponse {
        competitor_vote_count,
        voting_progress,
    }))
}

#[derive(Deserialize)]
struct LeaderboardQuery {
    limit: Option<usize>,
}

async fn get_leaderboard(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, ServerError> {
    let db = state.db.lock().await;
    let board = db.get_leaderboard(category_id, query.limit)?;
    Ok(Json(board))
}

async fn get_voting_progress(
    State(state): State<AppState>,
    Path(spectator_id): Path<Uuid>,
) -> Result<Json<Vec<VotingProgressEntry>>, ServerError> {
    let db = state.db.lock().await;
    let progress = db.get_voting_progress(spectator_id)?;
    Ok(Json(progress))
}

async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ServerError> {
    let db = state.db.lock().await;
    Ok(Json(db.list_categories()?))
}

// ─── Posts & engagement ───

#[derive(Deserialize)]
struct EngagementRequest {
    spectator_id: Uuid,
    kind: EngagementKind,
}

async fn record_engagement(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Json(req): Json<EngagementRequest>,
) -> Result<Json<EngagementCounters>, ServerError> {
    let mut db = state.db.lock().await;
    let counters = db.record_engagement(req.spectator_id, post_id, req.kind)?;
    Ok(Json(counters))
}

#[derive(Deserialize)]
struct PostsQuery {
    search: Option<String>,
    sort_by: Option<String>,
    limit: Option<usize>,
}

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostsQuery>,
) -> Result<Json<Vec<Post>>, ServerError> {
    let sort_by = match query.sort_by.as_deref() {
        None => SortBy::default(),
        Some(s) => s
            .parse()
            .map_err(|e: fitstage_shared::ParseEnumError| ServerError::BadRequest(e.to_string()))?,
    };

    let db = state.db.lock().await;
    let posts = db.list_posts(&PostFilter {
        search: query.search,
        sort_by,
        limit: query.limit,
    })?;
    Ok(Json(posts))
}

#[derive(Deserialize)]
struct CreatePostRequest {
    author_id: Uuid,
    content: String,
    #[serde(default)]
    media: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
}

async fn create_post(
    State(state): State<AppState>,
    Json(req): Json<CreatePostRequest>,
) -> Result<Json<Post>, ServerError> {
    if req.content.trim().is_empty() {
        return Err(ServerError::BadRequest("Post content is empty".into()));
    }
    if req.content.chars().count() > MAX_POST_CONTENT_LEN {
        return Err(ServerError::BadRequest(format!(
            "Post content exceeds {MAX_POST_CONTENT_LEN} characters"
        )));
    }
    if req.media.len() > MAX_POST_MEDIA {
        return Err(ServerError::BadRequest(format!(
            "At most {MAX_POST_MEDIA} media attachments allowed"
        )));
    }
    if req.tags.len() > MAX_POST_TAGS {
        return Err(ServerError::BadRequest(format!(
            "At most {MAX_POST_TAGS} tags allowed"
        )));
    }

    let mut db = state.db.lock().await;
    let post = db.create_post(req.author_id, &req.content, &req.media, &req.tags)?;

    info!(post = %post.id, author = %post.author_id, "Post created via API");
    Ok(Json(post))
}

// ─── Registration ───

#[derive(Deserialize)]
struct CreateUserRequest {
    display_name: String,
    role: Option<Role>,
}

async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<User>, ServerError> {
    validate_display_name(&req.display_name)?;

    let db = state.db.lock().await;
    let user = db.create_user(req.display_name.trim(), req.role.unwrap_or(Role::Spectator))?;

    info!(user = %user.id, role = %user.role, "User created via API");
    Ok(Json(user))
}

#[derive(Deserialize)]
struct RegisterCompetitorRequest {
    user_id: Uuid,
    display_name: String,
    #[serde(default)]
    category_ids: Vec<Uuid>,
}

async fn register_competitor(
    State(state): State<AppState>,
    Json(req): Json<RegisterCompetitorRequest>,
) -> Result<Json<Competitor>, ServerError> {
    validate_display_name(&req.display_name)?;

    let mut db = state.db.lock().await;
    let competitor =
        db.register_competitor(req.user_id, req.display_name.trim(), &req.category_ids)?;
    Ok(Json(competitor))
}

fn validate_display_name(name: &str) -> Result<(), ServerError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServerError::BadRequest("Display name is empty".into()));
    }
    if name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(ServerError::BadRequest(format!(
            "Display name exceeds {MAX_DISPLAY_NAME_LEN} characters"
        )));
    }
    Ok(())
}

// ─── Admin endpoints ───

fn verify_admin_token(headers: &HeaderMap, config: &ServerConfig) -> Result<(), ServerError> {
    let Some(ref expected) = config.admin_token else {
        return Err(ServerError::Forbidden(
            "Admin API is disabled (no ADMIN_TOKEN configured)".into(),
        ));
    };

    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or(auth);

    // Constant-time comparison to prevent timing attacks on admin token.
    use subtle::ConstantTimeEq;
    let token_bytes = token.as_bytes();
    let expected_bytes = expected.as_bytes();
    if token_bytes.len() != expected_bytes.len()
        || token_bytes.ct_eq(expected_bytes).unwrap_u8() != 1
    {
        return Err(ServerError::Forbidden("Invalid admin token".into()));
    }

    Ok(())
}

#[derive(Deserialize)]
struct CreateCategoryRequest {
    name: String,
    description: Option<String>,
    max_votes: Option<u32>,
    status: Option<String>,
}

async fn admin_create_category(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<Json<Category>, ServerError> {
    verify_admin_token(&headers, &state.config)?;

    if req.name.trim().is_empty() {
        return Err(ServerError::BadRequest("Category name is empty".into()));
    }
    let max_votes = req.max_votes.unwrap_or(state.config.default_max_votes);
    if max_votes == 0 {
        return Err(ServerError::BadRequest("max_votes must be positive".into()));
    }

    let db = state.db.lock().await;
    let category = db.create_category(&NewCategory {
        name: req.name.trim(),
        description: req.description.as_deref(),
        max_votes,
        status: req.status.as_deref().unwrap_or("upcoming"),
    })?;

    info!(category = %category.id, name = %category.name, max_votes, "Category created");
    Ok(Json(category))
}

#[derive(Serialize)]
struct AdminStatusResponse {
    name: String,
    version: &'static str,
    users: u64,
    categories: u64,
    posts: u64,
    uptime_secs: u64,
}

async fn admin_status(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<AdminStatusResponse>, ServerError> {
    verify_admin_token(&headers, &state.config)?;

    let db = state.db.lock().await;
    Ok(Json(AdminStatusResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        users: db.count_users()?,
        categories: db.count_categories()?,
        posts: db.count_posts()?,
        uptime_secs: state.started_at.elapsed().as_secs(),
    }))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
