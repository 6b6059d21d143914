//! Blog server
//!
//! Serves the generated site, answers "load more" requests from the listing
//! page and generates post pages that were not known at build time.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cms::ContentRepository;
use crate::content::{PaginationState, PostSummary};
use crate::error::CmsError;
use crate::generator::{DetailPage, Generator};
use crate::Blog;

/// Endpoint the listing page calls to fetch its next page
pub const LOAD_MORE_ROUTE: &str = "/api/posts/next";
/// Prefix of the endpoint the loading placeholder calls to get its post
pub const FALLBACK_ROUTE: &str = "/__fallback/post/";

/// One lock per post being generated on demand
type BuildLocks = HashMap<String, Arc<tokio::sync::Mutex<()>>>;

/// Server state
struct ServerState {
    generator: Generator,
    repo: Arc<dyn ContentRepository>,
    public_dir: PathBuf,
    building: Mutex<BuildLocks>,
}

impl ServerState {
    fn new(blog: &Blog, repo: Arc<dyn ContentRepository>) -> Result<Self> {
        Ok(Self {
            generator: Generator::new(blog)?,
            repo,
            public_dir: blog.public_dir.clone(),
            building: Mutex::new(HashMap::new()),
        })
    }

    fn building(&self) -> MutexGuard<'_, BuildLocks> {
        self.building.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Deserialize)]
struct NextPageQuery {
    page: String,
}

#[derive(Debug, Serialize)]
struct NextPageResponse {
    results: Vec<PostSummary>,
    /// Listing entries rendered for appending
    html: String,
    next_page: Option<String>,
}

/// Start the blog server
pub async fn start(
    blog: &Blog,
    repo: Arc<dyn ContentRepository>,
    ip: &str,
    port: u16,
) -> Result<()> {
    let app = router(blog, repo)?;

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router
pub fn router(blog: &Blog, repo: Arc<dyn ContentRepository>) -> Result<Router> {
    let state = Arc::new(ServerState::new(blog, repo)?);

    Ok(Router::new()
        .route(LOAD_MORE_ROUTE, get(next_page_handler))
        .route("/__fallback/post/:uid", get(resolve_handler))
        .route("/__fallback/post/:uid/", get(resolve_handler))
        .fallback(static_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Follow a listing locator and return the posts it holds
async fn next_page_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<NextPageQuery>,
) -> Response {
    let mut listing = PaginationState::resume(query.page);
    if let Err(e) = listing.load_next_page(state.repo.as_ref()).await {
        return cms_error_response(&e);
    }

    let next_page = listing.next_page().map(str::to_string);
    let results = listing.into_posts();
    match state.generator.render_post_list(&results) {
        Ok(html) => Json(NextPageResponse {
            results,
            html,
            next_page,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Failed to render listing entries: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

/// Generate a post page on demand and return it
async fn resolve_handler(
    State(state): State<Arc<ServerState>>,
    Path(uid): Path<String>,
) -> Response {
    match build_once(&state, &uid).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => match e.downcast_ref::<CmsError>() {
            Some(cms) if cms.is_not_found() => not_found(&state),
            Some(cms) => cms_error_response(cms),
            None => {
                tracing::warn!("Cannot generate post {:?}: {:#}", uid, e);
                not_found(&state)
            }
        },
    }
}

/// Generate a post unless it already exists. Concurrent requests for the
/// same uid wait for the first one and share its page.
async fn build_once(state: &ServerState, uid: &str) -> Result<String> {
    // Also rejects invalid uids before they reach the lock map
    if let DetailPage::Ready(html) = state.generator.lookup_post(uid)? {
        return Ok(html);
    }

    let lock = state.building().entry(uid.to_string()).or_default().clone();
    let result = generate_locked(state, &lock, uid).await;

    // Drop the entry unless a later request already replaced it
    let mut building = state.building();
    if building.get(uid).is_some_and(|current| Arc::ptr_eq(current, &lock)) {
        building.remove(uid);
    }

    result
}

async fn generate_locked(
    state: &ServerState,
    lock: &tokio::sync::Mutex<()>,
    uid: &str,
) -> Result<String> {
    let _guard = lock.lock().await;

    if let DetailPage::Ready(html) = state.generator.lookup_post(uid)? {
        return Ok(html);
    }

    state
        .generator
        .generate_post(state.repo.as_ref(), uid)
        .await
}

/// Serve generated files. Unknown post pages get the loading placeholder.
async fn static_handler(State(state): State<Arc<ServerState>>, request: Request<Body>) -> Response {
    if let Some(uid) = post_uid(request.uri().path()) {
        return match state.generator.lookup_post(&uid) {
            Ok(DetailPage::Ready(html)) | Ok(DetailPage::Fallback(html)) => {
                Html(html).into_response()
            }
            Err(_) => not_found(&state),
        };
    }

    let mut service = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => not_found(&state),
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

/// The uid in `/post/<uid>/`
fn post_uid(path: &str) -> Option<String> {
    let segment = path.strip_prefix("/post/")?;
    let segment = segment.strip_suffix('/').unwrap_or(segment);
    if segment.is_empty() || segment.contains('/') {
        return None;
    }
    percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

fn not_found(state: &ServerState) -> Response {
    match state.generator.render_not_found() {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

fn cms_error_response(err: &CmsError) -> Response {
    let status = match err {
        CmsError::NotFound { .. } => StatusCode::NOT_FOUND,
        CmsError::InvalidLocator(_) => StatusCode::BAD_REQUEST,
        CmsError::LoadInProgress => StatusCode::CONFLICT,
        _ => StatusCode::BAD_GATEWAY,
    };
    tracing::warn!("CMS request failed ({}): {}", status, err);
    (
        status,
        Json(serde_json::json!({ "error": err.to_string() })),
    )
        .into_response()
}
