use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::board::{ClassFilter, LessonBoard, NewLesson, TransitionOutcome, ValidationError};
use crate::discover;
use crate::fixtures::Fixtures;
use crate::html;
use crate::types::{
    ClassGroup, Document, IngestError, Lesson, LessonPlan, LessonStatus, Notebook, Resource,
    Source, SourceType, Student,
};

/// Application state shared across requests
pub struct AppState {
    pub board: RwLock<LessonBoard>,
    pub fixtures: RwLock<Fixtures>,
    /// Source lists per notebook id; replaced wholesale on every write
    pub sources: RwLock<HashMap<String, Vec<Source>>>,
    pub fixtures_path: Option<PathBuf>,
}

impl AppState {
    pub fn new(fixtures: Fixtures, fixtures_path: Option<PathBuf>) -> Self {
        Self {
            board: RwLock::new(fixtures.lesson_board()),
            sources: RwLock::new(fixtures.notebook_sources()),
            fixtures: RwLock::new(fixtures),
            fixtures_path,
        }
    }

    /// Re-read the fixtures and rebuild the board and source lists.
    ///
    /// Returns the number of lessons on the rebuilt board.
    pub async fn reload(&self) -> anyhow::Result<usize> {
        let fixtures = Fixtures::load(self.fixtures_path.as_deref())?;
        let board = fixtures.lesson_board();
        let sources = fixtures.notebook_sources();
        let count = board.len();

        // Swap all three together so readers never mix old and new data
        let mut board_slot = self.board.write().await;
        let mut fixtures_slot = self.fixtures.write().await;
        let mut sources_slot = self.sources.write().await;
        *board_slot = board;
        *fixtures_slot = fixtures;
        *sources_slot = sources;
        Ok(count)
    }
}

/// Errors returned to HTTP clients as `{"error": "..."}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    InvalidStatus(#[from] IngestError),

    #[error("notebook `{0}` not found")]
    NotebookNotFound(String),

    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotebookNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        };
        warn!(status = status.as_u16(), error = %self, "Request rejected");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Start the web server, watching the fixtures file when one is given
pub async fn serve(port: u16, fixtures_path: Option<PathBuf>) -> anyhow::Result<()> {
    let fixtures = Fixtures::load(fixtures_path.as_deref())?;
    let state = Arc::new(AppState::new(fixtures, fixtures_path.clone()));
    info!(lessons = state.board.read().await.len(), "Board ready");

    if let Some(path) = fixtures_path {
        start_fixture_watcher(path, state.clone())?;
    }

    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(url = %format!("http://{addr}"), "Server running");

    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/documents", get(documents_handler))
        .route("/api/classes", get(classes_handler))
        .route("/api/students", get(students_handler))
        .route("/api/notebooks", get(notebooks_handler))
        .route("/api/lesson-plans", get(lesson_plans_handler))
        .route(
            "/api/lessons",
            get(lessons_handler).post(create_lesson_handler),
        )
        .route("/api/lessons/{id}/status", post(transition_handler))
        .route(
            "/api/notebooks/{id}/sources",
            get(sources_handler).put(replace_sources_handler),
        )
        .route("/api/discover", get(discover_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/refresh", get(refresh_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reload the fixtures whenever the file changes on disk
fn start_fixture_watcher(path: PathBuf, state: Arc<AppState>) -> anyhow::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .context("Fixtures path has no file name")?;
    let watch_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));

    let (tx, mut rx) = tokio::sync::mpsc::channel(10);

    // notify delivers events on its own thread; keep the debouncer alive there
    std::thread::spawn(move || {
        let debouncer = new_debouncer(
            Duration::from_secs(1),
            move |result: DebounceEventResult| {
                if let Ok(events) = result {
                    let touched = events
                        .iter()
                        .any(|e| e.path.file_name() == Some(file_name.as_os_str()));
                    if touched {
                        let _ = tx.blocking_send(());
                    }
                }
            },
        );

        let mut debouncer = match debouncer {
            Ok(d) => d,
            Err(e) => {
                error!(error = %e, "Failed to create fixture watcher");
                return;
            }
        };

        if let Err(e) = debouncer
            .watcher()
            .watch(&watch_dir, RecursiveMode::NonRecursive)
        {
            error!(dir = %watch_dir.display(), error = %e, "Failed to watch fixtures directory");
            return;
        }

        loop {
            std::thread::sleep(Duration::from_secs(60));
        }
    });

    tokio::spawn(async move {
        while rx.recv().await.is_some() {
            info!("Fixtures changed, reloading");
            match state.reload().await {
                Ok(count) => info!(lessons = count, "Fixtures reloaded"),
                Err(e) => warn!(error = %e, "Failed to reload fixtures, keeping previous data"),
            }
        }
    });

    Ok(())
}

/// Serve the kanban board page
async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    let board = state.board.read().await;
    Html(html::render_page(&board).into_string())
}

async fn documents_handler(State(state): State<Arc<AppState>>) -> Json<Vec<Document>> {
    Json(state.fixtures.read().await.documents.clone())
}

async fn classes_handler(State(state): State<Arc<AppState>>) -> Json<Vec<ClassGroup>> {
    Json(state.fixtures.read().await.classes.clone())
}

#[derive(Debug, Deserialize)]
struct StudentQuery {
    class: Option<String>,
}

async fn students_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StudentQuery>,
) -> Json<Vec<Student>> {
    let fixtures = state.fixtures.read().await;
    let students = match ClassFilter::from_query(query.class.as_deref()) {
        ClassFilter::All => fixtures.students.clone(),
        ClassFilter::Class(class_id) => fixtures
            .students
            .iter()
            .filter(|s| s.class_id == class_id)
            .cloned()
            .collect(),
    };
    Json(students)
}

async fn notebooks_handler(State(state): State<Arc<AppState>>) -> Json<Vec<Notebook>> {
    Json(state.fixtures.read().await.notebooks.clone())
}

async fn lesson_plans_handler(State(state): State<Arc<AppState>>) -> Json<Vec<LessonPlan>> {
    Json(state.fixtures.read().await.lesson_plans.clone())
}

#[derive(Debug, Deserialize)]
struct LessonQuery {
    status: Option<String>,
    class: Option<String>,
}

/// Board view: one column when `status` is given, every lesson otherwise
async fn lessons_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LessonQuery>,
) -> Result<Json<Vec<Lesson>>, ApiError> {
    let board = state.board.read().await;
    let lessons = match query.status.as_deref() {
        Some(status) => {
            let status: LessonStatus = status.parse()?;
            let filter = ClassFilter::from_query(query.class.as_deref());
            board.view_by_class(&filter, status)
        }
        None => board.lessons().to_vec(),
    };
    Ok(Json(lessons))
}

async fn create_lesson_handler(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewLesson>,
) -> Result<(StatusCode, Json<Lesson>), ApiError> {
    let lesson = state.board.write().await.create(new)?;
    info!(id = lesson.id, title = %lesson.title, "Lesson created");
    Ok((StatusCode::CREATED, Json(lesson)))
}

/// Target column, in any spelling `LessonStatus` parses
#[derive(Debug, Deserialize)]
struct TransitionRequest {
    status: String,
}

#[derive(Debug, Serialize)]
struct TransitionResponse {
    id: u64,
    result: TransitionOutcome,
    lesson: Option<Lesson>,
}

/// Drop a lesson card onto a column
async fn transition_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let target: LessonStatus = request.status.parse()?;
    let mut board = state.board.write().await;
    let result = board.transition(id, target);
    if let TransitionOutcome::Moved { from, to } = result {
        info!(id, %from, %to, "Lesson moved");
    }
    Ok(Json(TransitionResponse {
        id,
        result,
        lesson: board.get(id).cloned(),
    }))
}

async fn sources_handler(
    State(state): State<Arc<AppState>>,
    Path(notebook_id): Path<String>,
) -> Result<Json<Vec<Source>>, ApiError> {
    let sources = state.sources.read().await;
    sources
        .get(&notebook_id)
        .cloned()
        .map(Json)
        .ok_or(ApiError::NotebookNotFound(notebook_id))
}

/// Replace a notebook's whole source list
async fn replace_sources_handler(
    State(state): State<Arc<AppState>>,
    Path(notebook_id): Path<String>,
    Json(list): Json<Vec<Source>>,
) -> Result<Json<Vec<Source>>, ApiError> {
    let mut seen = HashSet::new();
    if let Some(dup) = list.iter().find(|s| !seen.insert(s.id.as_str())) {
        return Err(ApiError::BadRequest(format!(
            "duplicate source id `{}`",
            dup.id
        )));
    }

    let mut sources = state.sources.write().await;
    let slot = sources
        .get_mut(&notebook_id)
        .ok_or_else(|| ApiError::NotebookNotFound(notebook_id.clone()))?;

    let selected = list.iter().filter(|s| s.selected).count();
    info!(notebook = %notebook_id, total = list.len(), selected, "Sources replaced");
    *slot = list;
    Ok(Json(slot.clone()))
}

#[derive(Debug, Deserialize)]
struct DiscoverQuery {
    #[serde(default)]
    query: String,
    #[serde(rename = "type")]
    resource_type: Option<String>,
    limit: Option<usize>,
}

async fn discover_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DiscoverQuery>,
) -> Result<Json<Vec<Resource>>, ApiError> {
    let resource_type = match query.resource_type.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(t) if t.eq_ignore_ascii_case("all") => None,
        Some(t) => Some(t.parse::<SourceType>().map_err(ApiError::BadRequest)?),
    };

    let fixtures = state.fixtures.read().await;
    let results: Vec<Resource> =
        discover::search(&fixtures.resources, &query.query, resource_type, query.limit)
            .into_iter()
            .cloned()
            .collect();

    debug!(query = %query.query, results = results.len(), "Discovery search");
    Ok(Json(results))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    sources: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    id: String,
    reply: String,
    sources: usize,
}

/// Stand-in assistant: acknowledges the question and the selected sources
async fn chat_handler(Json(request): Json<ChatRequest>) -> Result<Json<ChatResponse>, ApiError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }

    let count = request.sources.len();
    let reply = if count == 0 {
        format!("No sources selected. You asked: \"{message}\"")
    } else {
        format!("Using {count} selected source(s) to answer: \"{message}\"")
    };

    debug!(sources = count, "Chat request answered");
    Ok(Json(ChatResponse {
        id: uuid::Uuid::new_v4().to_string(),
        reply,
        sources: count,
    }))
}

/// Reload fixtures from disk (manual trigger)
async fn refresh_handler(State(state): State<Arc<AppState>>) -> &'static str {
    info!("Manual refresh triggered");

    match state.reload().await {
        Ok(count) => {
            info!(lessons = count, "Fixtures reloaded");
            "OK"
        }
        Err(e) => {
            error!(error = %e, "Refresh failed");
            "ERROR"
        }
    }
}
