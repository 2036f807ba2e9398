use axum::{
    extract::{FromRequest, Json, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use tokio::spawn;
use tracing::info;

use crate::{
    app_state::AppState,
    error::PlaygroundError,
    models::{control_specs, ControlSpecs, CHARACTERS_EXPORT_FILENAME},
    playground::{self, PlaygroundView, QueryKind},
};

// --- Payloads de la API ---

#[derive(Deserialize)]
pub struct TextPayload {
    text: String,
}

#[derive(Deserialize)]
pub struct ImportPayload {
    filename: String,
    content: String,
}

#[derive(Deserialize)]
pub struct ChunkingPayload {
    chunk_size: Option<u32>,
    chunk_overlap: Option<u32>,
}

#[derive(Deserialize)]
pub struct RetrievalPayload {
    top_k: Option<u32>,
    temperature: Option<f64>,
    top_p: Option<f64>,
}

#[derive(Deserialize)]
pub struct QueryPayload {
    query: String,
}

type ApiResult<T> = Result<T, PlaygroundError>;

/// Como `Json`, pero un cuerpo inválido responde `400 {"error": ...}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(PlaygroundError))]
struct ApiJson<T>(T);

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/playground", get(playground_handler))
        .route("/api/playground/controls", get(controls_handler))
        .route("/api/playground/text", put(set_text_handler))
        .route("/api/playground/import", post(import_handler))
        .route("/api/playground/chunking", put(chunking_handler))
        .route("/api/playground/retrieval", put(retrieval_handler))
        .route("/api/playground/index", post(build_index_handler))
        .route("/api/playground/query", post(query_handler))
        .route("/api/playground/extract", post(extract_handler))
        .route("/api/playground/characters/export", get(export_characters_handler))
        .route("/api/shutdown", post(shutdown_handler))
        .with_state(app_state)
}

// --- Handlers de lectura ---

#[axum::debug_handler]
async fn playground_handler(State(state): State<AppState>) -> Json<PlaygroundView> {
    Json(playground::lock(&state.playground).view())
}

#[axum::debug_handler]
async fn controls_handler() -> Json<ControlSpecs> {
    Json(control_specs())
}

// --- Edición (síncrona, invalida el índice cuando corresponde) ---

#[axum::debug_handler]
async fn set_text_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TextPayload>,
) -> ApiResult<Json<PlaygroundView>> {
    let mut pg = playground::lock(&state.playground);
    pg.set_text(payload.text);
    Ok(Json(pg.view()))
}

#[axum::debug_handler]
async fn import_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ImportPayload>,
) -> ApiResult<Json<PlaygroundView>> {
    let mut pg = playground::lock(&state.playground);
    pg.import_file(&payload.filename, &payload.content)?;
    let view = pg.view();
    info!("Importado '{}' ({} caracteres tras la limpieza)", payload.filename, view.text.len());
    Ok(Json(view))
}

#[axum::debug_handler]
async fn chunking_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ChunkingPayload>,
) -> ApiResult<Json<PlaygroundView>> {
    let mut pg = playground::lock(&state.playground);
    pg.update_chunking(payload.chunk_size, payload.chunk_overlap)?;
    Ok(Json(pg.view()))
}

#[axum::debug_handler]
async fn retrieval_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RetrievalPayload>,
) -> ApiResult<Json<PlaygroundView>> {
    let mut pg = playground::lock(&state.playground);
    pg.update_retrieval(payload.top_k, payload.temperature, payload.top_p)?;
    Ok(Json(pg.view()))
}

// --- Operaciones de red: se validan aquí y se ejecutan en segundo plano ---

#[axum::debug_handler]
async fn build_index_handler(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<PlaygroundView>)> {
    let (request, view) = {
        let mut pg = playground::lock(&state.playground);
        let request = pg.begin_build()?;
        (request, pg.view())
    };

    spawn(playground::run_build(
        state.playground.clone(),
        state.backend.clone(),
        request,
    ));

    Ok((StatusCode::ACCEPTED, Json(view)))
}

#[axum::debug_handler]
async fn query_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<QueryPayload>,
) -> ApiResult<(StatusCode, Json<PlaygroundView>)> {
    let (request, view) = {
        let mut pg = playground::lock(&state.playground);
        pg.set_query(payload.query);
        let request = pg.begin_query(QueryKind::Question)?;
        (request, pg.view())
    };

    spawn(playground::run_query(
        state.playground.clone(),
        state.backend.clone(),
        QueryKind::Question,
        request,
    ));

    Ok((StatusCode::ACCEPTED, Json(view)))
}

#[axum::debug_handler]
async fn extract_handler(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<PlaygroundView>)> {
    let (request, view) = {
        let mut pg = playground::lock(&state.playground);
        let request = pg.begin_query(QueryKind::CharacterExtraction)?;
        (request, pg.view())
    };

    spawn(playground::run_query(
        state.playground.clone(),
        state.backend.clone(),
        QueryKind::CharacterExtraction,
        request,
    ));

    Ok((StatusCode::ACCEPTED, Json(view)))
}

// --- Exportación ---

#[axum::debug_handler]
async fn export_characters_handler(
    State(state): State<AppState>,
) -> impl IntoResponse {
    let body = playground::lock(&state.playground).export_characters();
    let disposition = format!("attachment; filename=\"{}\"", CHARACTERS_EXPORT_FILENAME);
    (
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
}

// --- Handler de Apagado ---

#[axum::debug_handler]
async fn shutdown_handler(State(state): State<AppState>) -> impl IntoResponse {
    info!("Petición de apagado recibida.");
    let sender = state
        .shutdown_sender
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .take();
    if let Some(sender) = sender {
        let _ = sender.send(());
    }
    StatusCode::OK
}
