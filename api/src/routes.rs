use crate::chat_payload::ChatRequest;
use crate::chat_response::{ChatTurnResponse, ErrorResponse};
use crate::render;
use agent_system::{extract_source_links, ConversationEntry, ConversationService, FileIndex};
use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use uuid::Uuid;

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    pub conversation: Arc<ConversationService>,
    pub files_dir: PathBuf,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Same-origin only: the chat page is served from here, so no CORS layer.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .route(
            "/api/conversation",
            get(conversation_history).delete(reset_conversation),
        )
        .route("/api/conversation/new", post(new_conversation))
        .nest_service("/files", ServeDir::new(&state.files_dir))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatTurnResponse>, ApiError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Message must not be empty")),
        ));
    }

    let turn_id = Uuid::new_v4();
    log::info!("Turn {} started ({} prior messages)", turn_id, payload.history.len());

    let mut history = payload.history;
    history.push(render::user_message(message));

    let reply = state.conversation.ask(message).await;

    // Only answers that cite something need the files directory.
    let links = if reply.response.contains("](") {
        let files_dir = state.files_dir.clone();
        let index = tokio::task::spawn_blocking(move || FileIndex::scan(files_dir))
            .await
            .unwrap_or_default();
        extract_source_links(&reply.response, &index)
    } else {
        Vec::new()
    };

    let assistant = render::assistant_message(&reply.response, &links);
    log::info!(
        "Turn {} finished: {:?}, {} source cards",
        turn_id,
        reply.status,
        assistant.sources.len()
    );
    history.push(assistant);

    Ok(Json(ChatTurnResponse {
        status: reply.status,
        history,
        error: reply.error,
    }))
}

async fn new_conversation(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    match state.conversation.new_conversation().await {
        Ok(thread_id) => Ok(Json(json!({"thread_id": thread_id}))),
        Err(e) => {
            log::error!("Failed to create thread: {}", e);
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new(e.user_message())),
            ))
        }
    }
}

async fn reset_conversation(State(state): State<AppState>) -> StatusCode {
    state.conversation.reset().await;
    StatusCode::NO_CONTENT
}

async fn conversation_history(State(state): State<AppState>) -> Json<Vec<ConversationEntry>> {
    Json(state.conversation.history().await)
}
