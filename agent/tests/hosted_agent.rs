//! Exercises `HostedAgentService` against an in-process fake of the agent platform.

use agent_system::{AgentBackend, AgentConfig, AgentError, HostedAgentService, RunStatus};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const API_KEY: &str = "test-key";

#[derive(Clone, Copy)]
enum Behaviour {
    Answer,
    Cancel,
    FailRun,
    Malformed,
    NeverFinish,
    NoAssistantText,
    RateLimited,
}

struct Platform {
    behaviour: Behaviour,
    polls: Mutex<usize>,
    messages: Mutex<Vec<Value>>,
    run_requests: Mutex<Vec<Value>>,
}

type Shared = Arc<Platform>;

fn authorized(headers: &HeaderMap, params: &HashMap<String, String>) -> Result<(), Response> {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if bearer != format!("Bearer {}", API_KEY) {
        return Err((StatusCode::UNAUTHORIZED, "invalid credentials").into_response());
    }
    if params.get("api-version").map(String::as_str) != Some("v1") {
        return Err((StatusCode::BAD_REQUEST, "missing api-version").into_response());
    }
    Ok(())
}

async fn create_thread(
    State(platform): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(r) = authorized(&headers, &params) {
        return r;
    }
    if let Behaviour::RateLimited = platform.behaviour {
        return (StatusCode::TOO_MANY_REQUESTS, "quota exceeded").into_response();
    }
    if let Behaviour::Malformed = platform.behaviour {
        return (StatusCode::OK, "<html>gateway maintenance</html>").into_response();
    }
    Json(json!({"id": format!("thread_{}", uuid::Uuid::new_v4().simple())})).into_response()
}

async fn create_message(
    State(platform): State<Shared>,
    Path(thread_id): Path<String>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(r) = authorized(&headers, &params) {
        return r;
    }
    let message = json!({
        "id": "msg_user",
        "thread_id": thread_id,
        "role": body["role"],
        "content": [{"type": "text", "text": {"value": body["content"], "annotations": []}}]
    });
    platform.messages.lock().unwrap().push(message.clone());
    Json(message).into_response()
}

async fn create_run(
    State(platform): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(r) = authorized(&headers, &params) {
        return r;
    }
    platform.run_requests.lock().unwrap().push(body);
    Json(json!({"id": "run_1", "status": "queued"})).into_response()
}

async fn get_run(
    State(platform): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(r) = authorized(&headers, &params) {
        return r;
    }
    let mut polls = platform.polls.lock().unwrap();
    *polls += 1;

    let run = match (platform.behaviour, *polls) {
        (Behaviour::NeverFinish, _) | (_, 1) => json!({"id": "run_1", "status": "in_progress"}),
        (Behaviour::FailRun, _) => json!({
            "id": "run_1",
            "status": "failed",
            "last_error": {"code": "server_error", "message": "search tool unavailable"}
        }),
        (Behaviour::Cancel, _) => json!({"id": "run_1", "status": "cancelled"}),
        _ => json!({"id": "run_1", "status": "completed"}),
    };
    Json(run).into_response()
}

async fn list_messages(
    State(platform): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(r) = authorized(&headers, &params) {
        return r;
    }
    if params.get("order").map(String::as_str) != Some("asc") {
        return (StatusCode::BAD_REQUEST, "expected ascending order").into_response();
    }

    let mut data = platform.messages.lock().unwrap().clone();
    data.push(json!({
        "id": "msg_old",
        "role": "assistant",
        "run_id": "run_0",
        "content": [{"type": "text", "text": {"value": "earlier answer"}}]
    }));
    match platform.behaviour {
        Behaviour::NoAssistantText => data.push(json!({
            "id": "msg_tool",
            "role": "assistant",
            "run_id": "run_1",
            "content": []
        })),
        _ => data.push(json!({
            "id": "msg_new",
            "role": "assistant",
            "run_id": "run_1",
            "content": [{"type": "text", "text": {"value": "It is 1pm."}}]
        })),
    }
    Json(json!({"object": "list", "data": data, "has_more": false})).into_response()
}

async fn spawn_platform(behaviour: Behaviour) -> (String, Shared) {
    let platform = Arc::new(Platform {
        behaviour,
        polls: Mutex::new(0),
        messages: Mutex::new(Vec::new()),
        run_requests: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/threads", post(create_thread))
        .route("/threads/:thread_id/messages", post(create_message).get(list_messages))
        .route("/threads/:thread_id/runs", post(create_run))
        .route("/threads/:thread_id/runs/:run_id", get(get_run))
        .with_state(platform.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/", addr), platform)
}

fn config(endpoint: &str, api_key: &str) -> AgentConfig {
    let mut config = AgentConfig::new(endpoint, "asst_coordinator", api_key);
    config.poll_interval = Duration::from_millis(10);
    config.run_timeout = Duration::from_millis(300);
    config
}

#[tokio::test]
async fn completed_run_returns_latest_assistant_text() {
    let (endpoint, platform) = spawn_platform(Behaviour::Answer).await;
    let service = HostedAgentService::new(config(&endpoint, API_KEY)).unwrap();

    let thread = service.create_thread().await.unwrap();
    assert!(thread.starts_with("thread_"));

    let answer = service.send_message(&thread, "What is the time now?").await.unwrap();
    assert_eq!(answer, "It is 1pm.");

    let runs = platform.run_requests.lock().unwrap();
    assert_eq!(runs[0]["assistant_id"], "asst_coordinator");
    assert!(*platform.polls.lock().unwrap() >= 2);
}

#[tokio::test]
async fn history_lists_thread_messages_in_order() {
    let (endpoint, _platform) = spawn_platform(Behaviour::Answer).await;
    let service = HostedAgentService::new(config(&endpoint, API_KEY)).unwrap();

    let thread = service.create_thread().await.unwrap();
    service.send_message(&thread, "hello").await.unwrap();

    let history = service.history(&thread).await.unwrap();
    let roles: Vec<_> = history.iter().map(|m| m.role.as_str()).collect();
    assert_eq!(roles, vec!["user", "assistant", "assistant"]);
    assert_eq!(history[0].last_text(), Some("hello"));
}

#[tokio::test]
async fn wrong_key_is_an_authentication_error() {
    let (endpoint, _platform) = spawn_platform(Behaviour::Answer).await;
    let service = HostedAgentService::new(config(&endpoint, "expired-key")).unwrap();

    let err = service.create_thread().await.unwrap_err();
    assert!(matches!(err, AgentError::Authentication(_)), "got {:?}", err);
}

#[tokio::test]
async fn quota_exhaustion_is_rate_limited() {
    let (endpoint, _platform) = spawn_platform(Behaviour::RateLimited).await;
    let service = HostedAgentService::new(config(&endpoint, API_KEY)).unwrap();

    let err = service.create_thread().await.unwrap_err();
    assert!(matches!(err, AgentError::RateLimited(_)), "got {:?}", err);
}

#[tokio::test]
async fn failed_run_reports_platform_reason() {
    let (endpoint, _platform) = spawn_platform(Behaviour::FailRun).await;
    let service = HostedAgentService::new(config(&endpoint, API_KEY)).unwrap();

    let thread = service.create_thread().await.unwrap();
    match service.send_message(&thread, "May I get XXX company's LOA form?").await {
        Err(AgentError::RunFailed(reason)) => assert!(reason.contains("search tool unavailable")),
        other => panic!("expected run failure, got {:?}", other),
    }
}

#[tokio::test]
async fn stuck_run_times_out() {
    let (endpoint, _platform) = spawn_platform(Behaviour::NeverFinish).await;
    let service = HostedAgentService::new(config(&endpoint, API_KEY)).unwrap();

    let thread = service.create_thread().await.unwrap();
    let err = service.send_message(&thread, "hello").await.unwrap_err();
    assert!(matches!(err, AgentError::RunTimedOut(_)), "got {:?}", err);
}

#[tokio::test]
async fn run_without_assistant_text_is_empty_response() {
    let (endpoint, _platform) = spawn_platform(Behaviour::NoAssistantText).await;
    let service = HostedAgentService::new(config(&endpoint, API_KEY)).unwrap();

    let thread = service.create_thread().await.unwrap();
    let err = service.send_message(&thread, "hello").await.unwrap_err();
    assert!(matches!(err, AgentError::EmptyResponse), "got {:?}", err);
}

#[tokio::test]
async fn earlier_answer_is_not_returned_for_a_textless_run() {
    let (endpoint, _platform) = spawn_platform(Behaviour::NoAssistantText).await;
    let service = HostedAgentService::new(config(&endpoint, API_KEY)).unwrap();

    let thread = service.create_thread().await.unwrap();
    let history = service.history(&thread).await.unwrap();
    assert_eq!(history[0].last_text(), Some("earlier answer"));

    let err = service.send_message(&thread, "hello").await.unwrap_err();
    assert!(matches!(err, AgentError::EmptyResponse), "got {:?}", err);
}

#[tokio::test]
async fn cancelled_run_reports_its_status() {
    let (endpoint, _platform) = spawn_platform(Behaviour::Cancel).await;
    let service = HostedAgentService::new(config(&endpoint, API_KEY)).unwrap();

    let thread = service.create_thread().await.unwrap();
    let err = service.send_message(&thread, "hello").await.unwrap_err();
    assert!(matches!(err, AgentError::RunEnded(RunStatus::Cancelled)), "got {:?}", err);
}

#[tokio::test]
async fn malformed_platform_body_is_a_decode_error() {
    let (endpoint, _platform) = spawn_platform(Behaviour::Malformed).await;
    let service = HostedAgentService::new(config(&endpoint, API_KEY)).unwrap();

    let err = service.create_thread().await.unwrap_err();
    assert!(matches!(err, AgentError::Decode(_)), "got {:?}", err);
}

#[tokio::test]
async fn unreachable_platform_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let service = HostedAgentService::new(config(&format!("http://{}", addr), API_KEY)).unwrap();
    let err = service.create_thread().await.unwrap_err();
    assert!(matches!(err, AgentError::Network(_)), "got {:?}", err);
}
