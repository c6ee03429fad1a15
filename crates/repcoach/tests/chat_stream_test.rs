//! Integration tests for the `POST /api/chat` SSE stream.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{
    EndlessProvider, ScriptedProvider, StallingProvider, TestApp, done, parse_sse_events, token,
    tool_calls,
};
use repcoach::api::{CHAT_FAILED, EMPTY_MESSAGES, ErrorResponse, sse};
use repcoach::llm::{LLMError, Role};
use repcoach::tools::PROGRESS_TOOL_NAME;

fn chat_request(body: Value) -> Request<Body> {
    Request::post("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn hello() -> Value {
    json!({ "messages": [{ "role": "user", "content": "Build me a 3 day split" }] })
}

async fn stream_events(app: Router, body: Value) -> Vec<(String, Value)> {
    let response = app.oneshot(chat_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    parse_sse_events(&text)
        .into_iter()
        .map(|(name, data)| (name, serde_json::from_str(&data).unwrap()))
        .collect()
}

fn names(events: &[(String, Value)]) -> Vec<&str> {
    events.iter().map(|(name, _)| name.as_str()).collect()
}

// ============================================================================
// Happy Path
// ============================================================================

#[tokio::test]
async fn test_text_only_stream() {
    let provider = ScriptedProvider::new(vec![vec![
        Ok(token("Here is ")),
        Ok(token("your plan.")),
        Ok(done("stop")),
    ]]);
    let app = TestApp::new().provider(provider).build();

    let events = stream_events(app, hello()).await;

    assert_eq!(names(&events), vec![sse::TEXT_DELTA, sse::TEXT_DELTA, sse::DONE]);
    assert_eq!(events[0].1, json!({ "type": "text_delta", "content": "Here is " }));
    assert_eq!(events[1].1["content"], "your plan.");
    assert_eq!(events[2].1, json!({ "type": "done", "finish_reason": "stop" }));
}

#[tokio::test]
async fn test_chat_is_reachable_without_session_cookie() {
    let provider = ScriptedProvider::new(vec![vec![Ok(token("hi")), Ok(done("stop"))]]);
    let app = TestApp::new().provider(provider).build();

    let response = app.oneshot(chat_request(hello())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_carries_system_prompt_and_progress_tool() {
    let provider = ScriptedProvider::new(vec![vec![Ok(done("stop"))]]);
    let app = TestApp::new().provider(provider.clone()).build();

    let body = json!({ "messages": [
        { "role": "user", "content": "hi" },
        { "role": "assistant", "content": "hello" },
        { "role": "user", "content": "plan please" }
    ]});
    stream_events(app, body).await;

    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.messages.len(), 4);
    assert!(matches!(request.messages[0].role, Role::System));
    assert_eq!(request.messages[3].content.as_deref(), Some("plan please"));

    let tools = request.tools.as_ref().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].function.name, PROGRESS_TOOL_NAME);
}

// ============================================================================
// Tool Calls
// ============================================================================

#[tokio::test]
async fn test_progress_tool_call_interleaves_with_text() {
    let arguments = json!({ "steps": [
        { "step": "analyze", "description": "Reading your goals", "completed": true },
        { "step": "build", "description": "Choosing exercises", "completed": false }
    ]});
    let provider = ScriptedProvider::new(vec![
        vec![
            Ok(token("Working on it.")),
            Ok(tool_calls("call_1", PROGRESS_TOOL_NAME, &arguments.to_string())),
            Ok(done("tool_calls")),
        ],
        vec![Ok(token("Done: 3 day split.")), Ok(done("stop"))],
    ]);
    let app = TestApp::new().provider(provider.clone()).build();

    let events = stream_events(app, hello()).await;

    assert_eq!(
        names(&events),
        vec![
            sse::TEXT_DELTA,
            sse::TOOL_CALL,
            sse::TOOL_RESULT,
            sse::TEXT_DELTA,
            sse::DONE
        ]
    );

    let call = &events[1].1;
    assert_eq!(call["id"], "call_1");
    assert_eq!(call["name"], PROGRESS_TOOL_NAME);
    assert_eq!(call["arguments"], arguments);

    let result = &events[2].1;
    assert_eq!(result["id"], "call_1");
    assert_eq!(result["success"], true);
    assert_eq!(result["result"]["success"], true);
    assert_eq!(result["result"]["message"], "Progress updated");
    assert_eq!(result["result"]["steps"], arguments["steps"]);

    assert_eq!(events[4].1["finish_reason"], "stop");

    // The follow-up request carries the tool exchange.
    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    let follow_up = requests[1].messages.last().unwrap();
    assert!(matches!(follow_up.role, Role::Tool));
    assert_eq!(follow_up.tool_call_id.as_deref(), Some("call_1"));
}

#[tokio::test]
async fn test_invalid_tool_arguments_reported_in_stream() {
    let provider = ScriptedProvider::new(vec![
        vec![
            Ok(tool_calls("call_1", PROGRESS_TOOL_NAME, r#"{"steps": null}"#)),
            Ok(done("tool_calls")),
        ],
        vec![Ok(token("Sorry about that.")), Ok(done("stop"))],
    ]);
    let app = TestApp::new().provider(provider).build();

    let events = stream_events(app, hello()).await;

    assert_eq!(events[1].0, sse::TOOL_RESULT);
    assert_eq!(events[1].1["success"], false);
    assert_eq!(events[1].1["result"]["success"], false);
    assert_eq!(events.last().unwrap().0, sse::DONE);
}

#[tokio::test]
async fn test_unknown_tool_reported_in_stream() {
    let provider = ScriptedProvider::new(vec![
        vec![
            Ok(tool_calls("call_9", "delete_account", "{}")),
            Ok(done("tool_calls")),
        ],
        vec![Ok(done("stop"))],
    ]);
    let app = TestApp::new().provider(provider).build();

    let events = stream_events(app, hello()).await;

    assert_eq!(names(&events), vec![sse::TOOL_CALL, sse::TOOL_RESULT, sse::DONE]);
    assert_eq!(events[1].1["success"], false);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_provider_failure_before_stream_is_500_without_details() {
    // No scripts: the provider answers with an API error naming a key.
    let app = TestApp::new().provider(ScriptedProvider::new(vec![])).build();

    let response = app.oneshot(chat_request(hello())).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(!text.contains("sk-secret"));
    let body: ErrorResponse = serde_json::from_str(&text).unwrap();
    assert_eq!(body.error, CHAT_FAILED);
}

#[tokio::test]
async fn test_provider_failure_mid_stream_ends_with_error_event() {
    let provider = ScriptedProvider::new(vec![vec![
        Ok(token("Partial")),
        Err(LLMError::Stream("connection reset by upstream".to_string())),
    ]]);
    let app = TestApp::new().provider(provider).build();

    let events = stream_events(app, hello()).await;

    assert_eq!(names(&events), vec![sse::TEXT_DELTA, sse::ERROR]);
    assert_eq!(events[1].1, json!({ "type": "error", "message": CHAT_FAILED }));
}

#[tokio::test]
async fn test_empty_messages_rejected() {
    let app = TestApp::new().build();

    let response = app
        .oneshot(chat_request(json!({ "messages": [] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.error, EMPTY_MESSAGES);
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let app = TestApp::new().build();

    let request = Request::post("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Budget & Cancellation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_stalled_model_ends_with_timeout_event() {
    let app = TestApp::new().provider(Arc::new(StallingProvider)).build();

    let events = stream_events(app, hello()).await;

    assert_eq!(names(&events), vec![sse::TEXT_DELTA, sse::TIMEOUT]);
    assert_eq!(events[1].1, json!({ "type": "timeout", "budget_seconds": 30 }));
}

#[tokio::test]
async fn test_client_disconnect_stops_model_stream() {
    let dropped = Arc::new(AtomicBool::new(false));
    let provider = Arc::new(EndlessProvider {
        dropped: Arc::clone(&dropped),
    });
    let app = TestApp::new().provider(provider).build();

    let response = app.oneshot(chat_request(hello())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = response.into_body();
    let first = body.frame().await.unwrap().unwrap();
    assert!(first.is_data());
    drop(body);

    for _ in 0..100 {
        if dropped.load(Ordering::SeqCst) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(dropped.load(Ordering::SeqCst));
}
