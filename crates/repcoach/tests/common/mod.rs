//! Common test utilities.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use chrono::{TimeZone, Utc};
use futures::{StreamExt, stream};

use repcoach::auth::{SharedVerifier, StaticSessionVerifier};
use repcoach::chat::{ChatOrchestrator, ChatSettings};
use repcoach::config::{ChatConfig, GateConfig, LlmConfig};
use repcoach::gate::RouteTable;
use repcoach::llm::{ChatRequest, ChatStream, LLMError, LLMProvider, StreamEvent, ToolCall};
use repcoach::server::{self, AppState};
use repcoach::store::{Exercise, InMemoryWorkoutStore, Routine, WorkoutProgram, WorkoutStore};
use repcoach::tools::{ProgressTool, ToolExecutor};

pub const VALID_TOKEN: &str = "valid-token";
pub const OTHER_TOKEN: &str = "other-token";
pub const USER_ID: &str = "user-1";
pub const OTHER_USER_ID: &str = "user-2";

// ============================================================================
// App Construction
// ============================================================================

/// Builder for a test `AppState` with fakes for every external collaborator.
pub struct TestApp {
    pub provider: Arc<dyn LLMProvider>,
    pub verifier: SharedVerifier,
    pub store: Arc<dyn WorkoutStore>,
    pub chat: ChatConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            provider: ScriptedProvider::new(vec![]),
            verifier: Arc::new(StaticSessionVerifier::new([
                (VALID_TOKEN, USER_ID),
                (OTHER_TOKEN, OTHER_USER_ID),
            ])),
            store: Arc::new(sample_store()),
            chat: ChatConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn verifier(mut self, verifier: SharedVerifier) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn store(mut self, store: Arc<dyn WorkoutStore>) -> Self {
        self.store = store;
        self
    }

    pub fn state(self) -> AppState {
        let tools = ToolExecutor::new().register(Arc::new(ProgressTool));
        let settings = ChatSettings::from_config(&self.chat, &LlmConfig::default());
        AppState {
            routes: Arc::new(RouteTable::from_config(&GateConfig::default())),
            verifier: self.verifier,
            store: self.store,
            chat: Arc::new(ChatOrchestrator::new(self.provider, tools, settings)),
            keep_alive_interval_seconds: 15,
            max_connections: 64,
        }
    }

    pub fn build(self) -> Router {
        server::build_app(self.state(), 30)
    }
}

/// Create a test app with default fakes.
pub fn test_app() -> Router {
    TestApp::new().build()
}

// ============================================================================
// Workout Fixtures
// ============================================================================

pub fn routine(id: &str, name: &str, day: u32) -> Routine {
    Routine {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        exercises: vec![Exercise {
            name: "Back Squat".to_string(),
            sets: Some(5),
            reps: Some("5".to_string()),
            rest_seconds: Some(180),
            notes: None,
        }],
        created_at: Utc.with_ymd_and_hms(2026, 4, day, 9, 0, 0).unwrap(),
    }
}

pub fn sample_store() -> InMemoryWorkoutStore {
    InMemoryWorkoutStore::new()
        .with_routine(USER_ID, routine("r1", "Leg Day", 1))
        .with_routine(USER_ID, routine("r2", "Upper Body", 2))
        .with_routine(OTHER_USER_ID, routine("r3", "Someone Else's Day", 3))
        .with_program(
            USER_ID,
            WorkoutProgram {
                id: "p1".to_string(),
                name: "Beginner Strength".to_string(),
                description: Some("Linear progression".to_string()),
                duration_weeks: Some(8),
                days_per_week: Some(3),
                routines: vec![routine("r1", "Leg Day", 1)],
                created_at: Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap(),
            },
        )
}

// ============================================================================
// Fake Providers
// ============================================================================

pub type Script = Vec<Result<StreamEvent, LLMError>>;

/// Provider that replays one scripted stream per call and records requests.
pub struct ScriptedProvider {
    scripts: Mutex<VecDeque<Script>>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream, LLMError> {
        self.requests.lock().unwrap().push(request);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LLMError::Api {
                status: 401,
                message: "invalid api key sk-secret".to_string(),
            })?;
        Ok(Box::pin(stream::iter(script)))
    }
}

/// Provider that emits one token, then never finishes.
pub struct StallingProvider;

#[async_trait]
impl LLMProvider for StallingProvider {
    async fn chat_stream(&self, _request: ChatRequest) -> Result<ChatStream, LLMError> {
        let first = stream::iter(vec![Ok(token("Thinking"))]);
        Ok(Box::pin(first.chain(stream::pending())))
    }
}

/// Provider with an endless token stream that flags when it is dropped.
pub struct EndlessProvider {
    pub dropped: Arc<AtomicBool>,
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl LLMProvider for EndlessProvider {
    async fn chat_stream(&self, _request: ChatRequest) -> Result<ChatStream, LLMError> {
        let flag = DropFlag(Arc::clone(&self.dropped));
        Ok(Box::pin(stream::unfold(flag, |flag| async move {
            tokio::task::yield_now().await;
            Some((Ok(token("rep ")), flag))
        })))
    }
}

pub fn token(text: &str) -> StreamEvent {
    StreamEvent::Token(text.to_string())
}

pub fn done(reason: &str) -> StreamEvent {
    StreamEvent::Done {
        finish_reason: Some(reason.to_string()),
        usage: None,
    }
}

pub fn tool_calls(id: &str, name: &str, arguments: &str) -> StreamEvent {
    StreamEvent::ToolCalls(vec![ToolCall::new(id, name, arguments)])
}

// ============================================================================
// SSE Helpers
// ============================================================================

/// Parse an SSE body into `(event, data)` pairs. Comments are ignored.
pub fn parse_sse_events(body: &str) -> Vec<(String, String)> {
    let mut events = Vec::new();
    let mut current_event = String::new();
    let mut current_data = String::new();

    for line in body.lines() {
        if let Some(event_name) = line.strip_prefix("event:") {
            current_event = event_name.trim().to_string();
        } else if let Some(data) = line.strip_prefix("data:") {
            current_data = data.trim().to_string();
        } else if line.is_empty() && !current_event.is_empty() {
            events.push((
                std::mem::take(&mut current_event),
                std::mem::take(&mut current_data),
            ));
        }
    }

    if !current_event.is_empty() {
        events.push((current_event, current_data));
    }

    events
}

pub fn session_cookie(token: &str) -> String {
    format!("session_token={token}")
}
