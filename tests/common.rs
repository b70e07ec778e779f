// ABOUTME: Shared test utilities for the integration tests
// ABOUTME: Scripted LLM provider, in-memory handler dependencies, and meal log fixtures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used
)]
//! Shared test utilities for `platewise`

use std::collections::VecDeque;
use std::env;
use std::sync::{Arc, Mutex, Once};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use platewise::config::NutritionPolicyConfig;
use platewise::coordinator::{Coordinator, DataSources};
use platewise::errors::{AppError, ErrorCode};
use platewise::handlers::HandlerDeps;
use platewise::history::BoundedHistory;
use platewise::llm::{ChatRequest, ChatResponse, GeneratorConfig, LlmProvider};
use platewise::models::{MealLogEntry, MealType, NutrientProfile};
use platewise::stores::InMemoryStore;
use serde_json::{Map, Value};
use tracing::Level;
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };
        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// One scripted provider reply
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(ErrorCode, String),
}

/// LLM provider replaying queued replies, then a fixed default
pub struct ScriptedLlm {
    queue: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    healthy: bool,
    calls: Mutex<Vec<(Instant, String)>>,
}

impl ScriptedLlm {
    /// Always answers `text`
    pub fn replying(text: &str) -> Self {
        Self::with_fallback(Reply::Text(text.to_owned()), true)
    }

    /// Always fails with `code` and `message`
    pub fn failing(code: ErrorCode, message: &str) -> Self {
        Self::with_fallback(Reply::Fail(code, message.to_owned()), false)
    }

    fn with_fallback(fallback: Reply, healthy: bool) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback,
            healthy,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply ahead of the default
    pub fn then(self, reply: Reply) -> Self {
        self.queue.lock().unwrap().push_back(reply);
        self
    }

    /// Start instant and prompt text of every `complete` call
    pub fn calls(&self) -> Vec<(Instant, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Start instants of every `complete` call
    pub fn call_times(&self) -> Vec<Instant> {
        self.calls().into_iter().map(|(at, _)| at).collect()
    }

    /// Prompt text of every `complete` call
    pub fn prompts(&self) -> Vec<String> {
        self.calls().into_iter().map(|(_, prompt)| prompt).collect()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn display_name(&self) -> &'static str {
        "Scripted test provider"
    }

    fn default_model(&self) -> &str {
        "scripted-1"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let started = Instant::now();
        let prompt = request
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.calls.lock().unwrap().push((started, prompt));

        let reply = self
            .queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match reply {
            Reply::Text(content) => Ok(ChatResponse {
                content,
                model: "scripted-1".to_owned(),
                usage: None,
                finish_reason: Some("stop".to_owned()),
            }),
            Reply::Fail(code, message) => Err(AppError::new(code, message)),
        }
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(self.healthy)
    }
}

/// Handler dependencies over one in-memory store
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub llm: Arc<ScriptedLlm>,
    pub deps: HandlerDeps,
}

impl Harness {
    /// Harness with no spacing between generation calls
    pub fn new(llm: ScriptedLlm) -> Self {
        Self::with_interval(llm, Duration::ZERO)
    }

    /// Harness with `min_interval` between generation calls
    pub fn with_interval(llm: ScriptedLlm, min_interval: Duration) -> Self {
        init_test_logging();
        let store = Arc::new(InMemoryStore::new());
        let llm = Arc::new(llm);
        let deps = HandlerDeps {
            llm: llm.clone(),
            history: Arc::new(BoundedHistory::new(20)),
            generator: GeneratorConfig {
                min_interval,
                ..GeneratorConfig::default()
            },
            profiles: store.clone(),
            meals: store.clone(),
            chats: store.clone(),
            policy: NutritionPolicyConfig::default(),
        };
        Self { store, llm, deps }
    }

    /// Coordinator over the built-in food table and recipe catalog
    pub fn coordinator(&self) -> Coordinator {
        Coordinator::with_sources(&self.deps, DataSources::offline()).unwrap()
    }
}

/// Context carrying only `user_id`
pub fn user_context(user_id: &str) -> Map<String, Value> {
    let mut context = Map::new();
    context.insert("user_id".to_owned(), Value::from(user_id));
    context
}

/// Meal log entry for `user_id` at `logged_at`
pub fn meal(
    user_id: &str,
    logged_at: DateTime<Utc>,
    food: &str,
    meal_type: MealType,
    calories: f64,
    protein: f64,
) -> MealLogEntry {
    MealLogEntry {
        id: Uuid::new_v4(),
        user_id: user_id.to_owned(),
        logged_at,
        food_name: food.to_owned(),
        meal_type,
        quantity_g: 100.0,
        nutrients: NutrientProfile::new(calories, protein, 30.0, 10.0, 3.0, 5.0, 200.0),
    }
}
