// ABOUTME: Fail-soft text generator wrapping an LlmProvider for one agent
// ABOUTME: Builds role prompts with context and history, spaces calls, and returns canned text on failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

//! Per-agent text generation
//!
//! Each agent owns one [`TextGenerator`]. A generator serializes its calls
//! behind a single timestamp so two consecutive completions start at least
//! `min_interval` apart; concurrent callers queue on the same lock. A
//! successful completion is appended to the injected
//! [`ConversationHistory`] and the last few turns this agent had with the
//! same user are replayed into later prompts.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use super::{ChatMessage, ChatRequest, ChatResponse, LlmProvider};
use crate::config::LlmConfig;
use crate::errors::{AppError, AppResult};
use crate::handlers::HandlerIdentity;
use crate::history::{ConversationHistory, HistoryTurn};
use crate::logging::AppLogger;

/// User id used when the context carries none
pub const ANONYMOUS_USER: &str = "anonymous";

/// Generator tuning
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Minimum gap between the starts of two calls
    pub min_interval: Duration,
    /// History turns embedded in each prompt
    pub history_turns: usize,
    /// Characters kept from each history prompt and response
    pub history_entry_chars: usize,
    /// Model override; the provider default is used otherwise
    pub model: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token cap
    pub max_tokens: Option<u32>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(1),
            history_turns: 5,
            history_entry_chars: 200,
            model: None,
            temperature: 0.7,
            max_tokens: None,
        }
    }
}

impl GeneratorConfig {
    /// Generator settings from the backend configuration
    #[must_use]
    pub fn from_llm_config(config: &LlmConfig) -> Self {
        Self {
            min_interval: config.min_interval(),
            history_turns: config.history_turns,
            model: Some(config.model.clone()),
            ..Self::default()
        }
    }
}

/// Coarse classification of a generation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Quota exhausted or rate limited
    Quota,
    /// Missing or rejected credentials
    Config,
    /// Anything else
    Other,
}

impl FailureKind {
    /// Classify by error code first, then by message text
    #[must_use]
    pub fn classify(error: &AppError) -> Self {
        if error.code.is_rate_limited() {
            return Self::Quota;
        }
        if error.code.is_configuration() {
            return Self::Config;
        }
        Self::from_message(&error.message)
    }

    /// Classify from an error message alone
    #[must_use]
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("429") || lower.contains("quota") || lower.contains("rate limit") {
            Self::Quota
        } else if lower.contains("api key") || lower.contains("401") || lower.contains("403") {
            Self::Config
        } else {
            Self::Other
        }
    }

    /// User-safe text returned in place of a completion
    #[must_use]
    pub const fn fallback_text(&self) -> &'static str {
        match self {
            Self::Quota => {
                "The AI service has reached its usage limit for now, so I can't write a detailed \
                 answer. Please try again later; food database lookups still work."
            }
            Self::Config => {
                "The AI service is not configured correctly, so I can't write a detailed answer \
                 right now. Please check the API key configuration."
            }
            Self::Other => {
                "I apologize, but I couldn't generate a detailed response right now. Please try \
                 again in a moment."
            }
        }
    }
}

/// Provider used when no backend is configured; every call fails soft
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProvider;

#[async_trait]
impl LlmProvider for OfflineProvider {
    fn name(&self) -> &'static str {
        "offline"
    }

    fn display_name(&self) -> &'static str {
        "Offline (no text generation)"
    }

    fn default_model(&self) -> &str {
        "none"
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
        Err(AppError::external_unavailable(
            "LLM",
            "no text-generation backend configured",
        ))
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(false)
    }
}

/// One agent's text generator
pub struct TextGenerator {
    identity: HandlerIdentity,
    provider: Arc<dyn LlmProvider>,
    history: Arc<dyn ConversationHistory>,
    config: GeneratorConfig,
    last_call: Mutex<Option<Instant>>,
}

impl TextGenerator {
    /// Create a generator speaking as `identity`
    pub fn new(
        identity: HandlerIdentity,
        provider: Arc<dyn LlmProvider>,
        history: Arc<dyn ConversationHistory>,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            identity,
            provider,
            history,
            config,
            last_call: Mutex::new(None),
        }
    }

    /// Identity embedded in the prompt preamble
    #[must_use]
    pub const fn identity(&self) -> &HandlerIdentity {
        &self.identity
    }

    /// Compose the full prompt: preamble, context, recent history, request
    #[must_use]
    pub fn build_prompt(&self, prompt: &str, context: &Map<String, Value>) -> String {
        let mut full = format!(
            "You are {}, a specialized AI agent for diet planning and nutrition management.\n\
             Your role: {}\n\
             Your capabilities: {}\n\n\
             You must:\n\
             1. Provide accurate, science-based nutrition information\n\
             2. Be helpful and supportive\n\
             3. Consider user's dietary restrictions and preferences\n\
             4. Respond in a structured, actionable format\n\
             5. Be transparent about limitations\n\
             6. Prioritize user safety and health\n",
            self.identity.name,
            self.identity.role,
            self.identity.capabilities.join(", ")
        );

        if !context.is_empty() {
            let rendered = serde_json::to_string_pretty(context).unwrap_or_default();
            let _ = write!(full, "\nContext: {rendered}\n");
        }

        let recent = self.history.recent(
            &self.identity.name,
            user_id_of(context),
            self.config.history_turns,
        );
        if !recent.is_empty() {
            full.push_str("\nRecent conversation:\n");
            for turn in &recent {
                let _ = writeln!(
                    full,
                    "User: {}\nAssistant: {}",
                    truncate_chars(&turn.prompt, self.config.history_entry_chars),
                    truncate_chars(&turn.response, self.config.history_entry_chars)
                );
            }
        }

        let _ = write!(
            full,
            "\nUser Request: {prompt}\n\nProvide a helpful, accurate response:"
        );
        full
    }

    /// Suspend until `min_interval` has passed since the previous call started
    async fn wait_for_slot(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.config.min_interval {
                let wait = self.config.min_interval - elapsed;
                debug!(agent = %self.identity.name, wait_ms = wait.as_millis() as u64, "Spacing generation call");
                sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Generate a completion, surfacing backend errors
    ///
    /// # Errors
    ///
    /// Returns the provider error unchanged.
    pub async fn try_generate(&self, prompt: &str, context: &Map<String, Value>) -> AppResult<String> {
        let full_prompt = self.build_prompt(prompt, context);
        let mut request = ChatRequest::new(vec![ChatMessage::user(full_prompt.clone())])
            .with_temperature(self.config.temperature);
        if let Some(model) = &self.config.model {
            request = request.with_model(model.clone());
        }
        if let Some(max_tokens) = self.config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        self.wait_for_slot().await;
        let started = Instant::now();
        let result = self.provider.complete(&request).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        AppLogger::log_generation(
            &self.identity.name,
            result.is_ok(),
            duration_ms,
            full_prompt.chars().count(),
        );

        let text = result?.content.trim().to_owned();
        self.history.append(
            user_id_of(context),
            HistoryTurn::now(prompt, text.clone(), self.identity.name.clone()),
        );
        Ok(text)
    }

    /// Generate a completion, replacing any failure with canned text
    pub async fn generate(&self, prompt: &str, context: &Map<String, Value>) -> String {
        match self.try_generate(prompt, context).await {
            Ok(text) => text,
            Err(error) => {
                let kind = FailureKind::classify(&error);
                warn!(
                    agent = %self.identity.name,
                    failure = ?kind,
                    error = %error,
                    "Text generation failed; using fallback text"
                );
                kind.fallback_text().to_owned()
            }
        }
    }
}

/// `user_id` from the context, or the anonymous id
#[must_use]
pub fn user_id_of(context: &Map<String, Value>) -> &str {
    context
        .get("user_id")
        .and_then(Value::as_str)
        .unwrap_or(ANONYMOUS_USER)
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_owned()
    } else {
        let mut cut: String = text.chars().take(max).collect();
        cut.push_str("...");
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::history::BoundedHistory;

    fn identity() -> HandlerIdentity {
        HandlerIdentity::new(
            "TestAgent",
            "Testing specialist",
            &["first capability", "second capability"],
        )
    }

    fn generator(history: Arc<BoundedHistory>) -> TextGenerator {
        TextGenerator::new(
            identity(),
            Arc::new(OfflineProvider),
            history,
            GeneratorConfig {
                min_interval: Duration::ZERO,
                ..GeneratorConfig::default()
            },
        )
    }

    #[test]
    fn test_prompt_sections_in_order() {
        let history = Arc::new(BoundedHistory::default());
        history.append("u1", HistoryTurn::now("earlier question", "x".repeat(300), "TestAgent"));
        history.append("u1", HistoryTurn::now("other agent question", "y", "OtherAgent"));
        let generator = generator(history);

        let mut context = Map::new();
        context.insert("user_id".to_owned(), Value::from("u1"));
        let prompt = generator.build_prompt("How much protein?", &context);

        let preamble = prompt.find("You are TestAgent").unwrap();
        let ctx = prompt.find("Context:").unwrap();
        let recent = prompt.find("Recent conversation:").unwrap();
        let request = prompt.find("User Request: How much protein?").unwrap();
        assert!(preamble < ctx && ctx < recent && recent < request);
        assert!(prompt.contains("first capability, second capability"));
        assert!(prompt.contains(&format!("{}...", "x".repeat(200))));
        assert!(!prompt.contains(&"x".repeat(201)));
        assert!(prompt.ends_with("Provide a helpful, accurate response:"));
        assert!(!prompt.contains("other agent question"));
    }

    #[test]
    fn test_empty_context_is_omitted() {
        let generator = generator(Arc::new(BoundedHistory::default()));
        let prompt = generator.build_prompt("hello", &Map::new());
        assert!(!prompt.contains("Context:"));
        assert!(!prompt.contains("Recent conversation:"));
    }

    #[test]
    fn test_failure_classification() {
        let rate = AppError::new(ErrorCode::ExternalRateLimited, "slow down");
        assert_eq!(FailureKind::classify(&rate), FailureKind::Quota);

        let auth = AppError::new(ErrorCode::ExternalAuthFailed, "denied");
        assert_eq!(FailureKind::classify(&auth), FailureKind::Config);

        let quota_text = AppError::external_service("LLM", "Resource has been exhausted (quota)");
        assert_eq!(FailureKind::classify(&quota_text), FailureKind::Quota);

        let key_text = AppError::external_service("LLM", "API key not valid");
        assert_eq!(FailureKind::classify(&key_text), FailureKind::Config);

        let other = AppError::external_service("LLM", "connection reset");
        assert_eq!(FailureKind::classify(&other), FailureKind::Other);
    }

    #[tokio::test]
    async fn test_offline_generation_fails_soft_without_history() {
        let history = Arc::new(BoundedHistory::default());
        let generator = generator(history.clone());
        let text = generator.generate("anything", &Map::new()).await;
        assert_eq!(text, FailureKind::Other.fallback_text());
        assert_eq!(history.len("TestAgent", ANONYMOUS_USER), 0);
    }
}
