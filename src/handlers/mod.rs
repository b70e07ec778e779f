// ABOUTME: Request handler contract shared by the nutrition, recipe, and tracking agents
// ABOUTME: Handler ids, identities, request/response envelopes, handoffs, and the RequestHandler trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

//! # Request Handlers
//!
//! Every specialist agent implements [`RequestHandler`]. The coordinator
//! only sees the trait: it picks a primary handler, hands it a
//! [`HandlerRequest`], and receives a [`HandlerResponse`] envelope whose
//! payload is a per-handler tagged union (see [`payload`]).
//!
//! Handlers classify the message into their own local subtype, gather data
//! from the provider adapters or the stores, and ask their
//! [`TextGenerator`](crate::llm::TextGenerator) for prose where a report
//! needs it.

/// Food analysis, search, and recipe nutrition
pub mod nutrition;

/// Per-handler payload unions
pub mod payload;

/// Recipe discovery, meal plans, and substitutions
pub mod recipe;

/// Daily, weekly, and monthly tracking reports
pub mod tracking;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::NutritionPolicyConfig;
use crate::errors::AppResult;
use crate::history::ConversationHistory;
use crate::llm::{user_id_of, GeneratorConfig, LlmProvider, TextGenerator};
use crate::logging::AppLogger;
use crate::models::{Recipe, UserProfile};
use crate::stores::{ChatTurnStore, MealLogStore, UserProfileStore};

pub use nutrition::NutritionHandler;
pub use payload::{HandlerPayload, NutritionPayload, RecipePayload, TrackingPayload};
pub use recipe::RecipeHandler;
pub use tracking::TrackingHandler;

/// Identifier of a specialist handler, in tie-break order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerId {
    /// Nutrition analysis
    Nutrition,
    /// Recipe discovery
    Recipe,
    /// Diet tracking
    Tracking,
}

impl HandlerId {
    /// Every handler, in tie-break order
    pub const ALL: [Self; 3] = [Self::Nutrition, Self::Recipe, Self::Tracking];

    /// Lowercase id
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Nutrition => "nutrition",
            Self::Recipe => "recipe",
            Self::Tracking => "tracking",
        }
    }

    /// Agent name the handler speaks as
    #[must_use]
    pub const fn agent_name(&self) -> &'static str {
        match self {
            Self::Nutrition => "NutritionCalculator",
            Self::Recipe => "RecipeFinder",
            Self::Tracking => "DietTracker",
        }
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coordinator-level request subtype
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Analyze a food's nutrients
    AnalyzeFood,
    /// Search the food database
    SearchFood,
    /// Find recipes
    FindRecipes,
    /// Log something eaten
    LogFood,
    /// Daily summary or progress
    DailySummary,
    /// Suggestions and advice
    Recommendations,
    /// Totals and per-meal breakdown of a day's food log
    DailyAnalysis,
    /// Nutrition, difficulty, and improvements of one recipe
    RecipeAnalysis,
    /// Anything else
    #[default]
    General,
}

impl RequestKind {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AnalyzeFood => "analyze_food",
            Self::SearchFood => "search_food",
            Self::FindRecipes => "find_recipes",
            Self::LogFood => "log_food",
            Self::DailySummary => "daily_summary",
            Self::Recommendations => "recommendations",
            Self::DailyAnalysis => "daily_analysis",
            Self::RecipeAnalysis => "recipe_analysis",
            Self::General => "general",
        }
    }

    /// Handler that must answer this kind regardless of keyword scores
    #[must_use]
    pub const fn owner(&self) -> Option<HandlerId> {
        match self {
            Self::DailyAnalysis => Some(HandlerId::Nutrition),
            Self::RecipeAnalysis => Some(HandlerId::Recipe),
            _ => None,
        }
    }

    /// Kind named by the context's `request_type`, if it names one
    #[must_use]
    pub fn requested(context: &Map<String, Value>) -> Option<Self> {
        context
            .get(REQUEST_TYPE_KEY)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

/// Context key that selects a request kind explicitly
pub const REQUEST_TYPE_KEY: &str = "request_type";

/// Outcome status of a handler response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// The request was answered
    Success,
    /// Nothing to report yet
    NoData,
    /// The handler failed
    Error,
    /// Informational answer, nothing was computed
    Info,
}

impl ResponseStatus {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NoData => "no_data",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// Who a handler is: name, role, and advertised capabilities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerIdentity {
    /// Agent name
    pub name: String,
    /// One-line role description
    pub role: String,
    /// Capability descriptions
    pub capabilities: Vec<String>,
}

impl HandlerIdentity {
    /// Build an identity from borrowed capability names
    pub fn new(name: impl Into<String>, role: impl Into<String>, capabilities: &[&str]) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            capabilities: capabilities.iter().map(|c| (*c).to_owned()).collect(),
        }
    }
}

/// Data passed from the primary handler to a collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Handoff {
    /// Nutrient targets taken from an analyzed food
    NutrientCriteria {
        /// Analyzed food
        food: String,
        /// Calories of the analyzed quantity
        calories: f64,
        /// Protein of the analyzed quantity
        protein: f64,
    },
    /// A recipe whose nutrition should be computed
    RecipeToAnalyze(Recipe),
    /// A primary payload to record for the user
    TrackData(Value),
    /// No specific template applies
    Generic {
        /// Handler that produced the primary response
        from: HandlerId,
    },
}

/// One request as seen by a handler
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Sanitized message text
    pub message: String,
    /// Coordinator-level subtype
    pub kind: RequestKind,
    /// Sanitized context; always carries `user_id` when built by the coordinator
    pub context: Map<String, Value>,
    /// Data from the primary handler when this is a collaboration
    pub handoff: Option<Handoff>,
}

impl HandlerRequest {
    /// Request for `message` with an empty context
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: RequestKind::General,
            context: Map::new(),
            handoff: None,
        }
    }

    /// Set the coordinator-level subtype
    #[must_use]
    pub const fn with_kind(mut self, kind: RequestKind) -> Self {
        self.kind = kind;
        self
    }

    /// Replace the context
    #[must_use]
    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    /// Set the `user_id` context entry
    #[must_use]
    pub fn with_user(mut self, user_id: &str) -> Self {
        self.context
            .insert("user_id".to_owned(), Value::from(user_id));
        self
    }

    /// Attach a handoff from the primary handler
    #[must_use]
    pub fn with_handoff(mut self, handoff: Handoff) -> Self {
        self.handoff = Some(handoff);
        self
    }

    /// `user_id` from the context, or the anonymous id
    #[must_use]
    pub fn user_id(&self) -> &str {
        user_id_of(&self.context)
    }

    /// Lowercased message for keyword tests
    #[must_use]
    pub fn lowercase(&self) -> String {
        self.message.to_lowercase()
    }
}

/// Envelope every handler returns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    /// Producing handler
    pub handler: HandlerId,
    /// Outcome
    pub status: ResponseStatus,
    /// Handler-specific data
    pub payload: HandlerPayload,
    /// Human-readable text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl HandlerResponse {
    fn with_status(
        handler: HandlerId,
        status: ResponseStatus,
        payload: HandlerPayload,
        text: impl Into<String>,
    ) -> Self {
        Self {
            handler,
            status,
            payload,
            text: Some(text.into()),
        }
    }

    /// Successful response
    pub fn success(handler: HandlerId, payload: HandlerPayload, text: impl Into<String>) -> Self {
        Self::with_status(handler, ResponseStatus::Success, payload, text)
    }

    /// Nothing to report
    pub fn no_data(handler: HandlerId, payload: HandlerPayload, text: impl Into<String>) -> Self {
        Self::with_status(handler, ResponseStatus::NoData, payload, text)
    }

    /// Informational answer
    pub fn info(handler: HandlerId, payload: HandlerPayload, text: impl Into<String>) -> Self {
        Self::with_status(handler, ResponseStatus::Info, payload, text)
    }

    /// Generic failure tagged with the agent name; carries no error detail
    #[must_use]
    pub fn failure(handler: HandlerId) -> Self {
        Self::with_status(
            handler,
            ResponseStatus::Error,
            HandlerPayload::Empty,
            format!("Agent {} encountered an error", handler.agent_name()),
        )
    }

    /// Whether the handler produced usable output
    #[must_use]
    pub const fn is_useful(&self) -> bool {
        !matches!(self.status, ResponseStatus::Error)
    }
}

/// Contract every specialist handler implements
///
/// Handlers are shared as `Arc<dyn RequestHandler>` and invoked concurrently
/// for different users. Implementors write [`process`](Self::process) with
/// ordinary `?` propagation; the provided [`handle`](Self::handle) is the
/// boundary that logs a failure and converts it into an error response, so
/// no error ever reaches the coordinator.
///
/// # Design Notes
///
/// - `identity()` returns a reference to data fixed at construction, so two
///   calls always yield identical capability lists
/// - `supported_requests()` and `data_sources()` feed the coordinator's
///   capability report
/// - Local subtype classification is each handler's own business
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Which handler this is
    fn id(&self) -> HandlerId;

    /// Name, role, and capability list
    fn identity(&self) -> &HandlerIdentity;

    /// Local subtypes this handler dispatches to
    fn supported_requests(&self) -> &'static [&'static str];

    /// Data the handler draws from
    fn data_sources(&self) -> &'static [&'static str];

    /// Handle one request, propagating internal failures
    ///
    /// # Errors
    ///
    /// Returns an error for internal failures; remote-service failures are
    /// expected to be absorbed by falling back to another data path.
    async fn process(&self, request: &HandlerRequest) -> AppResult<HandlerResponse>;

    /// Handle one request; never fails
    async fn handle(&self, request: &HandlerRequest) -> HandlerResponse {
        match self.process(request).await {
            Ok(response) => response,
            Err(error) => {
                AppLogger::log_handler_failure(
                    &self.identity().name,
                    Some(request.user_id()),
                    &error.to_string(),
                );
                HandlerResponse::failure(self.id())
            }
        }
    }
}

/// Collaborators every handler is built from
#[derive(Clone)]
pub struct HandlerDeps {
    /// Text-generation backend shared by every agent
    pub llm: Arc<dyn LlmProvider>,
    /// Per-user prompt history shared by every agent
    pub history: Arc<dyn ConversationHistory>,
    /// Generator tuning applied to each agent's generator
    pub generator: GeneratorConfig,
    /// Profile lookups
    pub profiles: Arc<dyn UserProfileStore>,
    /// Meal log
    pub meals: Arc<dyn MealLogStore>,
    /// Persisted chat turns
    pub chats: Arc<dyn ChatTurnStore>,
    /// Energy, goal, and insight policy
    pub policy: NutritionPolicyConfig,
}

impl HandlerDeps {
    /// A text generator speaking as `identity`
    #[must_use]
    pub fn generator_for(&self, identity: HandlerIdentity) -> TextGenerator {
        TextGenerator::new(
            identity,
            self.llm.clone(),
            self.history.clone(),
            self.generator.clone(),
        )
    }
}

/// Profile from the request context, falling back to the profile store
///
/// A context `user_profile` object wins so callers can pass an ad hoc
/// profile. Store failures are logged and treated as "no profile".
pub async fn load_profile(
    profiles: &dyn UserProfileStore,
    request: &HandlerRequest,
) -> Option<UserProfile> {
    if let Some(value) = request.context.get("user_profile") {
        match serde_json::from_value::<UserProfile>(value.clone()) {
            Ok(profile) => return Some(profile),
            Err(e) => debug!(error = %e, "Ignoring malformed user_profile in context"),
        }
    }
    match profiles.get_profile(request.user_id()).await {
        Ok(profile) => profile,
        Err(e) => {
            debug!(error = %e, user.id = %request.user_id(), "Profile lookup failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::InMemoryStore;
    use serde_json::json;

    #[test]
    fn test_handler_order_and_names() {
        assert_eq!(
            HandlerId::ALL.map(|id| id.as_str()),
            ["nutrition", "recipe", "tracking"]
        );
        assert!(HandlerId::Nutrition < HandlerId::Tracking);
        assert_eq!(HandlerId::Recipe.agent_name(), "RecipeFinder");
    }

    #[test]
    fn test_failure_response_hides_detail() {
        let response = HandlerResponse::failure(HandlerId::Tracking);
        assert_eq!(response.status, ResponseStatus::Error);
        assert_eq!(
            response.text.as_deref(),
            Some("Agent DietTracker encountered an error")
        );
        assert!(!response.is_useful());
    }

    #[test]
    fn test_request_user_defaults_to_anonymous() {
        let request = HandlerRequest::new("hi");
        assert_eq!(request.user_id(), "anonymous");
        assert_eq!(request.with_user("u7").user_id(), "u7");
    }

    #[tokio::test]
    async fn test_context_profile_wins_over_store() {
        let store = InMemoryStore::new();
        store
            .save_profile(
                "u1",
                UserProfile {
                    age: Some(50),
                    ..UserProfile::default()
                },
            )
            .await
            .unwrap();

        let stored = HandlerRequest::new("x").with_user("u1");
        assert_eq!(load_profile(&store, &stored).await.unwrap().age, Some(50));

        let mut context = Map::new();
        context.insert("user_id".to_owned(), json!("u1"));
        context.insert("user_profile".to_owned(), json!({"age": 30, "allergies": ["nuts"]}));
        let inline = HandlerRequest::new("x").with_context(context);
        let profile = load_profile(&store, &inline).await.unwrap();
        assert_eq!(profile.age, Some(30));
        assert_eq!(profile.allergies, vec!["nuts".to_owned()]);
    }
}
