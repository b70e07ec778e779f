// ABOUTME: Integration tests for the coordinator's failure isolation, synthesis, and reporting
// ABOUTME: Uses stub handlers that fail or panic alongside the real handlers over in-memory stores
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::{user_context, Harness, ScriptedLlm};
use futures_util::future::join_all;
use platewise::coordinator::{
    Coordinator, CoordinatorFailure, CoordinatorOutcome, FailureStatus, SYNTHESIS_FALLBACK,
};
use platewise::errors::{AppError, AppResult, ErrorCode};
use platewise::handlers::{
    HandlerId, HandlerIdentity, HandlerRequest, HandlerResponse, RequestHandler, RequestKind,
    ResponseStatus,
};
use platewise::health::HealthStatus;
use platewise::history::ConversationHistory;
use platewise::llm::{FailureKind, ANONYMOUS_USER};
use platewise::stores::{ChatTurnStore, MealLogStore};
use serde_json::{json, Map};

/// Nutrition stand-in that always fails, either by error or by panic
struct BrokenHandler {
    identity: HandlerIdentity,
    panics: bool,
}

impl BrokenHandler {
    fn new(panics: bool) -> Self {
        Self {
            identity: HandlerIdentity::new("NutritionCalculator", "Broken", &["Nothing"]),
            panics,
        }
    }
}

#[async_trait]
impl RequestHandler for BrokenHandler {
    fn id(&self) -> HandlerId {
        HandlerId::Nutrition
    }

    fn identity(&self) -> &HandlerIdentity {
        &self.identity
    }

    fn supported_requests(&self) -> &'static [&'static str] {
        &["general"]
    }

    fn data_sources(&self) -> &'static [&'static str] {
        &[]
    }

    async fn process(&self, _request: &HandlerRequest) -> AppResult<HandlerResponse> {
        if self.panics {
            panic!("secret stack detail");
        }
        Err(AppError::internal("database password rejected"))
    }
}

fn assert_hides_detail(outcome: &CoordinatorOutcome) {
    let json = serde_json::to_string(outcome).unwrap();
    assert!(!json.contains("secret"));
    assert!(!json.contains("password"));
}

#[tokio::test]
async fn test_handler_error_becomes_generic_failure() {
    let harness = Harness::new(ScriptedLlm::replying("ok"));
    let coordinator = Coordinator::new(&harness.deps, vec![Arc::new(BrokenHandler::new(false))]);

    let outcome = coordinator
        .process("u1", "hello there", user_context("u1"))
        .await;
    assert_eq!(outcome.status(), "error");
    let response = outcome.response().unwrap();
    assert_eq!(response.primary_response.status, ResponseStatus::Error);
    assert_eq!(
        outcome.display_text(),
        "Agent NutritionCalculator encountered an error"
    );
    assert_hides_detail(&outcome);
}

#[tokio::test]
async fn test_handler_panic_is_contained() {
    let harness = Harness::new(ScriptedLlm::replying("ok"));
    let coordinator = Coordinator::new(&harness.deps, vec![Arc::new(BrokenHandler::new(true))]);

    let outcome = coordinator
        .process("u2", "hello there", user_context("u2"))
        .await;
    assert_eq!(outcome.status(), "error");
    assert_eq!(
        outcome.display_text(),
        "Agent NutritionCalculator encountered an error"
    );
    assert_hides_detail(&outcome);

    // The coordinator keeps serving after a panic.
    let again = coordinator.process("u2", "hello", user_context("u2")).await;
    assert_eq!(again.status(), "error");
}

#[tokio::test]
async fn test_failed_collaborator_skips_synthesis() {
    let harness = Harness::new(ScriptedLlm::replying("ok"));
    let coordinator = Coordinator::new(&harness.deps, vec![Arc::new(BrokenHandler::new(false))]);

    // Tracking is routed to but not registered.
    let outcome = coordinator
        .process("u3", "track my calories", user_context("u3"))
        .await;
    let response = outcome.response().unwrap();
    assert_eq!(response.primary_handler, HandlerId::Nutrition);
    assert_eq!(
        response.collaborations[&HandlerId::Tracking].status,
        ResponseStatus::Error
    );
    assert!(response.synthesis.is_none());
}

#[tokio::test]
async fn test_blank_message_is_rejected() {
    let harness = Harness::new(ScriptedLlm::replying("ok"));
    let coordinator = harness.coordinator();

    for message in ["", "   \n\t"] {
        let outcome = coordinator.process("u4", message, user_context("u4")).await;
        let CoordinatorOutcome::Failed(failure) = &outcome else {
            panic!("blank message should fail: {outcome:?}");
        };
        assert_eq!(failure.status, FailureStatus::Error);
        assert_eq!(failure.coordinator, "AgentCoordinator");
    }
    assert!(harness.llm.prompts().is_empty());
}

#[tokio::test]
async fn test_markup_is_neutralized_before_routing() {
    let harness = Harness::new(ScriptedLlm::replying("ok"));
    let coordinator = harness.coordinator();

    let outcome = coordinator
        .process("u5", "analyze <b>eggs</b>", user_context("u5"))
        .await;
    assert_eq!(outcome.status(), "success");

    let turns = harness.store.recent_turns("u5", 5).await.unwrap();
    assert_eq!(turns.len(), 1);
    assert!(!turns[0].message.contains('<'));
    assert!(harness.llm.prompts().iter().all(|prompt| !prompt.contains("<b>")));
}

#[tokio::test]
async fn test_synthesis_falls_back_when_generation_fails() {
    let harness = Harness::new(ScriptedLlm::failing(
        ErrorCode::ExternalServiceUnavailable,
        "backend down",
    ));
    let coordinator = harness.coordinator();

    let outcome = coordinator
        .process("u6", "track my calories", user_context("u6"))
        .await;
    let response = outcome.response().unwrap();
    assert_eq!(response.primary_handler, HandlerId::Nutrition);
    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(
        response.collaborations[&HandlerId::Tracking].status,
        ResponseStatus::Success
    );
    assert_eq!(response.synthesis.as_deref(), Some(SYNTHESIS_FALLBACK));
    assert_eq!(outcome.display_text(), SYNTHESIS_FALLBACK);
}

#[tokio::test]
async fn test_synthesis_uses_generated_text() {
    let harness = Harness::new(ScriptedLlm::replying("Unified answer."));
    let coordinator = harness.coordinator();

    let outcome = coordinator
        .process("u7", "track my calories", user_context("u7"))
        .await;
    assert_eq!(outcome.display_text(), "Unified answer.");

    let prompts = harness.llm.prompts();
    let last = prompts.last().unwrap();
    assert!(last.contains("You are NutritionCalculator"));
    assert!(last.contains("Primary Response:"));
    assert!(last.contains("Collaboration Responses:"));
}

#[tokio::test]
async fn test_synthesis_shares_nutrition_pacing_and_history() {
    let interval = Duration::from_millis(150);
    let harness = Harness::with_interval(ScriptedLlm::replying("Unified answer."), interval);
    let coordinator = harness.coordinator();

    let outcome = coordinator
        .process("u9", "track my calories", user_context("u9"))
        .await;
    assert_eq!(outcome.display_text(), "Unified answer.");

    let nutrition_calls: Vec<Instant> = harness
        .llm
        .calls()
        .into_iter()
        .filter(|(_, prompt)| prompt.contains("You are NutritionCalculator"))
        .map(|(at, _)| at)
        .collect();
    assert_eq!(nutrition_calls.len(), 2);
    assert!(
        nutrition_calls[1].duration_since(nutrition_calls[0]) + Duration::from_millis(10)
            >= interval
    );

    let history = &harness.deps.history;
    let turns = history.recent("NutritionCalculator", "u9", 10);
    assert_eq!(turns.len(), 2);
    assert!(turns[1].prompt.starts_with("Synthesize these responses"));
    assert_eq!(history.len("AgentCoordinator", "u9"), 0);
    assert_eq!(history.len("DietTracker", "u9"), 0);
}

#[tokio::test]
async fn test_request_type_selects_recipe_analysis() {
    let harness = Harness::new(ScriptedLlm::replying("Looks balanced."));
    let coordinator = harness.coordinator();

    let mut context = user_context("u10");
    context.insert("request_type".to_owned(), json!("recipe_analysis"));
    context.insert(
        "recipe".to_owned(),
        json!({"name": "Rice Bowl", "ingredients": ["200g rice", "100g chicken"], "servings": 2}),
    );
    let outcome = coordinator
        .process("u10", "analyze this recipe", context)
        .await;
    let response = outcome.response().unwrap();
    assert_eq!(response.primary_handler, HandlerId::Recipe);
    assert_eq!(response.request_kind, RequestKind::RecipeAnalysis);
    let primary = serde_json::to_value(&response.primary_response.payload).unwrap();
    assert_eq!(primary["type"], "recipe_analysis");

    // The analyzed recipe is handed to nutrition for totals.
    let nutrition = serde_json::to_value(&response.collaborations[&HandlerId::Nutrition].payload)
        .unwrap();
    assert_eq!(nutrition["type"], "recipe");
    assert_eq!(nutrition["total"]["calories"], 425.0);
    assert_eq!(nutrition["per_serving"]["calories"], 212.5);

    let mut unknown = user_context("u11");
    unknown.insert("request_type".to_owned(), json!("make_coffee"));
    let outcome = coordinator
        .process("u11", "analyze this recipe", unknown)
        .await;
    let response = outcome.response().unwrap();
    assert_eq!(response.primary_handler, HandlerId::Nutrition);
    assert_eq!(response.request_kind, RequestKind::AnalyzeFood);
}

#[tokio::test]
async fn test_completed_request_records_chat_turn() {
    let harness = Harness::new(ScriptedLlm::replying("ok"));
    let coordinator = harness.coordinator();

    let mut context = user_context("u8");
    context.insert("session_id".to_owned(), "s-42".into());
    coordinator.process("u8", "analyze two eggs", context).await;

    let turns = harness.store.recent_turns("u8", 5).await.unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].session_id.as_deref(), Some("s-42"));
    assert_eq!(turns[0].producing_handler, "NutritionCalculator");
    assert!(turns[0].response_text.contains("Nutrition Analysis"));
}

#[tokio::test]
async fn test_missing_user_is_anonymous() {
    let harness = Harness::new(ScriptedLlm::replying("ok"));
    let coordinator = harness.coordinator();

    coordinator.process("", "analyze one banana", Map::new()).await;
    let logged = harness.store.entries_since(ANONYMOUS_USER, 1).await.unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].food_name, "banana");
}

#[tokio::test]
async fn test_concurrent_users_stay_isolated() {
    let harness = Harness::new(ScriptedLlm::replying("ok"));
    let coordinator = harness.coordinator();
    let users: Vec<String> = (0..5).map(|i| format!("user-{i}")).collect();

    let outcomes = join_all(users.iter().map(|user| {
        coordinator.process(user, "analyze two eggs", user_context(user))
    }))
    .await;
    assert!(outcomes.iter().all(|outcome| outcome.status() == "success"));

    for user in &users {
        assert_eq!(harness.store.entries_since(user, 1).await.unwrap().len(), 1);
    }
    assert_eq!(harness.store.meal_count().await, users.len());
}

#[test]
fn test_canned_failures_match_failure_kinds() {
    let quota = CoordinatorFailure::canned(FailureKind::Quota.into());
    assert_eq!(quota.status, FailureStatus::QuotaExceeded);
    assert!(quota.error.starts_with("API quota limit reached"));
    assert!(quota.suggestion.is_some());

    let config = CoordinatorFailure::canned(FailureKind::Config.into());
    assert_eq!(config.status, FailureStatus::ConfigError);
    assert!(config.error.contains("check your API keys"));

    let other = CoordinatorFailure::canned(FailureKind::Other.into());
    assert_eq!(CoordinatorOutcome::Failed(other).status(), "error");
}

#[tokio::test]
async fn test_system_status_reports_every_handler() {
    let harness = Harness::new(ScriptedLlm::replying("ok"));
    let coordinator = harness.coordinator();

    let status = coordinator.system_status().await;
    assert_eq!(status.total_agents, 3);
    assert_eq!(status.agent_statuses.len(), 3);
    assert_eq!(status.health.status, HealthStatus::Healthy);
    assert!(status
        .health
        .checks
        .iter()
        .any(|check| check.name == "text_generation" && check.status == HealthStatus::Healthy));
}

#[tokio::test]
async fn test_unavailable_backend_degrades_status() {
    let harness = Harness::new(ScriptedLlm::failing(ErrorCode::ConfigMissing, "no key"));
    let coordinator = harness.coordinator();

    let status = coordinator.system_status().await;
    assert_eq!(status.coordinator_status, HealthStatus::Healthy);
    assert_eq!(status.health.status, HealthStatus::Degraded);
}

#[tokio::test]
async fn test_capabilities_are_stable() {
    let harness = Harness::new(ScriptedLlm::replying("ok"));
    let coordinator = harness.coordinator();

    let first = serde_json::to_value(coordinator.capabilities()).unwrap();
    let second = serde_json::to_value(coordinator.capabilities()).unwrap();
    assert_eq!(first, second);

    let report = coordinator.capabilities();
    assert_eq!(report.total_agents, 3);
    assert_eq!(report.routing_rules.get("recipe"), Some(&HandlerId::Recipe));
    let names: Vec<&str> = report
        .agent_capabilities
        .iter()
        .map(|agent| agent.identity.name.as_str())
        .collect();
    assert_eq!(names, vec!["NutritionCalculator", "RecipeFinder", "DietTracker"]);
    assert!(report.agent_capabilities[2]
        .supported_requests
        .contains(&"weekly_progress".to_owned()));
}
