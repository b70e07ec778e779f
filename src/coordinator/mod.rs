// ABOUTME: Coordinator routing each request to a primary handler plus collaborators
// ABOUTME: Sanitizes input, invokes handlers behind panic boundaries, synthesizes, and records the turn
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

//! # Coordinator
//!
//! Single entry point for user requests. One call to
//! [`Coordinator::process`] runs the whole pipeline:
//!
//! 1. sanitize the message and context; an empty message is rejected
//! 2. score handlers by keyword and select the primary ([`routing`])
//! 3. classify the coordinator-level subtype and pick collaborators; a
//!    `request_type` in the context overrides the classified subtype
//! 4. invoke the primary, then each collaborator with a request derived
//!    from the primary response ([`handoff`])
//! 5. synthesize one narrative when collaborators contributed, through the
//!    nutrition handler's generator when the coordinator was built by
//!    [`Coordinator::with_sources`]
//! 6. log the interaction and append a chat turn
//!
//! Handler failures become error responses inside the envelope; anything
//! else that goes wrong is classified once at the outer boundary into a
//! [`CoordinatorFailure`]. Callers never see an `Err`.

/// Configuration and data-source wiring
pub mod builder;
/// Collaborator request templates
pub mod handoff;
/// Response, failure, and report shapes
pub mod response;
/// Keyword intent analysis
pub mod routing;

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures_util::FutureExt;
use serde_json::{json, Map, Value};
use tracing::{debug, error, instrument, warn};

use crate::constants::agents::{
    COORDINATOR_NAME, COORDINATOR_PROTOCOLS, HANDLER_PROTOCOLS, ROUTING_METHOD,
};
use crate::errors::AppResult;
use crate::handlers::{
    HandlerDeps, HandlerId, HandlerIdentity, HandlerRequest, HandlerResponse, RequestHandler,
    RequestKind,
};
use crate::health::{ComponentHealth, HealthChecker, HealthStatus};
use crate::llm::{FailureKind, LlmProvider, TextGenerator, ANONYMOUS_USER};
use crate::logging::AppLogger;
use crate::models::ChatTurn;
use crate::sanitize::{sanitize_context, sanitize_text};
use crate::stores::ChatTurnStore;

pub use builder::{handler_deps, DataSources, Stores};
pub use handoff::collaboration_request;
pub use response::{
    CapabilityReport, CommunicationInfo, CoordinatorFailure, CoordinatorOutcome,
    CoordinatorResponse, FailureStatus, HandlerCapabilities, HandlerHealth, SystemStatus,
};
pub use routing::{HandlerScores, IntentAnalysis, IntentRouter};

/// Synthesis text used when the narrative cannot be generated
pub const SYNTHESIS_FALLBACK: &str =
    "Multiple agents have provided information to help answer your question.";

const EMPTY_MESSAGE: &str = "Please enter a question about nutrition, recipes, or your progress.";

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|item| (*item).to_owned()).collect()
}

/// Routes requests across the registered handlers
pub struct Coordinator {
    handlers: BTreeMap<HandlerId, Arc<dyn RequestHandler>>,
    router: IntentRouter,
    synthesizer: Arc<TextGenerator>,
    llm: Arc<dyn LlmProvider>,
    chats: Option<Arc<dyn ChatTurnStore>>,
    health: HealthChecker,
}

impl Coordinator {
    /// Coordinator over `handlers`, synthesizing with the backend in `deps`
    #[must_use]
    pub fn new(deps: &HandlerDeps, handlers: Vec<Arc<dyn RequestHandler>>) -> Self {
        let identity = HandlerIdentity::new(
            COORDINATOR_NAME,
            "Multi-agent coordination and response synthesis",
            &["Intent routing", "Agent collaboration", "Response synthesis"],
        );
        Self {
            handlers: handlers
                .into_iter()
                .map(|handler| (handler.id(), handler))
                .collect(),
            router: IntentRouter,
            synthesizer: Arc::new(deps.generator_for(identity)),
            llm: deps.llm.clone(),
            chats: None,
            health: HealthChecker::new(),
        }
    }

    /// Synthesize through `generator` instead of a coordinator-owned one
    ///
    /// Sharing a handler's generator shares its call spacing and history.
    #[must_use]
    pub fn with_synthesizer(mut self, generator: Arc<TextGenerator>) -> Self {
        self.synthesizer = generator;
        self
    }

    /// Append a chat turn to `chats` after every completed request
    #[must_use]
    pub fn with_chat_store(mut self, chats: Arc<dyn ChatTurnStore>) -> Self {
        self.chats = Some(chats);
        self
    }

    /// Handle one user message; never fails
    #[instrument(skip(self, message, context), fields(user.id = %user_id))]
    pub async fn process(
        &self,
        user_id: &str,
        message: &str,
        context: Map<String, Value>,
    ) -> CoordinatorOutcome {
        let started = Instant::now();
        let message = sanitize_text(message);
        if message.is_empty() {
            return CoordinatorOutcome::Failed(CoordinatorFailure::validation(EMPTY_MESSAGE));
        }
        let user_id = match sanitize_text(user_id) {
            id if id.is_empty() => ANONYMOUS_USER.to_owned(),
            id => id,
        };
        let mut context = sanitize_context(context);
        context.insert("user_id".to_owned(), Value::from(user_id.as_str()));

        match AssertUnwindSafe(self.route(&message, &context))
            .catch_unwind()
            .await
        {
            Ok(Ok(response)) => {
                let collaborators: Vec<&str> =
                    response.collaborations.keys().map(HandlerId::as_str).collect();
                AppLogger::log_interaction(
                    &user_id,
                    response.primary_handler.as_str(),
                    response.status.as_str(),
                    &collaborators,
                    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                );
                self.record_turn(&user_id, &message, &context, &response).await;
                CoordinatorOutcome::Completed(Box::new(response))
            }
            Ok(Err(e)) => {
                error!(error = %e, user.id = %user_id, "Request failed");
                CoordinatorOutcome::Failed(CoordinatorFailure::canned(
                    FailureKind::classify(&e).into(),
                ))
            }
            Err(_) => {
                error!(user.id = %user_id, "Request panicked");
                CoordinatorOutcome::Failed(CoordinatorFailure::canned(FailureStatus::Error))
            }
        }
    }

    async fn route(
        &self,
        message: &str,
        context: &Map<String, Value>,
    ) -> AppResult<CoordinatorResponse> {
        let mut analysis = self.router.analyze(message);
        if let Some(kind) = RequestKind::requested(context) {
            debug!(kind = kind.as_str(), "Request kind set by context");
            analysis = analysis.with_requested_kind(kind);
        }
        let request = HandlerRequest::new(message)
            .with_kind(analysis.kind)
            .with_context(context.clone());
        let primary = self.invoke(analysis.primary, &request).await;

        let mut collaborations = BTreeMap::new();
        for target in analysis.secondary() {
            let response = match collaboration_request(&primary, target, context) {
                Ok(collab) => self.invoke(target, &collab).await,
                Err(e) => {
                    warn!(handler = %target, error = %e, "Collaboration request not built");
                    HandlerResponse::failure(target)
                }
            };
            collaborations.insert(target, response);
        }

        let synthesis = if collaborations.values().any(HandlerResponse::is_useful) {
            Some(self.synthesize(&primary, &collaborations, context).await?)
        } else {
            None
        };

        let mut agents_involved = vec![analysis.primary];
        agents_involved.extend(collaborations.keys().copied());
        let collaboration_type = if collaborations.is_empty() {
            "single_agent"
        } else {
            "A2A"
        };

        Ok(CoordinatorResponse {
            coordinator: COORDINATOR_NAME.to_owned(),
            primary_handler: analysis.primary,
            request_kind: analysis.kind,
            status: primary.status,
            primary_response: primary,
            collaborations,
            synthesis,
            communication: CommunicationInfo {
                protocols_used: owned(COORDINATOR_PROTOCOLS),
                agents_involved,
                routing_method: ROUTING_METHOD.to_owned(),
                collaboration_type: collaboration_type.to_owned(),
            },
        })
    }

    /// Run one handler behind a panic boundary
    async fn invoke(&self, id: HandlerId, request: &HandlerRequest) -> HandlerResponse {
        let Some(handler) = self.handlers.get(&id) else {
            warn!(handler = %id, "Handler not registered");
            return HandlerResponse::failure(id);
        };
        match AssertUnwindSafe(handler.handle(request))
            .catch_unwind()
            .await
        {
            Ok(response) => response,
            Err(_) => {
                AppLogger::log_handler_failure(
                    id.agent_name(),
                    Some(request.user_id()),
                    "handler panicked",
                );
                HandlerResponse::failure(id)
            }
        }
    }

    async fn synthesize(
        &self,
        primary: &HandlerResponse,
        collaborations: &BTreeMap<HandlerId, HandlerResponse>,
        context: &Map<String, Value>,
    ) -> AppResult<String> {
        let prompt = format!(
            "Synthesize these responses from different AI agents into a coherent, helpful \
             answer:\n\nPrimary Response: {}\n\nCollaboration Responses: {}\n\n\
             Create a unified response that:\n\
             1. Addresses the user's original question\n\
             2. Integrates insights from all agents\n\
             3. Provides actionable recommendations\n\
             4. Maintains a helpful, conversational tone\n\n\
             Keep it concise but comprehensive.",
            serde_json::to_string_pretty(primary)?,
            serde_json::to_string_pretty(collaborations)?
        );
        Ok(self
            .synthesizer
            .try_generate(&prompt, context)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Synthesis failed, using fallback");
                SYNTHESIS_FALLBACK.to_owned()
            }))
    }

    async fn record_turn(
        &self,
        user_id: &str,
        message: &str,
        context: &Map<String, Value>,
        response: &CoordinatorResponse,
    ) {
        let Some(chats) = &self.chats else {
            return;
        };
        let turn = ChatTurn {
            user_id: user_id.to_owned(),
            session_id: context
                .get("session_id")
                .and_then(Value::as_str)
                .map(str::to_owned),
            message: message.to_owned(),
            response_text: response.display_text().to_owned(),
            producing_handler: response.primary_handler.agent_name().to_owned(),
            timestamp: Utc::now(),
        };
        if let Err(e) = chats.append_turn(turn).await {
            warn!(error = %e, user.id = %user_id, "Chat turn not recorded");
        }
    }

    /// Coordinator and per-handler health
    pub async fn system_status(&self) -> SystemStatus {
        let started = Instant::now();
        let agent_statuses: Vec<HandlerHealth> = self
            .handlers
            .values()
            .map(|handler| HandlerHealth {
                handler: handler.id(),
                name: handler.identity().name.clone(),
                status: HealthStatus::Healthy,
                capabilities: handler.identity().capabilities.clone(),
                protocols: owned(HANDLER_PROTOCOLS),
            })
            .collect();

        let mut checks: Vec<ComponentHealth> = agent_statuses
            .iter()
            .map(|agent| {
                ComponentHealth::new(&agent.name, agent.status, "Handler ready").with_metadata(
                    json!({
                        "capabilities": agent.capabilities,
                        "protocols": agent.protocols,
                    }),
                )
            })
            .collect();

        let llm_started = Instant::now();
        let llm_check = match self.llm.health_check().await {
            Ok(true) => ComponentHealth::new(
                "text_generation",
                HealthStatus::Healthy,
                format!("{} available", self.llm.display_name()),
            ),
            Ok(false) => ComponentHealth::new(
                "text_generation",
                HealthStatus::Degraded,
                "Text generation unavailable; handlers answer with fallback text",
            ),
            Err(e) => ComponentHealth::new(
                "text_generation",
                HealthStatus::Degraded,
                format!("Health check failed: {}", e.code.description()),
            ),
        };
        checks.push(llm_check.timed(llm_started));

        SystemStatus {
            coordinator: COORDINATOR_NAME.to_owned(),
            coordinator_status: HealthStatus::Healthy,
            total_agents: self.handlers.len(),
            communication_protocols: owned(COORDINATOR_PROTOCOLS),
            agent_statuses,
            health: self.health.report(checks, started),
        }
    }

    /// Every handler's identity, subtypes, and data sources, plus routing rules
    #[must_use]
    pub fn capabilities(&self) -> CapabilityReport {
        CapabilityReport {
            coordinator: COORDINATOR_NAME.to_owned(),
            total_agents: self.handlers.len(),
            agent_capabilities: self
                .handlers
                .values()
                .map(|handler| HandlerCapabilities {
                    handler: handler.id(),
                    identity: handler.identity().clone(),
                    supported_requests: owned(handler.supported_requests()),
                    data_sources: owned(handler.data_sources()),
                })
                .collect(),
            routing_rules: routing::ROUTING_RULES
                .iter()
                .map(|(keyword, handler)| ((*keyword).to_owned(), *handler))
                .collect(),
        }
    }
}
