// ABOUTME: Coordinator response, failure outcome, system status, and capability report shapes
// ABOUTME: Failure statuses map quota, configuration, and generic errors to canned user-safe messages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

use std::collections::BTreeMap;

use serde::Serialize;

use crate::constants::agents::COORDINATOR_NAME;
use crate::handlers::{HandlerId, HandlerIdentity, HandlerResponse, RequestKind, ResponseStatus};
use crate::health::{HealthResponse, HealthStatus};
use crate::llm::FailureKind;

/// Routing metadata attached to every completed response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommunicationInfo {
    /// Protocols the coordinator speaks
    pub protocols_used: Vec<String>,
    /// Primary handler followed by collaborators
    pub agents_involved: Vec<HandlerId>,
    /// How the primary was chosen
    pub routing_method: String,
    /// "A2A" with collaborations, "`single_agent`" without
    pub collaboration_type: String,
}

/// Completed request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinatorResponse {
    /// Coordinator name
    pub coordinator: String,
    /// Handler that answered
    pub primary_handler: HandlerId,
    /// Coordinator-level subtype
    pub request_kind: RequestKind,
    /// Primary handler's response
    pub primary_response: HandlerResponse,
    /// Collaborator responses keyed by handler
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub collaborations: BTreeMap<HandlerId, HandlerResponse>,
    /// Unifying narrative when collaborators contributed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<String>,
    /// Primary response status
    pub status: ResponseStatus,
    /// Routing metadata
    pub communication: CommunicationInfo,
}

impl CoordinatorResponse {
    /// Text to show the user: the synthesis when present, else the primary text
    #[must_use]
    pub fn display_text(&self) -> &str {
        self.synthesis
            .as_deref()
            .or(self.primary_response.text.as_deref())
            .unwrap_or_default()
    }
}

/// Status of a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStatus {
    /// Text-generation quota or rate limit hit
    QuotaExceeded,
    /// Credentials missing or rejected
    ConfigError,
    /// Validation or unexpected failure
    Error,
}

impl From<FailureKind> for FailureStatus {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::Quota => Self::QuotaExceeded,
            FailureKind::Config => Self::ConfigError,
            FailureKind::Other => Self::Error,
        }
    }
}

/// Failed request; never carries raw error text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinatorFailure {
    /// Coordinator name
    pub coordinator: String,
    /// Failure class
    pub status: FailureStatus,
    /// User-facing message
    pub error: String,
    /// What the user can do instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl CoordinatorFailure {
    /// Canned failure for `status`
    #[must_use]
    pub fn canned(status: FailureStatus) -> Self {
        let (error, suggestion) = match status {
            FailureStatus::QuotaExceeded => (
                "API quota limit reached. The AI service will be restored within 24 hours. \
                 You can still use food database lookups!",
                Some(
                    "Try searching for specific foods using the nutrition database, or check \
                     your API quota in the provider console.",
                ),
            ),
            FailureStatus::ConfigError => (
                "API configuration issue. Please check your API keys in the environment \
                 configuration.",
                None,
            ),
            FailureStatus::Error => (
                "I encountered an error while processing your request. Please try again.",
                None,
            ),
        };
        Self {
            coordinator: COORDINATOR_NAME.to_owned(),
            status,
            error: error.to_owned(),
            suggestion: suggestion.map(str::to_owned),
        }
    }

    /// Rejected input with a descriptive message
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            coordinator: COORDINATOR_NAME.to_owned(),
            status: FailureStatus::Error,
            error: message.into(),
            suggestion: None,
        }
    }
}

/// Result of one coordinator request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CoordinatorOutcome {
    /// The request was routed and answered
    Completed(Box<CoordinatorResponse>),
    /// The request failed before a response could be assembled
    Failed(CoordinatorFailure),
}

impl CoordinatorOutcome {
    /// Status string as serialized in the response
    #[must_use]
    pub fn status(&self) -> &'static str {
        match self {
            Self::Completed(response) => response.status.as_str(),
            Self::Failed(failure) => match failure.status {
                FailureStatus::QuotaExceeded => "quota_exceeded",
                FailureStatus::ConfigError => "config_error",
                FailureStatus::Error => "error",
            },
        }
    }

    /// The completed response, if any
    #[must_use]
    pub fn response(&self) -> Option<&CoordinatorResponse> {
        match self {
            Self::Completed(response) => Some(response),
            Self::Failed(_) => None,
        }
    }

    /// Text to show the user
    #[must_use]
    pub fn display_text(&self) -> &str {
        match self {
            Self::Completed(response) => response.display_text(),
            Self::Failed(failure) => &failure.error,
        }
    }
}

/// Health of one handler
#[derive(Debug, Clone, Serialize)]
pub struct HandlerHealth {
    /// Handler id
    pub handler: HandlerId,
    /// Agent name
    pub name: String,
    /// Always healthy once constructed
    pub status: HealthStatus,
    /// Advertised capabilities
    pub capabilities: Vec<String>,
    /// Protocols the handler speaks
    pub protocols: Vec<String>,
}

/// Coordinator health report
#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    /// Coordinator name
    pub coordinator: String,
    /// Coordinator status
    pub coordinator_status: HealthStatus,
    /// Registered handlers
    pub total_agents: usize,
    /// Protocols the coordinator speaks
    pub communication_protocols: Vec<String>,
    /// Per-handler health
    pub agent_statuses: Vec<HandlerHealth>,
    /// Component checks including the text-generation backend
    pub health: HealthResponse,
}

/// One handler's advertised capabilities
#[derive(Debug, Clone, Serialize)]
pub struct HandlerCapabilities {
    /// Handler id
    pub handler: HandlerId,
    /// Name, role, and capabilities
    pub identity: HandlerIdentity,
    /// Local subtypes
    pub supported_requests: Vec<String>,
    /// Data the handler draws from
    pub data_sources: Vec<String>,
}

/// Capability report for every handler plus routing rules
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityReport {
    /// Coordinator name
    pub coordinator: String,
    /// Registered handlers
    pub total_agents: usize,
    /// Per-handler capabilities
    pub agent_capabilities: Vec<HandlerCapabilities>,
    /// Keyword to handler routing table
    pub routing_rules: BTreeMap<String, HandlerId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_statuses_serialize_snake_case() {
        let failure = CoordinatorFailure::canned(FailureStatus::QuotaExceeded);
        let json = serde_json::to_value(CoordinatorOutcome::Failed(failure)).unwrap();
        assert_eq!(json["status"], "quota_exceeded");
        assert_eq!(json["coordinator"], COORDINATOR_NAME);
        assert!(json["suggestion"].is_string());
    }

    #[test]
    fn test_generic_failure_message() {
        let outcome = CoordinatorOutcome::Failed(CoordinatorFailure::canned(FailureStatus::Error));
        assert_eq!(outcome.status(), "error");
        assert_eq!(
            outcome.display_text(),
            "I encountered an error while processing your request. Please try again."
        );
    }
}
