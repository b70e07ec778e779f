// ABOUTME: Health reporting for the coordinator and its handlers
// ABOUTME: Component checks roll up into one overall status with service info and timing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

//! Health report shapes and the checker that assembles them

use std::env;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::logging::SERVICE_NAME;

/// Overall health status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Fully operational
    Healthy,
    /// Working with reduced capability
    Degraded,
    /// Not operational
    Unhealthy,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Worst status among the checks
    pub status: HealthStatus,
    /// Service information
    pub service: ServiceInfo,
    /// Individual component checks
    pub checks: Vec<ComponentHealth>,
    /// Response timestamp (unix seconds)
    pub timestamp: u64,
    /// Time spent assembling the report
    pub response_time_ms: u64,
}

/// Service information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Service name
    pub name: String,
    /// Crate version
    pub version: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Seconds since the checker was created
    pub uptime_seconds: u64,
}

/// Individual component health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Status description
    pub message: String,
    /// Check duration in milliseconds
    pub duration_ms: u64,
    /// Additional metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl ComponentHealth {
    /// A check that took no measurable time
    pub fn new(name: impl Into<String>, status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
            duration_ms: 0,
            metadata: None,
        }
    }

    /// Attach metadata
    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Record how long the check took
    #[must_use]
    pub fn timed(mut self, started: Instant) -> Self {
        self.duration_ms = elapsed_ms(started);
        self
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Assembles health responses
#[derive(Debug, Clone)]
pub struct HealthChecker {
    start_time: Instant,
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthChecker {
    /// Start the uptime clock
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Service name, version, environment, and uptime
    #[must_use]
    pub fn service_info(&self) -> ServiceInfo {
        ServiceInfo {
            name: SERVICE_NAME.to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_owned()),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Roll `checks` up into a response; `started` marks when checking began
    #[must_use]
    pub fn report(&self, checks: Vec<ComponentHealth>, started: Instant) -> HealthResponse {
        HealthResponse {
            status: overall_status(&checks),
            service: self.service_info(),
            checks,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            response_time_ms: elapsed_ms(started),
        }
    }
}

/// Worst status among `checks`; healthy when there are none
#[must_use]
pub fn overall_status(checks: &[ComponentHealth]) -> HealthStatus {
    checks
        .iter()
        .map(|check| check.status)
        .max()
        .unwrap_or(HealthStatus::Healthy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overall_status_is_worst_component() {
        let checks = vec![
            ComponentHealth::new("a", HealthStatus::Healthy, "ok"),
            ComponentHealth::new("b", HealthStatus::Degraded, "slow"),
        ];
        assert_eq!(overall_status(&checks), HealthStatus::Degraded);
        assert_eq!(overall_status(&[]), HealthStatus::Healthy);
    }

    #[test]
    fn test_report_carries_service_info() {
        let checker = HealthChecker::new();
        let response = checker.report(
            vec![ComponentHealth::new("service", HealthStatus::Healthy, "running")],
            Instant::now(),
        );
        assert_eq!(response.status, HealthStatus::Healthy);
        assert_eq!(response.service.name, SERVICE_NAME);
        assert_eq!(response.checks.len(), 1);
    }
}
