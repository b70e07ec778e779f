// ABOUTME: Main library entry point for the Platewise diet assistant
// ABOUTME: Coordinator, specialist handlers, text generation, stores, and nutrition intelligence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

#![recursion_limit = "256"]
#![deny(unsafe_code)]

//! # Platewise
//!
//! A multi-agent diet assistant. A keyword-routing coordinator hands each
//! request to one of three specialist handlers, optionally pulls in
//! collaborators, and synthesizes their answers through a text-generation
//! backend.
//!
//! ## Architecture
//!
//! - **Coordinator**: sanitizes input, routes, fans out, synthesizes
//! - **Handlers**: nutrition analysis, recipe discovery, diet tracking
//! - **LLM**: provider contract, Gemini backend, fail-soft rate-limited generator
//! - **Stores**: profile, meal log, and chat turn collaborators
//! - **Intelligence**: energy targets, macro insights, intake trends
//!
//! Food and recipe data sources live in the `platewise-providers` crate;
//! errors, constants, and domain models in `platewise-core`.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use platewise::config::ServerConfig;
//! use platewise::coordinator::{Coordinator, Stores};
//! use platewise::stores::InMemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     let stores = Stores::shared(Arc::new(InMemoryStore::new()));
//!     let coordinator = Coordinator::from_config(&config, &stores)?;
//!
//!     let outcome = coordinator
//!         .process("user-1", "analyze two eggs", serde_json::Map::new())
//!         .await;
//!     println!("{}", outcome.display_text());
//!     Ok(())
//! }
//! ```

/// Environment configuration and nutrition policy
pub mod config;

/// Nutrition and agent constants
pub mod constants;

/// Request routing, collaboration, and synthesis
pub mod coordinator;

/// Unified error handling
pub mod errors;

/// Specialist request handlers
pub mod handlers;

/// Health report shapes
pub mod health;

/// Bounded per-user prompt history
pub mod history;

/// Energy targets, macro insights, and intake trends
pub mod intelligence;

/// Text-generation providers and the shared generator
pub mod llm;

/// Structured logging setup
pub mod logging;

/// Domain models
pub mod models;

/// Inbound text sanitization
pub mod sanitize;

/// Storage collaborators
pub mod stores;
