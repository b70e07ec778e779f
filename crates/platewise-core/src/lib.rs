// ABOUTME: Core types and constants for the Platewise diet assistant
// ABOUTME: Foundation crate with error handling, domain models, and nutrition constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

#![deny(unsafe_code)]

//! # Platewise Core
//!
//! Foundation crate providing shared types and constants for the Platewise
//! diet assistant. Provider adapters and the agent layer both depend on it,
//! so it is kept free of network and runtime dependencies.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Nutrient ids, unit conversion factors, energy densities
//! - **models**: Nutrient profiles, food records, recipes, profiles, meal logs

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models shared across crates
pub mod models;
