// ABOUTME: Configuration validation error type
// ABOUTME: Returned by validate() on every typed configuration section
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A lower bound is not below its upper bound
    #[error("Invalid range: {0}")]
    InvalidRange(&'static str),

    /// Percentages or weights do not add up
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    /// A value is outside its allowed range
    #[error("Value out of range: {0}")]
    ValueOutOfRange(String),
}
