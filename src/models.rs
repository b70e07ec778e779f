// ABOUTME: Re-exports the shared domain models from platewise-core
// ABOUTME: Nutrient profiles, food records, recipes, profiles, meal log entries, and chat turns
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

pub use platewise_core::models::*;
