// ABOUTME: Re-exports nutrition constants from platewise-core
// ABOUTME: USDA nutrient ids, unit conversions, reference amounts, energy densities, agent metadata
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

pub use platewise_core::constants::*;
