// ABOUTME: Re-exports the unified error model from platewise-core
// ABOUTME: Lets handlers and the coordinator use crate::errors like any local module
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

pub use platewise_core::errors::*;
