// ABOUTME: Persisted chat turn model owned by the chat-turn store
// ABOUTME: One user message with the response text and producing handler
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single persisted exchange between a user and the coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Owner of the turn
    pub user_id: String,
    /// Optional session grouping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Sanitized user message
    pub message: String,
    /// Text shown to the user
    pub response_text: String,
    /// Name of the handler that produced the primary response
    pub producing_handler: String,
    /// When the turn completed
    pub timestamp: DateTime<Utc>,
}
