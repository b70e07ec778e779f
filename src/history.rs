// ABOUTME: Bounded per-agent, per-user conversation history used to enrich text-generation prompts
// ABOUTME: ConversationHistory trait with a DashMap-backed fixed-capacity ring buffer implementation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Default number of turns kept per agent and user
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// One prompt/response exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    /// Caller prompt, before preamble and context were added
    pub prompt: String,
    /// Generated response text
    pub response: String,
    /// Agent that produced the response
    pub agent: String,
    /// When the exchange completed
    pub timestamp: DateTime<Utc>,
}

impl HistoryTurn {
    /// Create a turn stamped with the current time
    pub fn now(
        prompt: impl Into<String>,
        response: impl Into<String>,
        agent: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            response: response.into(),
            agent: agent.into(),
            timestamp: Utc::now(),
        }
    }
}

/// In-memory conversation history keyed by agent and user
///
/// Each agent only sees its own exchanges with a user. This cache only
/// enriches later prompts; durable chat history lives in
/// [`crate::stores::ChatTurnStore`].
pub trait ConversationHistory: Send + Sync {
    /// Record a turn under `turn.agent` and `user_id`, evicting the oldest
    /// at capacity
    fn append(&self, user_id: &str, turn: HistoryTurn);

    /// Up to `limit` most recent turns between `agent` and `user_id`,
    /// oldest first
    fn recent(&self, agent: &str, user_id: &str, limit: usize) -> Vec<HistoryTurn>;

    /// Number of turns held between `agent` and `user_id`
    fn len(&self, agent: &str, user_id: &str) -> usize;

    /// Drop every agent's turns with `user_id`
    fn clear(&self, user_id: &str);
}

/// `(agent, user_id)`
type HistoryKey = (String, String);

fn key(agent: &str, user_id: &str) -> HistoryKey {
    (agent.to_owned(), user_id.to_owned())
}

/// Fixed-capacity ring buffer per agent and user
///
/// Uses `DashMap` so concurrent users only contend on their own shard.
#[derive(Debug)]
pub struct BoundedHistory {
    capacity: usize,
    turns: DashMap<HistoryKey, VecDeque<HistoryTurn>>,
}

impl BoundedHistory {
    /// Create a history holding at most `capacity` turns per agent and user
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            turns: DashMap::new(),
        }
    }

    /// Capacity of each agent and user pair
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BoundedHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl ConversationHistory for BoundedHistory {
    fn append(&self, user_id: &str, turn: HistoryTurn) {
        let mut entry = self
            .turns
            .entry(key(&turn.agent, user_id))
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));
        while entry.len() >= self.capacity {
            entry.pop_front();
        }
        entry.push_back(turn);
    }

    fn recent(&self, agent: &str, user_id: &str, limit: usize) -> Vec<HistoryTurn> {
        self.turns
            .get(&key(agent, user_id))
            .map_or_else(Vec::new, |turns| {
                let skip = turns.len().saturating_sub(limit);
                turns.iter().skip(skip).cloned().collect()
            })
    }

    fn len(&self, agent: &str, user_id: &str) -> usize {
        self.turns
            .get(&key(agent, user_id))
            .map_or(0, |turns| turns.len())
    }

    fn clear(&self, user_id: &str) {
        self.turns.retain(|(_, user), _| user != user_id);
    }
}
