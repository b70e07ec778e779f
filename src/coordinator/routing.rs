// ABOUTME: Keyword intent analysis selecting the primary handler, subtype, and collaborators
// ABOUTME: Static keyword tables with fixed tie-break order and a nutrition default
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

use std::collections::BTreeMap;

use serde::Serialize;

use crate::handlers::{HandlerId, RequestKind};

/// Keyword to handler mapping used for scoring
pub const ROUTING_RULES: &[(&str, HandlerId)] = &[
    ("nutrition", HandlerId::Nutrition),
    ("calories", HandlerId::Nutrition),
    ("nutrients", HandlerId::Nutrition),
    ("analyze", HandlerId::Nutrition),
    ("calculate", HandlerId::Nutrition),
    ("recipe", HandlerId::Recipe),
    ("cooking", HandlerId::Recipe),
    ("meal", HandlerId::Recipe),
    ("ingredients", HandlerId::Recipe),
    ("substitute", HandlerId::Recipe),
    ("track", HandlerId::Tracking),
    ("log", HandlerId::Tracking),
    ("progress", HandlerId::Tracking),
    ("goal", HandlerId::Tracking),
    ("summary", HandlerId::Tracking),
    ("insight", HandlerId::Tracking),
];

/// Ordered subtype table; the first entry with a matching keyword wins
pub const REQUEST_KIND_RULES: &[(RequestKind, &[&str])] = &[
    (RequestKind::AnalyzeFood, &["analyze", "nutrition", "breakdown"]),
    (RequestKind::SearchFood, &["search", "find food", "lookup"]),
    (RequestKind::FindRecipes, &["recipe", "cooking", "meal ideas"]),
    (RequestKind::LogFood, &["log", "add", "record", "ate"]),
    (RequestKind::DailySummary, &["summary", "today", "progress"]),
    (RequestKind::Recommendations, &["suggest", "recommend", "advice"]),
];

/// Phrases that pull in a fixed set of collaborators
pub const COLLABORATION_TRIGGERS: &[(&str, &[HandlerId])] = &[
    ("meal plan", &[HandlerId::Recipe, HandlerId::Nutrition]),
    ("recipe nutrition", &[HandlerId::Recipe, HandlerId::Nutrition]),
    ("track recipe", &[HandlerId::Recipe, HandlerId::Tracking]),
    ("nutritional goal", &[HandlerId::Nutrition, HandlerId::Tracking]),
    ("healthy recipe", &[HandlerId::Recipe, HandlerId::Nutrition]),
];

/// Handler chosen when no routing keyword appears
pub const DEFAULT_HANDLER: HandlerId = HandlerId::Nutrition;

/// Keyword hit counts per handler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HandlerScores(BTreeMap<HandlerId, usize>);

impl HandlerScores {
    /// Count routing keywords in an already lowercased message
    #[must_use]
    pub fn score(message: &str) -> Self {
        let mut scores: BTreeMap<HandlerId, usize> =
            HandlerId::ALL.iter().map(|id| (*id, 0)).collect();
        for (keyword, handler) in ROUTING_RULES {
            if message.contains(keyword) {
                *scores.entry(*handler).or_default() += 1;
            }
        }
        Self(scores)
    }

    /// Score of one handler
    #[must_use]
    pub fn get(&self, handler: HandlerId) -> usize {
        self.0.get(&handler).copied().unwrap_or(0)
    }

    /// Highest scorer, earliest in handler order on ties, default when all are zero
    #[must_use]
    pub fn primary(&self) -> HandlerId {
        let mut best = DEFAULT_HANDLER;
        let mut best_score = 0;
        for handler in HandlerId::ALL {
            let score = self.get(handler);
            if score > best_score {
                best = handler;
                best_score = score;
            }
        }
        best
    }

    /// Handlers with a nonzero score, in handler order
    #[must_use]
    pub fn nonzero(&self) -> Vec<HandlerId> {
        HandlerId::ALL
            .into_iter()
            .filter(|handler| self.get(*handler) > 0)
            .collect()
    }
}

/// Routing decision for one message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntentAnalysis {
    /// Handler that answers the request
    pub primary: HandlerId,
    /// Coordinator-level subtype
    pub kind: RequestKind,
    /// Handlers asked to contribute; may include the primary
    pub collaborators: Vec<HandlerId>,
    /// Raw keyword scores
    pub scores: HandlerScores,
}

impl IntentAnalysis {
    /// Collaborators other than the primary, in order
    pub fn secondary(&self) -> impl Iterator<Item = HandlerId> + '_ {
        self.collaborators
            .iter()
            .copied()
            .filter(move |handler| *handler != self.primary)
    }

    /// Replace the classified kind with an explicitly requested one
    ///
    /// Kinds owned by one handler also move the request to that handler.
    #[must_use]
    pub fn with_requested_kind(mut self, kind: RequestKind) -> Self {
        self.kind = kind;
        if let Some(owner) = kind.owner() {
            self.primary = owner;
        }
        self
    }
}

/// Stateless keyword router
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentRouter;

impl IntentRouter {
    /// Score, select, classify, and pick collaborators for `message`
    #[must_use]
    pub fn analyze(&self, message: &str) -> IntentAnalysis {
        let lower = message.to_lowercase();
        let scores = HandlerScores::score(&lower);
        IntentAnalysis {
            primary: scores.primary(),
            kind: classify_request(&lower),
            collaborators: collaborators_for(&lower, &scores),
            scores,
        }
    }
}

/// First subtype whose keywords appear in the lowercased message
#[must_use]
pub fn classify_request(message: &str) -> RequestKind {
    REQUEST_KIND_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| message.contains(keyword)))
        .map_or(RequestKind::General, |(kind, _)| *kind)
}

/// Collaborators from trigger phrases, else every nonzero scorer when more than one
#[must_use]
pub fn collaborators_for(message: &str, scores: &HandlerScores) -> Vec<HandlerId> {
    if let Some((_, handlers)) = COLLABORATION_TRIGGERS
        .iter()
        .find(|(trigger, _)| message.contains(trigger))
    {
        return handlers.to_vec();
    }
    let nonzero = scores.nonzero();
    if nonzero.len() > 1 {
        nonzero
    } else {
        Vec::new()
    }
}
