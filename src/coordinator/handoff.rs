// ABOUTME: Builds collaborator requests from the primary handler's response
// ABOUTME: Fixed templates for nutrition to recipe, recipe to nutrition, and anything to tracking
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

use serde_json::{Map, Value};

use crate::errors::AppResult;
use crate::handlers::{HandlerId, HandlerRequest, HandlerResponse, Handoff, RequestKind};

/// Request sent to `target` after `primary` answered
///
/// # Errors
///
/// Returns an error if the primary response cannot be serialized for tracking.
pub fn collaboration_request(
    primary: &HandlerResponse,
    target: HandlerId,
    context: &Map<String, Value>,
) -> AppResult<HandlerRequest> {
    let first_recipe = primary.payload.recipes().first().cloned();
    let request = match (primary.handler, target, first_recipe) {
        (HandlerId::Nutrition, HandlerId::Recipe, _) => {
            let request =
                HandlerRequest::new("Find recipes that match the analyzed nutritional requirements")
                    .with_kind(RequestKind::FindRecipes);
            match primary.payload.food_record() {
                Some(record) => request.with_handoff(Handoff::NutrientCriteria {
                    food: record.food_name.clone(),
                    calories: record.nutrients.calories,
                    protein: record.nutrients.protein,
                }),
                None => request,
            }
        }
        (HandlerId::Recipe, HandlerId::Nutrition, Some(recipe)) => {
            HandlerRequest::new("Analyze nutritional content of these recipes")
                .with_handoff(Handoff::RecipeToAnalyze(recipe))
        }
        (_, HandlerId::Tracking, _) => HandlerRequest::new("Track this information for the user")
            .with_handoff(Handoff::TrackData(serde_json::to_value(primary)?)),
        (from, _, _) => HandlerRequest::new(format!(
            "Collaborate with information from {}",
            from.agent_name()
        ))
        .with_handoff(Handoff::Generic { from }),
    };
    Ok(request.with_context(context.clone()))
}
