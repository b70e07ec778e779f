// ABOUTME: Recipe handler for recipe search, goal-based suggestions, substitutions, and meal plans
// ABOUTME: Merges provider recipes with generated ones and ranks them against extracted criteria
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

use std::fmt::Write as _;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use platewise_providers::{FirstMatch, RecipeDataProvider, RecipeQueryExtractor};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{
    load_profile, HandlerDeps, HandlerId, HandlerIdentity, HandlerPayload, HandlerRequest,
    HandlerResponse, Handoff, RecipePayload, RequestHandler, RequestKind,
};
use crate::config::NutritionPolicyConfig;
use crate::errors::AppResult;
use crate::intelligence::daily_targets;
use crate::llm::TextGenerator;
use crate::models::{Recipe, RecipeSource, UserProfile};
use crate::stores::UserProfileStore;

/// Recipes returned by a search
pub const MAX_RANKED_RECIPES: usize = 10;

/// Candidates requested from each provider
const PROVIDER_LIMIT: usize = 10;

/// Recipes recovered from unstructured generated text
const MAX_TEXT_RECIPES: usize = 3;

/// Shortest text section taken as a recipe
const MIN_RECIPE_SECTION_CHARS: usize = 50;

const DEFAULT_PLAN_DAYS: u32 = 7;
const DEFAULT_MEALS_PER_DAY: u32 = 3;

const CAPABILITIES: &[&str] = &[
    "Recipe search and discovery",
    "Dietary preference filtering",
    "Meal planning suggestions",
    "Ingredient substitution",
    "Cooking time estimation",
    "Difficulty level assessment",
    "Nutritional recipe optimization",
    "Cultural cuisine exploration",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecipeTask {
    FindRecipes,
    MealPlan,
    Substitute,
    Suggestions,
}

/// What a recipe search is ranked against
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecipeCriteria {
    /// Search text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Ingredient terms a recipe should contain
    pub ingredients: Vec<String>,
    /// Dietary preferences and allergy exclusions
    pub dietary_restrictions: Vec<String>,
    /// Desired preparation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<String>,
    /// Calories the recipe should land near
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_calories: Option<f64>,
}

impl RecipeCriteria {
    /// Split a query into ingredient terms on commas and "and"
    #[must_use]
    pub fn ingredient_terms(query: &str) -> Vec<String> {
        query
            .split(',')
            .flat_map(|part| part.split(" and "))
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }
}

/// Relevance of `recipe` for `criteria`
///
/// Ingredient match ratio weighted 30, plus 20 when dietary restrictions
/// apply, plus 10 when both sides specify a preparation time.
#[must_use]
pub fn score_recipe(recipe: &Recipe, criteria: &RecipeCriteria) -> f64 {
    let mut score = 0.0;
    if !criteria.ingredients.is_empty() {
        let matched = criteria
            .ingredients
            .iter()
            .filter(|wanted| {
                let wanted = wanted.to_lowercase();
                recipe
                    .ingredients
                    .iter()
                    .any(|have| have.to_lowercase().contains(&wanted))
            })
            .count();
        score += matched as f64 / criteria.ingredients.len() as f64 * 30.0;
    }
    if !criteria.dietary_restrictions.is_empty() {
        score += 20.0;
    }
    if criteria.prep_time.is_some() && recipe.prep_time.is_some() {
        score += 10.0;
    }
    score
}

/// Score, sort best first (stable), and keep the top ten
#[must_use]
pub fn rank_recipes(mut recipes: Vec<Recipe>, criteria: &RecipeCriteria) -> Vec<Recipe> {
    for recipe in &mut recipes {
        recipe.score = score_recipe(recipe, criteria);
    }
    recipes.sort_by(|a, b| b.score.total_cmp(&a.score));
    recipes.truncate(MAX_RANKED_RECIPES);
    recipes
}

/// Recipe as described in generated JSON; every field is lenient
#[derive(Debug, Deserialize)]
struct GeneratedRecipe {
    #[serde(default, alias = "title")]
    name: Option<String>,
    #[serde(default)]
    ingredients: Vec<Value>,
    #[serde(default, alias = "prepTime")]
    prep_time: Option<Value>,
    #[serde(default)]
    calories: Option<Value>,
    #[serde(default)]
    difficulty: Option<Value>,
    #[serde(default)]
    instructions: Option<Value>,
    #[serde(default)]
    servings: Option<Value>,
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_owned()).filter(|t| !t.is_empty()),
        Value::Number(number) => Some(number.to_string()),
        Value::Array(items) => {
            let lines: Vec<String> = items.iter().filter_map(value_text).collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        }
        _ => None,
    }
}

fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text
            .split(|c: char| !(c.is_ascii_digit() || c == '.'))
            .find(|part| !part.is_empty())
            .and_then(|part| part.parse().ok()),
        _ => None,
    }
}

impl From<GeneratedRecipe> for Recipe {
    fn from(generated: GeneratedRecipe) -> Self {
        let mut recipe = Self::named(
            generated
                .name
                .unwrap_or_else(|| "AI Generated Recipe".to_owned()),
            RecipeSource::Ai,
        );
        recipe.ingredients = generated.ingredients.iter().filter_map(value_text).collect();
        recipe.prep_time = generated.prep_time.as_ref().and_then(value_text);
        recipe.calories = generated.calories.as_ref().and_then(value_number);
        recipe.difficulty = generated.difficulty.as_ref().and_then(value_text);
        recipe.instructions = generated.instructions.as_ref().and_then(value_text);
        recipe.servings = generated
            .servings
            .as_ref()
            .and_then(value_number)
            .map(|n| n.round().clamp(1.0, f64::from(u32::MAX)) as u32);
        recipe
    }
}

fn json_array_regex() -> Option<&'static Regex> {
    static ARRAY: OnceLock<Option<Regex>> = OnceLock::new();
    ARRAY.get_or_init(|| Regex::new(r"(?s)\[.*\]").ok()).as_ref()
}

/// Recipes from generated text: a JSON array when present, else text sections
#[must_use]
pub fn parse_generated_recipes(text: &str) -> Vec<Recipe> {
    let structured = json_array_regex()
        .and_then(|regex| regex.find(text))
        .and_then(|found| serde_json::from_str::<Vec<GeneratedRecipe>>(found.as_str()).ok())
        .filter(|items| !items.is_empty());
    if let Some(items) = structured {
        return items.into_iter().map(Recipe::from).collect();
    }

    text.split("\n\n")
        .map(str::trim)
        .filter(|section| section.chars().count() > MIN_RECIPE_SECTION_CHARS)
        .take(MAX_TEXT_RECIPES)
        .map(|section| {
            let mut recipe = Recipe::named("AI Generated Recipe", RecipeSource::AiGenerated);
            recipe.instructions = Some(section.to_owned());
            recipe.prep_time = Some("30 minutes".to_owned());
            recipe.calories = Some(400.0);
            recipe
        })
        .collect()
}

fn captured(captures: &Captures<'_>) -> Option<String> {
    let text = captures.get(1)?.as_str().trim();
    (!text.is_empty()).then(|| text.to_owned())
}

/// Recipe discovery, meal planning, and culinary guidance
pub struct RecipeHandler {
    generator: TextGenerator,
    providers: Vec<Arc<dyn RecipeDataProvider>>,
    queries: RecipeQueryExtractor,
    tasks: FirstMatch<RecipeTask>,
    goals: FirstMatch<&'static str>,
    substitutions: FirstMatch<String>,
    profiles: Arc<dyn UserProfileStore>,
    policy: NutritionPolicyConfig,
}

impl RecipeHandler {
    /// Identity the handler speaks as
    #[must_use]
    pub fn default_identity() -> HandlerIdentity {
        HandlerIdentity::new(
            HandlerId::Recipe.agent_name(),
            "Recipe discovery, meal planning, and culinary guidance specialist",
            CAPABILITIES,
        )
    }

    /// Build the handler over `providers`, searched in order
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in pattern fails to compile.
    pub fn new(deps: &HandlerDeps, providers: Vec<Arc<dyn RecipeDataProvider>>) -> AppResult<Self> {
        let tasks = FirstMatch::new()
            .keywords(RecipeTask::FindRecipes, &["recipe", "cooking", "meal ideas"])?
            .keywords(RecipeTask::MealPlan, &["meal plan"])?
            .keywords(RecipeTask::Substitute, &["substitute", "replace", "instead of"])?
            .keywords(RecipeTask::Suggestions, &["suggest", "recommend"])?;

        let goals = FirstMatch::new()
            .keywords("weight loss", &["weight loss", "lose weight", "weight_loss", "cutting"])?
            .keywords("muscle gain", &["muscle", "bulk", "muscle_gain"])?
            .keywords("heart health", &["heart", "cholesterol"])?
            .keywords("low carb", &["low carb", "low-carb", "keto"])?
            .keywords("high protein", &["high protein", "high-protein", "protein"])?
            .keywords("energy", &["energy", "endurance"])?;

        let substitutions = FirstMatch::new()
            .rule(
                r"substitute\s+(?:for\s+)?(?:an?\s+|the\s+)?([a-z][a-z ]*?)\s*(?:\bwith\b|\bin\b|[?.!,]|$)",
                captured,
            )?
            .rule(
                r"replace\s+(?:an?\s+|the\s+)?([a-z][a-z ]*?)\s*(?:\bwith\b|\bin\b|[?.!,]|$)",
                captured,
            )?
            .rule(
                r"instead of\s+(?:an?\s+|the\s+)?([a-z][a-z ]*?)\s*(?:\bin\b|[?.!,]|$)",
                captured,
            )?;

        Ok(Self {
            generator: deps.generator_for(Self::default_identity()),
            providers,
            queries: RecipeQueryExtractor::new()?,
            tasks,
            goals,
            substitutions,
            profiles: deps.profiles.clone(),
            policy: deps.policy.clone(),
        })
    }

    /// Criteria from a handoff or the message, plus profile restrictions
    fn criteria_for(&self, request: &HandlerRequest, profile: Option<&UserProfile>) -> RecipeCriteria {
        let mut criteria = RecipeCriteria::default();
        if let Some(Handoff::NutrientCriteria { food, calories, .. }) = &request.handoff {
            criteria.query = Some(food.clone());
            criteria.ingredients.push(food.clone());
            criteria.target_calories = Some(*calories);
        } else {
            criteria.query = request
                .context
                .get("query")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|query| !query.is_empty())
                .map(ToOwned::to_owned)
                .or_else(|| self.queries.extract(&request.message));
            if let Some(query) = &criteria.query {
                criteria.ingredients = RecipeCriteria::ingredient_terms(query);
            }
        }

        if let Some(Value::Array(items)) = request.context.get("dietary_restrictions") {
            criteria
                .dietary_restrictions
                .extend(items.iter().filter_map(Value::as_str).map(ToOwned::to_owned));
        }
        if let Some(profile) = profile {
            criteria
                .dietary_restrictions
                .extend(profile.dietary_preferences.iter().cloned());
            criteria
                .dietary_restrictions
                .extend(profile.allergies.iter().map(|allergy| format!("no {allergy}")));
        }
        criteria.prep_time = request
            .context
            .get("prep_time")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);
        criteria
    }

    async fn generate_recipes(
        &self,
        criteria: &RecipeCriteria,
        request: &HandlerRequest,
    ) -> AppResult<Vec<Recipe>> {
        let prompt = format!(
            "Create 3 original recipe suggestions for these criteria:\n{}\n\
             Respond with a JSON array of objects with the fields name, ingredients, prep_time, \
             calories, difficulty, instructions, servings. Make the recipes realistic, healthy, \
             and delicious.",
            serde_json::to_string_pretty(criteria)?
        );
        Ok(match self.generator.try_generate(&prompt, &request.context).await {
            Ok(text) => parse_generated_recipes(&text),
            Err(e) => {
                debug!(error = %e, "Recipe generation unavailable");
                Vec::new()
            }
        })
    }

    #[instrument(skip_all, fields(handler = "recipe"))]
    async fn find_recipes(
        &self,
        request: &HandlerRequest,
        profile: Option<&UserProfile>,
    ) -> AppResult<HandlerResponse> {
        let criteria = self.criteria_for(request, profile);
        let query = criteria.query.clone().unwrap_or_else(|| "healthy".to_owned());

        let mut candidates = Vec::new();
        for provider in &self.providers {
            let found = provider.search(&query, PROVIDER_LIMIT).await?;
            debug!(provider = provider.name(), count = found.len(), "Provider recipes");
            candidates.extend(found);
        }
        candidates.extend(self.generate_recipes(&criteria, request).await?);

        let total_found = candidates.len();
        let recipes = rank_recipes(candidates, &criteria);
        if recipes.is_empty() {
            return Ok(HandlerResponse::no_data(
                HandlerId::Recipe,
                HandlerPayload::Recipe(RecipePayload::Found {
                    criteria,
                    recipes,
                    total_found,
                }),
                format!("I couldn't find any recipes for '{query}'. Try different ingredients."),
            ));
        }

        let mut text = format!("Found {} recipes for '{query}':\n", recipes.len());
        for (rank, recipe) in recipes.iter().enumerate() {
            let _ = write!(text, "{}. {}", rank + 1, recipe.name);
            if let Some(prep) = &recipe.prep_time {
                let _ = write!(text, " ({prep})");
            }
            if let Some(calories) = recipe.calories {
                let _ = write!(text, " - {calories:.0} kcal");
            }
            text.push('\n');
        }
        Ok(HandlerResponse::success(
            HandlerId::Recipe,
            HandlerPayload::Recipe(RecipePayload::Found {
                criteria,
                recipes,
                total_found,
            }),
            text,
        ))
    }

    #[instrument(skip_all, fields(handler = "recipe", goal = %goal))]
    async fn suggest_for_goal(
        &self,
        request: &HandlerRequest,
        goal: &str,
        profile: Option<&UserProfile>,
    ) -> AppResult<HandlerResponse> {
        let targets = daily_targets(profile, &self.policy);
        let restrictions = profile
            .map(|p| p.dietary_preferences.join(", "))
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "none".to_owned());
        let prompt = format!(
            "Suggest 5 recipes for this goal: {goal}.\n\
             Daily calorie target: {:.0} kcal, protein target: {:.0} g.\n\
             Dietary restrictions: {restrictions}.\n\
             Respond with a JSON array of objects with the fields name, ingredients, prep_time, \
             calories, instructions, and explain briefly in the instructions why each fits the goal.",
            targets.calories, targets.protein
        );
        let recipes = match self.generator.try_generate(&prompt, &request.context).await {
            Ok(text) => parse_generated_recipes(&text),
            Err(e) => {
                debug!(error = %e, "Goal suggestions unavailable");
                Vec::new()
            }
        };

        let payload = HandlerPayload::Recipe(RecipePayload::GoalBased {
            goal: goal.to_owned(),
            recipes,
        });
        let names: Vec<&str> = payload.recipes().iter().map(|r| r.name.as_str()).collect();
        if names.is_empty() {
            return Ok(HandlerResponse::no_data(
                HandlerId::Recipe,
                payload,
                format!("I couldn't put together {goal} recipe suggestions right now."),
            ));
        }
        let text = format!("Recipes for {goal}:\n- {}", names.join("\n- "));
        Ok(HandlerResponse::success(HandlerId::Recipe, payload, text))
    }

    #[instrument(skip_all, fields(handler = "recipe"))]
    async fn substitute(
        &self,
        request: &HandlerRequest,
        profile: Option<&UserProfile>,
    ) -> HandlerResponse {
        let Some(ingredient) = self.substitutions.first(&request.lowercase()) else {
            return HandlerResponse::info(
                HandlerId::Recipe,
                HandlerPayload::Empty,
                "Tell me which ingredient you want to replace, for example \
                 \"substitute for butter\".",
            );
        };
        let preferences = profile
            .map(|p| p.dietary_preferences.join(", "))
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "none".to_owned());
        let allergies = profile
            .map(|p| p.allergies.join(", "))
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| "none".to_owned());
        let suggestions = self
            .generator
            .generate(
                &format!(
                    "Suggest 3 to 5 healthy substitutes for {ingredient}.\n\
                     Dietary preferences: {preferences}. Avoid these allergens: {allergies}.\n\
                     For each give the substitution ratio, nutritional benefits, taste or texture \
                     differences, and best uses."
                ),
                &request.context,
            )
            .await;
        HandlerResponse::success(
            HandlerId::Recipe,
            HandlerPayload::Recipe(RecipePayload::Substitutes {
                ingredient,
                suggestions: suggestions.clone(),
            }),
            suggestions,
        )
    }

    #[instrument(skip_all, fields(handler = "recipe"))]
    async fn meal_plan(
        &self,
        request: &HandlerRequest,
        profile: Option<&UserProfile>,
    ) -> HandlerResponse {
        let context_count = |key: &str, default: u32| {
            request
                .context
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n > 0)
                .unwrap_or(default)
        };
        let days = context_count("days", DEFAULT_PLAN_DAYS);
        let meals_per_day = context_count("meals_per_day", DEFAULT_MEALS_PER_DAY);
        let target_calories = daily_targets(profile, &self.policy).calories;
        let dietary_preferences = profile
            .map(|p| p.dietary_preferences.clone())
            .unwrap_or_default();

        let plan = self
            .generator
            .generate(
                &format!(
                    "Create a {days}-day meal plan with {meals_per_day} meals per day.\n\
                     Daily calorie target: {target_calories:.0} kcal.\n\
                     Dietary preferences: {}.\n\
                     For each day list the meals with a short description, estimated calories, \
                     and prep time. Keep the week varied and nutritionally balanced.",
                    if dietary_preferences.is_empty() {
                        "none".to_owned()
                    } else {
                        dietary_preferences.join(", ")
                    }
                ),
                &request.context,
            )
            .await;

        HandlerResponse::success(
            HandlerId::Recipe,
            HandlerPayload::Recipe(RecipePayload::MealPlan {
                days,
                meals_per_day,
                target_calories,
                dietary_preferences,
                plan: plan.clone(),
            }),
            plan,
        )
    }

    /// Review the recipe supplied in the context's `recipe` object
    #[instrument(skip_all, fields(handler = "recipe"))]
    async fn analyze_recipe(&self, request: &HandlerRequest) -> HandlerResponse {
        let recipe = request
            .context
            .get("recipe")
            .and_then(|value| serde_json::from_value::<Recipe>(value.clone()).ok())
            .filter(|recipe| !recipe.name.trim().is_empty());
        let Some(recipe) = recipe else {
            return HandlerResponse::info(
                HandlerId::Recipe,
                HandlerPayload::Empty,
                "Send the recipe to analyze as a \"recipe\" object with a name, its \
                 ingredients, and optionally the instructions.",
            );
        };

        let ingredients = if recipe.ingredients.is_empty() {
            "not listed".to_owned()
        } else {
            recipe.ingredients.join(", ")
        };
        let analysis = self
            .generator
            .generate(
                &format!(
                    "Analyze this recipe:\nName: {}\nIngredients: {ingredients}\n\
                     Instructions: {}\n\n\
                     Provide:\n\
                     1. Estimated nutrition per serving\n\
                     2. Difficulty level from 1 to 5\n\
                     3. Preparation and cooking time\n\
                     4. Health benefits\n\
                     5. Possible improvements or substitutions\n\
                     6. Dietary categories it fits (vegan, gluten-free, and so on)",
                    recipe.name,
                    recipe.instructions.as_deref().unwrap_or("not provided")
                ),
                &request.context,
            )
            .await;

        let text = format!("**Recipe Analysis: {}**\n{analysis}", recipe.name);
        HandlerResponse::success(
            HandlerId::Recipe,
            HandlerPayload::Recipe(RecipePayload::RecipeAnalysis { recipe, analysis }),
            text,
        )
    }

    async fn general(&self, request: &HandlerRequest) -> HandlerResponse {
        let answer = self
            .generator
            .generate(
                &format!(
                    "Answer this recipe or cooking question: {}\n\
                     Give practical cooking advice with specific recommendations where possible.",
                    request.message
                ),
                &request.context,
            )
            .await;
        HandlerResponse::success(
            HandlerId::Recipe,
            HandlerPayload::Recipe(RecipePayload::General {
                answer: answer.clone(),
            }),
            answer,
        )
    }
}

#[async_trait]
impl RequestHandler for RecipeHandler {
    fn id(&self) -> HandlerId {
        HandlerId::Recipe
    }

    fn identity(&self) -> &HandlerIdentity {
        self.generator.identity()
    }

    fn supported_requests(&self) -> &'static [&'static str] {
        &[
            "find_recipes",
            "meal_plan",
            "ingredient_substitute",
            "recipe_suggestions",
            "recipe_analysis",
            "general",
        ]
    }

    fn data_sources(&self) -> &'static [&'static str] {
        &["Recipe API", "Built-in recipe catalog", "AI Generation"]
    }

    async fn process(&self, request: &HandlerRequest) -> AppResult<HandlerResponse> {
        let profile = load_profile(self.profiles.as_ref(), request).await;
        let profile = profile.as_ref();

        if matches!(request.handoff, Some(Handoff::NutrientCriteria { .. })) {
            return self.find_recipes(request, profile).await;
        }
        if request.kind == RequestKind::RecipeAnalysis {
            return Ok(self.analyze_recipe(request).await);
        }
        let lower = request.lowercase();
        match self.tasks.first(&lower) {
            Some(RecipeTask::FindRecipes) => self.find_recipes(request, profile).await,
            Some(RecipeTask::MealPlan) => Ok(self.meal_plan(request, profile).await),
            Some(RecipeTask::Substitute) => Ok(self.substitute(request, profile).await),
            Some(RecipeTask::Suggestions) => match self.goals.first(&lower) {
                Some(goal) => self.suggest_for_goal(request, goal, profile).await,
                None => Ok(self.general(request).await),
            },
            None => Ok(self.general(request).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(name: &str, ingredients: &[&str], prep: Option<&str>) -> Recipe {
        let mut recipe = Recipe::named(name, RecipeSource::Web);
        recipe.ingredients = ingredients.iter().map(|i| (*i).to_owned()).collect();
        recipe.prep_time = prep.map(ToOwned::to_owned);
        recipe
    }

    #[test]
    fn test_score_components() {
        let criteria = RecipeCriteria {
            ingredients: vec!["chicken".to_owned(), "rice".to_owned()],
            dietary_restrictions: vec!["gluten free".to_owned()],
            prep_time: Some("20 minutes".to_owned()),
            ..RecipeCriteria::default()
        };
        let half = recipe("Salad", &["chicken breast", "greens"], Some("15 minutes"));
        assert!((score_recipe(&half, &criteria) - 45.0).abs() < 1e-9);

        let full = recipe("Bowl", &["Chicken thigh", "brown rice"], None);
        assert!((score_recipe(&full, &criteria) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_ranking_is_stable_and_truncated() {
        let criteria = RecipeCriteria {
            ingredients: vec!["tofu".to_owned()],
            ..RecipeCriteria::default()
        };
        let mut candidates: Vec<Recipe> = (0..12)
            .map(|i| recipe(&format!("plain {i}"), &["water"], None))
            .collect();
        candidates.push(recipe("tofu stir fry", &["tofu"], None));
        let ranked = rank_recipes(candidates, &criteria);
        assert_eq!(ranked.len(), MAX_RANKED_RECIPES);
        assert_eq!(ranked[0].name, "tofu stir fry");
        assert_eq!(ranked[1].name, "plain 0");
    }

    #[test]
    fn test_generated_json_array_is_parsed() {
        let text = "Here are ideas:\n[{\"name\": \"Lentil Soup\", \"ingredients\": [\"lentils\", \"carrot\"], \
                    \"prep_time\": 25, \"calories\": \"320 kcal\", \"instructions\": [\"Boil\", \"Serve\"]}]";
        let recipes = parse_generated_recipes(text);
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].source, RecipeSource::Ai);
        assert_eq!(recipes[0].prep_time.as_deref(), Some("25"));
        assert_eq!(recipes[0].calories, Some(320.0));
        assert_eq!(recipes[0].instructions.as_deref(), Some("Boil\nServe"));
    }

    #[test]
    fn test_text_fallback_keeps_long_sections() {
        let long = "x".repeat(60);
        let text = format!("short\n\n{long}\n\n{long}\n\n{long}\n\n{long}");
        let recipes = parse_generated_recipes(&text);
        assert_eq!(recipes.len(), MAX_TEXT_RECIPES);
        assert!(recipes
            .iter()
            .all(|r| r.source == RecipeSource::AiGenerated && r.calories == Some(400.0)));
    }

    #[test]
    fn test_ingredient_terms_split() {
        assert_eq!(
            RecipeCriteria::ingredient_terms("chicken and rice, broccoli"),
            vec!["chicken", "rice", "broccoli"]
        );
    }
}
