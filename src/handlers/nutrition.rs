// ABOUTME: Nutrition handler analyzing foods, searching the food database, and totaling recipes
// ABOUTME: Runs the USDA, static table, AI estimate, default lookup chain and logs analyzed foods
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

//! # Nutrition Handler
//!
//! Local subtypes, first match wins:
//!
//! 1. `calculate_recipe` when the coordinator hands over a recipe
//! 2. `daily_analysis` for a `DailyAnalysis` request: the context's
//!    `food_log`, or today's meal log without one
//! 3. `search_food` for search wording or a `SearchFood` request
//! 4. `analyze_food` for analysis wording when a food is detected
//! 5. `general` otherwise, including analysis wording where the only
//!    "food" is a leftover word and no quantity was given
//!
//! Food values come from the first data source that knows the food. When
//! none does, the text generator is asked for an estimate, and when that
//! cannot be parsed fixed default values are used. The record's `source`
//! always says which step produced it.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use platewise_providers::{
    FirstMatch, FoodDataProvider, FoodNameExtractor, FoodQuery, FoodReference, FoodSearchResult,
    NameMatch, QuantityParser, UsdaFoodProvider,
};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use super::tracking::day_start;
use super::{
    HandlerDeps, HandlerId, HandlerIdentity, HandlerPayload, HandlerRequest, HandlerResponse,
    Handoff, NutritionPayload, RequestHandler, RequestKind,
};
use crate::config::InsightThresholds;
use crate::errors::AppResult;
use crate::intelligence::{meal_breakdown, MacroBreakdown};
use crate::llm::TextGenerator;
use crate::models::{DataSource, FoodRecord, MealLogEntry, MealType, NutrientProfile, Recipe};
use crate::stores::MealLogStore;

/// USDA results returned by a food search
const SEARCH_LIMIT: u32 = 10;

/// Values used when no source and no estimate are available, per 100 g
pub const DEFAULT_ESTIMATE: NutrientProfile =
    NutrientProfile::new(100.0, 5.0, 15.0, 3.0, 2.0, 5.0, 50.0);

const CAPABILITIES: &[&str] = &[
    "Food nutritional analysis",
    "Calorie calculation",
    "Nutrient breakdown",
    "Portion size estimation",
    "Nutritional goal tracking",
    "Food database search",
    "Recipe nutrition analysis",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NutritionTask {
    SearchFood,
    AnalyzeFood,
}

/// Nutritional analysis, calorie counting, and nutrient breakdown
pub struct NutritionHandler {
    generator: Arc<TextGenerator>,
    sources: Vec<Arc<dyn FoodDataProvider>>,
    search: Option<Arc<UsdaFoodProvider>>,
    foods: FoodNameExtractor,
    quantities: QuantityParser,
    tasks: FirstMatch<NutritionTask>,
    meals: Arc<dyn MealLogStore>,
    thresholds: InsightThresholds,
}

impl NutritionHandler {
    /// Identity the handler speaks as
    #[must_use]
    pub fn default_identity() -> HandlerIdentity {
        HandlerIdentity::new(
            HandlerId::Nutrition.agent_name(),
            "Nutritional analysis, calorie counting, and nutrient breakdown specialist",
            CAPABILITIES,
        )
    }

    /// Build the handler
    ///
    /// `sources` are tried in order for every lookup. `search` backs the
    /// food search subtype; without it searches go straight to suggestions.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in pattern fails to compile.
    pub fn new(
        deps: &HandlerDeps,
        sources: Vec<Arc<dyn FoodDataProvider>>,
        search: Option<Arc<UsdaFoodProvider>>,
    ) -> AppResult<Self> {
        let tasks = FirstMatch::new()
            .keywords(NutritionTask::SearchFood, &["search", "find food", "lookup"])?
            .keywords(
                NutritionTask::AnalyzeFood,
                &["analyze", "nutrition", "calories", "nutrients", "calculate"],
            )?;
        Ok(Self {
            generator: Arc::new(deps.generator_for(Self::default_identity())),
            sources,
            search,
            foods: FoodNameExtractor::new()?,
            quantities: QuantityParser::new()?,
            tasks,
            meals: deps.meals.clone(),
            thresholds: deps.policy.insights.clone(),
        })
    }

    /// The handler's text generator, for callers that should share its pacing
    #[must_use]
    pub fn generator(&self) -> Arc<TextGenerator> {
        self.generator.clone()
    }

    /// First record any configured source returns for `query`
    ///
    /// # Errors
    ///
    /// Returns an error if a source rejects the query as invalid.
    pub async fn lookup_sources(&self, query: &FoodQuery) -> AppResult<Option<FoodRecord>> {
        for source in &self.sources {
            if let Some(record) = source.lookup(query).await? {
                debug!(source = source.name(), food = %query.food_name, "Food resolved");
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Resolve `query` through every step of the lookup chain
    ///
    /// # Errors
    ///
    /// Returns an error if a source rejects the query as invalid.
    pub async fn lookup_food(
        &self,
        query: &FoodQuery,
        context: &Map<String, Value>,
    ) -> AppResult<FoodRecord> {
        if let Some(record) = self.lookup_sources(query).await? {
            return Ok(record);
        }
        if let Some(record) = self.estimate_with_ai(query, context).await {
            return Ok(record);
        }
        debug!(food = %query.food_name, "Using default nutrient values");
        Ok(FoodReference::per_100g(query.food_name.clone(), DEFAULT_ESTIMATE).scale_to(
            query.quantity,
            DataSource::Default,
            None,
        ))
    }

    async fn estimate_with_ai(
        &self,
        query: &FoodQuery,
        context: &Map<String, Value>,
    ) -> Option<FoodRecord> {
        let prompt = format!(
            "Estimate the nutritional content of {quantity} g of {food}.\n\
             Give calories, protein (g), carbs (g), fat (g), fiber (g), sugar (g) and sodium (mg).\n\
             Respond with a JSON object using exactly these keys: \
             calories, protein, carbs, fat, fiber, sugar, sodium.",
            quantity = query.quantity,
            food = query.food_name
        );
        let text = match self.generator.try_generate(&prompt, context).await {
            Ok(text) => text,
            Err(e) => {
                debug!(error = %e, food = %query.food_name, "AI estimate unavailable");
                return None;
            }
        };
        let nutrients = parse_estimate(&text)?;
        // The estimate is already for the requested quantity.
        Some(
            FoodReference::per_item(query.food_name.clone(), query.quantity, nutrients).scale_to(
                query.quantity,
                DataSource::AiEstimation,
                None,
            ),
        )
    }

    fn classify(&self, request: &HandlerRequest) -> Option<NutritionTask> {
        if request.kind == RequestKind::SearchFood {
            return Some(NutritionTask::SearchFood);
        }
        self.tasks
            .first(&request.lowercase())
            .or_else(|| (request.kind == RequestKind::AnalyzeFood).then_some(NutritionTask::AnalyzeFood))
    }

    #[instrument(skip_all, fields(handler = "nutrition", food = %query.food_name))]
    async fn analyze_food(
        &self,
        request: &HandlerRequest,
        query: &FoodQuery,
    ) -> AppResult<HandlerResponse> {
        let record = self.lookup_food(query, &request.context).await?;
        let macros = MacroBreakdown::analyze(&record.nutrients, &self.thresholds);

        let mut text = format!(
            "**Nutrition Analysis for {} {} of {}:**\n",
            record.quantity, record.unit, record.food_name
        );
        if let Some(count) = query.count {
            let _ = writeln!(text, "({count} items)");
        }
        text.push_str(&format_nutrient_lines(&record.nutrients));
        let _ = write!(
            text,
            "Source: {}\n\n{}\n\n",
            record.source.label(),
            macros.summary()
        );

        let record_json = serde_json::to_string_pretty(&record)?;
        let insights = self
            .generator
            .generate(
                &format!(
                    "Give brief health insights about {} based on this nutrition data:\n{}\n\
                     Cover the key nutritional benefits, health considerations, and the best \
                     ways to eat it. Keep it concise and positive.",
                    record.food_name, record_json
                ),
                &request.context,
            )
            .await;
        let _ = write!(text, "**Health Insights:**\n{insights}");

        if is_loggable(query, &record) {
            let meal_type = request
                .context
                .get("meal_type")
                .and_then(Value::as_str)
                .map_or(MealType::Snack, MealType::from_str_lossy);
            let entry =
                MealLogEntry::from_record(request.user_id(), &record, meal_type, Utc::now());
            if let Err(e) = self.meals.add_entry(entry).await {
                warn!(error = %e, user.id = %request.user_id(), "Failed to log analyzed food");
            }
        } else {
            debug!(food = %record.food_name, "Analysis not logged, food not recognized");
        }

        Ok(HandlerResponse::success(
            HandlerId::Nutrition,
            HandlerPayload::Nutrition(NutritionPayload::Analysis { record, macros }),
            text,
        ))
    }

    #[instrument(skip_all, fields(handler = "nutrition"))]
    async fn search_food(&self, request: &HandlerRequest) -> AppResult<HandlerResponse> {
        let query = request
            .context
            .get("query")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|query| !query.is_empty())
            .map(ToOwned::to_owned)
            .or_else(|| self.foods.extract(&request.message))
            .unwrap_or_else(|| request.message.clone());

        let results: Vec<FoodSearchResult> = match &self.search {
            Some(usda) if usda.is_configured() => usda.search(&query, SEARCH_LIMIT).await?,
            _ => Vec::new(),
        };

        if !results.is_empty() {
            let mut text = format!("Found {} foods matching '{query}':\n", results.len());
            for (rank, food) in results.iter().enumerate() {
                let _ = write!(text, "{}. {} (FDC {})", rank + 1, food.description, food.fdc_id);
                if let Some(brand) = &food.brand {
                    let _ = write!(text, " - {brand}");
                }
                text.push('\n');
            }
            return Ok(HandlerResponse::success(
                HandlerId::Nutrition,
                HandlerPayload::Nutrition(NutritionPayload::Search {
                    query,
                    results,
                    suggestions: None,
                }),
                text,
            ));
        }

        let suggestions = self
            .generator
            .generate(
                &format!(
                    "The food database returned nothing for '{query}'. Suggest similar common \
                     foods and give approximate nutrition per 100 g for each."
                ),
                &request.context,
            )
            .await;
        Ok(HandlerResponse::success(
            HandlerId::Nutrition,
            HandlerPayload::Nutrition(NutritionPayload::Search {
                query,
                results,
                suggestions: Some(suggestions.clone()),
            }),
            suggestions,
        ))
    }

    #[instrument(skip_all, fields(handler = "nutrition", recipe = %recipe.name))]
    async fn calculate_recipe(
        &self,
        request: &HandlerRequest,
        recipe: &Recipe,
    ) -> AppResult<HandlerResponse> {
        let servings = recipe.servings.unwrap_or(1).max(1);
        let mut ingredients = Vec::new();
        let mut unresolved = Vec::new();
        for line in &recipe.ingredients {
            let resolved = match FoodQuery::from_text(line, &self.foods, &self.quantities) {
                Some(query) => self.lookup_sources(&query).await?,
                None => None,
            };
            match resolved {
                Some(record) => ingredients.push(record),
                None => unresolved.push(line.clone()),
            }
        }

        let any_resolved = !ingredients.is_empty();
        let total = NutrientProfile::total(ingredients.iter().map(|r| &r.nutrients)).rounded(1);
        let per_serving = total.scaled(1.0 / f64::from(servings)).rounded(1);
        let payload = HandlerPayload::Nutrition(NutritionPayload::Recipe {
            recipe: recipe.name.clone(),
            servings,
            total,
            per_serving,
            ingredients,
            unresolved: unresolved.clone(),
        });

        if !any_resolved {
            return Ok(HandlerResponse::no_data(
                HandlerId::Nutrition,
                payload,
                format!(
                    "I couldn't find nutrition data for any ingredient of {}.",
                    recipe.name
                ),
            ));
        }

        let mut text = format!(
            "**Recipe Nutrition for {} ({servings} servings):**\nPer serving:\n",
            recipe.name
        );
        text.push_str(&format_nutrient_lines(&per_serving));
        if !unresolved.is_empty() {
            let _ = writeln!(text, "Not included: {}", unresolved.join(", "));
        }
        let insights = self
            .generator
            .generate(
                &format!(
                    "Comment briefly on the nutritional balance of the recipe '{}' with these \
                     values per serving:\n{}",
                    recipe.name,
                    format_nutrient_lines(&per_serving)
                ),
                &request.context,
            )
            .await;
        let _ = write!(text, "\n**Health Insights:**\n{insights}");

        Ok(HandlerResponse::success(HandlerId::Nutrition, payload, text))
    }

    #[instrument(skip_all, fields(handler = "nutrition"))]
    async fn daily_analysis(&self, request: &HandlerRequest) -> AppResult<HandlerResponse> {
        let entries = match request.context.get("food_log").and_then(Value::as_array) {
            Some(items) => self.resolve_food_log(request, items).await?,
            None => {
                let today = Utc::now().date_naive();
                self.meals
                    .entries_between(
                        request.user_id(),
                        day_start(today),
                        day_start(today + Duration::days(1)),
                    )
                    .await?
            }
        };

        let totals = NutrientProfile::total(entries.iter().map(|e| &e.nutrients)).rounded(1);
        let macros = MacroBreakdown::analyze(&totals, &self.thresholds);
        let meals = meal_breakdown(&entries);
        let payload = |insights: String| {
            HandlerPayload::Nutrition(NutritionPayload::DailyAnalysis {
                entries: entries.len(),
                totals,
                macros,
                meals: meals.clone(),
                insights,
            })
        };

        if entries.is_empty() {
            return Ok(HandlerResponse::no_data(
                HandlerId::Nutrition,
                payload(String::new()),
                "There is nothing to analyze yet. Send a food log or log today's meals first.",
            ));
        }

        let mut by_meal = String::new();
        for (meal, summary) in &meals {
            let _ = writeln!(
                by_meal,
                "- {}: {:.0} kcal ({} items)",
                meal.as_str(),
                summary.calories,
                summary.items
            );
        }
        let nutrient_lines = format_nutrient_lines(&totals);
        let insights = self
            .generator
            .generate(
                &format!(
                    "Review this day of eating.\nTotals:\n{nutrient_lines}\nBy meal:\n{by_meal}\n\
                     Give brief insights on overall balance, meal distribution, and one or two \
                     concrete improvements."
                ),
                &request.context,
            )
            .await;

        let text = format!(
            "**Daily Nutrition Analysis ({} items):**\n{nutrient_lines}\n**By meal:**\n{by_meal}\n\
             {}\n\n**Insights:**\n{insights}",
            entries.len(),
            macros.summary()
        );
        Ok(HandlerResponse::success(
            HandlerId::Nutrition,
            payload(insights),
            text,
        ))
    }

    /// Resolve `food_log` items into unsaved meal entries
    ///
    /// An item is either a text line ("200g chicken") or an object with
    /// `food`, an optional `quantity` (grams, or text such as "2 cups") and
    /// an optional `meal_type`. Items naming no food are skipped.
    async fn resolve_food_log(
        &self,
        request: &HandlerRequest,
        items: &[Value],
    ) -> AppResult<Vec<MealLogEntry>> {
        let now = Utc::now();
        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let Some((query, meal_type)) = self.food_log_query(item) else {
                debug!(item = %item, "Food log item skipped");
                continue;
            };
            let record = self.lookup_food(&query, &request.context).await?;
            entries.push(MealLogEntry::from_record(
                request.user_id(),
                &record,
                meal_type,
                now,
            ));
        }
        Ok(entries)
    }

    fn food_log_query(&self, item: &Value) -> Option<(FoodQuery, MealType)> {
        if let Some(line) = item.as_str() {
            let query = FoodQuery::from_text(line, &self.foods, &self.quantities)?;
            return Some((query, MealType::default()));
        }
        let food = item
            .get("food")
            .or_else(|| item.get("food_name"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|food| !food.is_empty())?
            .to_lowercase();
        let meal_type = item
            .get("meal_type")
            .and_then(Value::as_str)
            .map(MealType::from_str_lossy)
            .unwrap_or_default();
        let query = if let Some(grams) = item.get("quantity").and_then(Value::as_f64) {
            FoodQuery::new(food, grams)
        } else {
            let amount = item
                .get("quantity")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let parsed = self.quantities.parse(&format!("{amount} {food}"), &food);
            FoodQuery {
                count: parsed.count,
                quantity_kind: parsed.kind,
                ..FoodQuery::new(food, parsed.grams)
            }
        };
        Some((query, meal_type))
    }

    async fn general(&self, request: &HandlerRequest) -> HandlerResponse {
        let answer = self
            .generator
            .generate(
                &format!(
                    "Answer this nutrition question: {}\n\
                     Give accurate, science-based information that is easy to understand, with \
                     specific nutritional values where possible.",
                    request.message
                ),
                &request.context,
            )
            .await;
        HandlerResponse::success(
            HandlerId::Nutrition,
            HandlerPayload::Nutrition(NutritionPayload::General {
                answer: answer.clone(),
            }),
            answer,
        )
    }
}

#[async_trait]
impl RequestHandler for NutritionHandler {
    fn id(&self) -> HandlerId {
        HandlerId::Nutrition
    }

    fn identity(&self) -> &HandlerIdentity {
        self.generator.identity()
    }

    fn supported_requests(&self) -> &'static [&'static str] {
        &[
            "analyze_food",
            "search_food",
            "calculate_recipe",
            "daily_analysis",
            "general",
        ]
    }

    fn data_sources(&self) -> &'static [&'static str] {
        &["USDA FoodData Central", "Built-in food table", "AI Estimation"]
    }

    async fn process(&self, request: &HandlerRequest) -> AppResult<HandlerResponse> {
        if let Some(Handoff::RecipeToAnalyze(recipe)) = &request.handoff {
            return self.calculate_recipe(request, recipe).await;
        }
        if request.kind == RequestKind::DailyAnalysis {
            return self.daily_analysis(request).await;
        }
        match self.classify(request) {
            Some(NutritionTask::SearchFood) => self.search_food(request).await,
            Some(NutritionTask::AnalyzeFood) => {
                match FoodQuery::from_text(&request.message, &self.foods, &self.quantities) {
                    Some(query) if !query.is_guess() => self.analyze_food(request, &query).await,
                    _ => Ok(self.general(request).await),
                }
            }
            None => Ok(self.general(request).await),
        }
    }
}

/// Only foods a data source knows, or that the text named explicitly, go
/// into the meal log
fn is_loggable(query: &FoodQuery, record: &FoodRecord) -> bool {
    matches!(record.source, DataSource::Usda | DataSource::Database)
        || query.name_match == NameMatch::Pattern
}

/// Labels and units of the nutrient lines, in display order
const NUTRIENT_LINES: [(&str, &str); 7] = [
    ("Calories", "kcal"),
    ("Protein", "g"),
    ("Carbohydrates", "g"),
    ("Fat", "g"),
    ("Fiber", "g"),
    ("Sugar", "g"),
    ("Sodium", "mg"),
];

/// One "Label: value unit" line per nutrient
#[must_use]
pub fn format_nutrient_lines(nutrients: &NutrientProfile) -> String {
    let mut text = String::new();
    for ((label, unit), (_, value)) in NUTRIENT_LINES.iter().zip(nutrients.fields()) {
        let _ = writeln!(text, "{label}: {value:.1} {unit}");
    }
    text
}

fn nutrient_line_regex() -> Option<&'static Regex> {
    static LINE: OnceLock<Option<Regex>> = OnceLock::new();
    LINE.get_or_init(|| {
        Regex::new(
            r"(?im)^[\s*\-]*(calories|protein|carbohydrates|carbs|fat|fiber|sugar|sodium)\b[^:\n]*:[\s*]*(-?\d+(?:\.\d+)?)",
        )
        .ok()
    })
    .as_ref()
}

/// Read nutrient values back from "Label: value" lines
///
/// The first line for each label wins. Returns `None` when no calories
/// line is present.
#[must_use]
pub fn parse_nutrient_lines(text: &str) -> Option<NutrientProfile> {
    let regex = nutrient_line_regex()?;
    let mut values: BTreeMap<String, f64> = BTreeMap::new();
    for captures in regex.captures_iter(text) {
        let label = match captures[1].to_lowercase().as_str() {
            "carbohydrates" => "carbs".to_owned(),
            other => other.to_owned(),
        };
        if let Ok(value) = captures[2].parse::<f64>() {
            values.entry(label).or_insert(value);
        }
    }
    let calories = *values.get("calories")?;
    let get = |key: &str| values.get(key).copied().unwrap_or(0.0);
    Some(NutrientProfile::new(
        calories,
        get("protein"),
        get("carbs"),
        get("fat"),
        get("fiber"),
        get("sugar"),
        get("sodium"),
    ))
}

fn json_object_regex() -> Option<&'static Regex> {
    static OBJECT: OnceLock<Option<Regex>> = OnceLock::new();
    OBJECT.get_or_init(|| Regex::new(r"(?s)\{.*\}").ok()).as_ref()
}

/// Nutrients from a generated estimate: a JSON object, else labelled lines
fn parse_estimate(text: &str) -> Option<NutrientProfile> {
    json_object_regex()
        .and_then(|regex| regex.find(text))
        .and_then(|found| serde_json::from_str::<NutrientProfile>(found.as_str()).ok())
        .or_else(|| parse_nutrient_lines(text))
        .filter(|nutrients| nutrients.calories > 0.0)
}
