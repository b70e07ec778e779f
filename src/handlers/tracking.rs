// ABOUTME: Tracking handler reporting daily, weekly, and monthly intake, goals, and eating trends
// ABOUTME: Aggregates the meal log per day and compares averages with personalized targets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

//! # Tracking Handler
//!
//! Reports over the user's meal log. Dispatch is ordered:
//!
//! | Trigger | Report |
//! |---|---|
//! | empty message or a tracking handoff | overview |
//! | track, daily, progress, today | daily |
//! | week, weekly, "7 days" | weekly |
//! | month, monthly, "30 days" | monthly |
//! | goal, target, objective | goals |
//! | trend, pattern, habit | trends |
//! | log, add, record | logging guide |
//! | anything else | general |
//!
//! Every report except the overview, the logging guide and general answers
//! returns `no_data` when the relevant window has no entries.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use platewise_providers::FirstMatch;
use tracing::{instrument, warn};

use super::nutrition::format_nutrient_lines;
use super::{
    load_profile, HandlerDeps, HandlerId, HandlerIdentity, HandlerPayload, HandlerRequest,
    HandlerResponse, Handoff, RequestHandler, TrackingPayload,
};
use crate::config::NutritionPolicyConfig;
use crate::errors::AppResult;
use crate::intelligence::{
    average_per_day, calorie_trend, daily_targets, daily_totals, goal_progress, meal_breakdown,
    meal_distribution, weekly_summaries, TargetStatus,
};
use crate::llm::TextGenerator;
use crate::models::{ChatTurn, MealLogEntry, MealType, NutrientProfile};
use crate::stores::{ChatTurnStore, MealLogStore, UserProfileStore};

/// Chat turns replayed into overview and general prompts
const CHAT_TURNS: usize = 5;

const CAPABILITIES: &[&str] = &[
    "Daily nutrition tracking",
    "Progress analysis",
    "Goal monitoring",
    "Trend identification",
    "Behavioral insights",
    "Recommendation generation",
    "Weekly/monthly summaries",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackingReport {
    Daily,
    Weekly,
    Monthly,
    Goals,
    Trends,
    LoggingGuide,
}

pub(super) fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn difference(current: &NutrientProfile, previous: &NutrientProfile) -> NutrientProfile {
    let mut change = *current;
    change += previous.scaled(-1.0);
    change.rounded(1)
}

const fn status_label(status: TargetStatus) -> &'static str {
    match status {
        TargetStatus::Below => "below target",
        TargetStatus::OnTarget => "on target",
        TargetStatus::Above => "above target",
    }
}

fn chat_summary(turns: &[ChatTurn]) -> String {
    turns
        .iter()
        .rev()
        .map(|turn| format!("- {}", turn.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Diet tracking, progress monitoring, and behavioral analysis
pub struct TrackingHandler {
    generator: TextGenerator,
    reports: FirstMatch<TrackingReport>,
    meals: Arc<dyn MealLogStore>,
    chats: Arc<dyn ChatTurnStore>,
    profiles: Arc<dyn UserProfileStore>,
    policy: NutritionPolicyConfig,
}

impl TrackingHandler {
    /// Identity the handler speaks as
    #[must_use]
    pub fn default_identity() -> HandlerIdentity {
        HandlerIdentity::new(
            HandlerId::Tracking.agent_name(),
            "Diet tracking, progress monitoring, and behavioral analysis specialist",
            CAPABILITIES,
        )
    }

    /// Build the handler
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in pattern fails to compile.
    pub fn new(deps: &HandlerDeps) -> AppResult<Self> {
        let reports = FirstMatch::new()
            .keywords(TrackingReport::Daily, &["track", "daily", "progress", "today"])?
            .keywords(TrackingReport::Weekly, &["week", "weekly", "7 days"])?
            .keywords(TrackingReport::Monthly, &["month", "monthly", "30 days"])?
            .keywords(TrackingReport::Goals, &["goal", "target", "objective"])?
            .keywords(TrackingReport::Trends, &["trend", "pattern", "habit"])?
            .keywords(TrackingReport::LoggingGuide, &["log", "add", "record"])?;
        Ok(Self {
            generator: deps.generator_for(Self::default_identity()),
            reports,
            meals: deps.meals.clone(),
            chats: deps.chats.clone(),
            profiles: deps.profiles.clone(),
            policy: deps.policy.clone(),
        })
    }

    async fn entries_on(&self, user_id: &str, date: NaiveDate) -> AppResult<Vec<MealLogEntry>> {
        self.meals
            .entries_between(user_id, day_start(date), day_start(date + Duration::days(1)))
            .await
    }

    async fn recent_chat(&self, user_id: &str) -> Vec<ChatTurn> {
        self.chats
            .recent_turns(user_id, CHAT_TURNS)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, user.id = %user_id, "Chat history unavailable");
                Vec::new()
            })
    }

    #[instrument(skip_all, fields(handler = "tracking", report = "overview"))]
    async fn overview(&self, request: &HandlerRequest) -> AppResult<HandlerResponse> {
        let user_id = request.user_id();
        let today = self.entries_on(user_id, Utc::now().date_naive()).await?;
        let week = daily_totals(&self.meals.entries_since(user_id, 7).await?);
        let today_totals = NutrientProfile::total(today.iter().map(|e| &e.nutrients)).rounded(1);
        let week_average = average_per_day(&week).rounded(1);

        let mut text = format!(
            "**Diet Tracking Overview**\n\
             Today: {:.0} kcal and {:.1} g protein across {} entries\n\
             Last 7 days: {} days tracked, averaging {:.0} kcal per day\n\n",
            today_totals.calories,
            today_totals.protein,
            today.len(),
            week.len(),
            week_average.calories
        );

        let chat = self.recent_chat(user_id).await;
        if !chat.is_empty() {
            let insights = self
                .generator
                .generate(
                    &format!(
                        "Based on this user's tracking data and recent questions, give 3 \
                         personalized insights as bullet points.\n\
                         Today: {:.0} kcal, {:.1} g protein. Entries in the last 7 days: {}.\n\
                         Recent questions:\n{}",
                        today_totals.calories,
                        today_totals.protein,
                        week.iter().map(|d| d.entries).sum::<usize>(),
                        chat_summary(&chat)
                    ),
                    &request.context,
                )
                .await;
            let _ = write!(text, "**Personalized Insights:**\n{insights}\n\n");
        }
        text.push_str(
            "I can track daily progress, summarize weeks and months, check your goals, and \
             spot eating patterns. Try \"show my weekly summary\".",
        );

        Ok(HandlerResponse::success(
            HandlerId::Tracking,
            HandlerPayload::Tracking(TrackingPayload::Overview {
                today: today_totals,
                today_entries: today.len(),
                week_average,
                days_tracked: week.len(),
            }),
            text,
        ))
    }

    #[instrument(skip_all, fields(handler = "tracking", report = "daily"))]
    async fn daily(&self, request: &HandlerRequest) -> AppResult<HandlerResponse> {
        let user_id = request.user_id();
        let date = Utc::now().date_naive();
        let today = self.entries_on(user_id, date).await?;
        if today.is_empty() {
            return Ok(HandlerResponse::no_data(
                HandlerId::Tracking,
                HandlerPayload::Empty,
                "No food logged today yet. Ask me to analyze nutrition in a food to start \
                 tracking.",
            ));
        }

        let totals = NutrientProfile::total(today.iter().map(|e| &e.nutrients)).rounded(1);
        let yesterday = self.entries_on(user_id, date - Duration::days(1)).await?;
        let change_from_yesterday = (!yesterday.is_empty()).then(|| {
            difference(
                &totals,
                &NutrientProfile::total(yesterday.iter().map(|e| &e.nutrients)),
            )
        });
        let meals = meal_breakdown(&today);

        let mut text = format!("**Today's Nutrition ({date})**\n");
        text.push_str(&format_nutrient_lines(&totals));
        let _ = writeln!(text, "Entries: {}", today.len());
        if let Some(change) = &change_from_yesterday {
            let _ = writeln!(text, "Calories vs yesterday: {:+.0} kcal", change.calories);
        }
        text.push_str("\n**By meal:**\n");
        for (meal, summary) in &meals {
            let _ = writeln!(
                text,
                "{}: {:.0} kcal ({} items)",
                meal.as_str(),
                summary.calories,
                summary.items
            );
        }

        let targets = daily_targets(
            load_profile(self.profiles.as_ref(), request).await.as_ref(),
            &self.policy,
        );
        let insights = self
            .generator
            .generate(
                &format!(
                    "Review today's intake and give encouraging, actionable advice for tomorrow.\n\
                     Totals:\n{}Daily targets: {:.0} kcal, {:.0} g protein, {:.0} g carbs, \
                     {:.0} g fat.\nMeals: {}",
                    format_nutrient_lines(&totals),
                    targets.calories,
                    targets.protein,
                    targets.carbs,
                    targets.fat,
                    serde_json::to_string(&meals)?
                ),
                &request.context,
            )
            .await;
        let _ = write!(text, "\n**Insights:**\n{insights}");

        Ok(HandlerResponse::success(
            HandlerId::Tracking,
            HandlerPayload::Tracking(TrackingPayload::Daily {
                date,
                totals,
                entries: today.len(),
                change_from_yesterday,
                meals,
            }),
            text,
        ))
    }

    #[instrument(skip_all, fields(handler = "tracking", report = "weekly"))]
    async fn weekly(&self, request: &HandlerRequest) -> AppResult<HandlerResponse> {
        let entries = self.meals.entries_since(request.user_id(), 7).await?;
        if entries.is_empty() {
            return Ok(HandlerResponse::no_data(
                HandlerId::Tracking,
                HandlerPayload::Empty,
                "No meals logged in the last 7 days.",
            ));
        }

        let days = daily_totals(&entries);
        let average = average_per_day(&days).rounded(1);
        let consistency = format!("{}/7 days", days.len().min(7));

        let mut text = String::from("**Weekly Progress**\n");
        for day in &days {
            let _ = writeln!(
                text,
                "{}: {:.0} kcal ({} entries)",
                day.date, day.totals.calories, day.entries
            );
        }
        let _ = write!(
            text,
            "\nDaily average:\n{}Consistency: {consistency}\n",
            format_nutrient_lines(&average)
        );

        let insights = self
            .generator
            .generate(
                &format!(
                    "Analyze this week of eating and suggest improvements.\n\
                     Days tracked: {consistency}\nDaily average:\n{}",
                    format_nutrient_lines(&average)
                ),
                &request.context,
            )
            .await;
        let _ = write!(text, "\n**Weekly Insights:**\n{insights}");

        Ok(HandlerResponse::success(
            HandlerId::Tracking,
            HandlerPayload::Tracking(TrackingPayload::Weekly {
                days,
                average,
                consistency,
            }),
            text,
        ))
    }

    #[instrument(skip_all, fields(handler = "tracking", report = "monthly"))]
    async fn monthly(&self, request: &HandlerRequest) -> AppResult<HandlerResponse> {
        let entries = self.meals.entries_since(request.user_id(), 30).await?;
        if entries.is_empty() {
            return Ok(HandlerResponse::no_data(
                HandlerId::Tracking,
                HandlerPayload::Empty,
                "No meals logged in the last 30 days.",
            ));
        }

        let days = daily_totals(&entries);
        let average = average_per_day(&days).rounded(1);
        let weekly_trend = weekly_summaries(&entries);

        let mut text = format!(
            "**Monthly Summary**\nEntries: {}\nDays tracked: {}\nDaily average:\n{}",
            entries.len(),
            days.len(),
            format_nutrient_lines(&average)
        );
        if weekly_trend.len() >= 2 {
            text.push_str("\n**Weekly trend:**\n");
            for (week, summary) in weekly_trend.iter().enumerate() {
                let _ = writeln!(
                    text,
                    "Week {}: {:.0} kcal, {:.1} g protein ({} days)",
                    week + 1,
                    summary.avg_calories,
                    summary.avg_protein,
                    summary.days_tracked
                );
            }
        }

        let insights = self
            .generator
            .generate(
                &format!(
                    "Summarize this month of eating and name long-term habits to keep or \
                     change.\nEntries: {}. Days tracked: {}.\nDaily average:\n{}",
                    entries.len(),
                    days.len(),
                    format_nutrient_lines(&average)
                ),
                &request.context,
            )
            .await;
        let _ = write!(text, "\n**Monthly Insights:**\n{insights}");

        Ok(HandlerResponse::success(
            HandlerId::Tracking,
            HandlerPayload::Tracking(TrackingPayload::Monthly {
                entries: entries.len(),
                days_tracked: days.len(),
                average,
                weekly_trend,
            }),
            text,
        ))
    }

    #[instrument(skip_all, fields(handler = "tracking", report = "goals"))]
    async fn goals(&self, request: &HandlerRequest) -> AppResult<HandlerResponse> {
        let profile = load_profile(self.profiles.as_ref(), request).await;
        let targets = daily_targets(profile.as_ref(), &self.policy);
        let target_lines = format!(
            "Calories: {:.0} kcal\nProtein: {:.0} g\nCarbs: {:.0} g\nFat: {:.0} g\nFiber: {:.0} g\n",
            targets.calories, targets.protein, targets.carbs, targets.fat, targets.fiber
        );

        let entries = self.meals.entries_since(request.user_id(), 7).await?;
        if entries.is_empty() {
            return Ok(HandlerResponse::no_data(
                HandlerId::Tracking,
                HandlerPayload::Tracking(TrackingPayload::Goals {
                    targets,
                    progress: Vec::new(),
                }),
                format!(
                    "**Daily Targets**\n{target_lines}\nStart logging your meals to track \
                     progress toward these goals."
                ),
            ));
        }

        let days = daily_totals(&entries);
        let average = average_per_day(&days);
        let progress = goal_progress(&average, &targets, &self.policy.goals);

        let mut text = format!("**Goal Analysis ({} day average)**\n", days.len());
        for item in &progress {
            let _ = writeln!(
                text,
                "{}: {:.0}/{:.0} ({:.0}%) {}",
                item.nutrient,
                item.current,
                item.target,
                item.percentage,
                status_label(item.status)
            );
        }

        let insights = self
            .generator
            .generate(
                &format!(
                    "Give specific recommendations for reaching these daily nutrition goals.\n\
                     Targets:\n{target_lines}Progress: {}",
                    serde_json::to_string(&progress)?
                ),
                &request.context,
            )
            .await;
        let _ = write!(text, "\n**Goal Insights:**\n{insights}");

        Ok(HandlerResponse::success(
            HandlerId::Tracking,
            HandlerPayload::Tracking(TrackingPayload::Goals { targets, progress }),
            text,
        ))
    }

    #[instrument(skip_all, fields(handler = "tracking", report = "trends"))]
    async fn trends(&self, request: &HandlerRequest) -> AppResult<HandlerResponse> {
        let entries = self.meals.entries_since(request.user_id(), 14).await?;
        if entries.is_empty() {
            return Ok(HandlerResponse::no_data(
                HandlerId::Tracking,
                HandlerPayload::Empty,
                "Not enough data to identify trends yet. Keep logging for a week or two.",
            ));
        }

        let meal_distribution = meal_distribution(&entries);
        let trend = calorie_trend(&daily_totals(&entries));

        let mut text = String::from("**Eating Patterns (last 14 days)**\n");
        for (meal, count) in &meal_distribution {
            let _ = writeln!(text, "{}: {count} entries", meal.as_str());
        }
        let _ = writeln!(
            text,
            "Calorie trend: {} ({:+.0} kcal/day over {} days)",
            trend.direction(),
            trend.calorie_trend,
            trend.total_days
        );
        if let Some(weeks) = &trend.week_comparison {
            let _ = writeln!(
                text,
                "Week 1: {:.0} kcal/day, week 2: {:.0} kcal/day ({:+.0})",
                weeks.week1_avg, weeks.week2_avg, weeks.change
            );
        }

        let insights = self
            .generator
            .generate(
                &format!(
                    "Identify behavioral patterns in this eating data and suggest habit \
                     changes.\nMeal distribution: {}\nCalorie trend: {}",
                    serde_json::to_string(&meal_distribution)?,
                    serde_json::to_string(&trend)?
                ),
                &request.context,
            )
            .await;
        let _ = write!(text, "\n**Pattern Insights:**\n{insights}");

        Ok(HandlerResponse::success(
            HandlerId::Tracking,
            HandlerPayload::Tracking(TrackingPayload::Trends {
                meal_distribution,
                trend,
            }),
            text,
        ))
    }

    fn logging_guide() -> HandlerResponse {
        HandlerResponse::info(
            HandlerId::Tracking,
            HandlerPayload::Tracking(TrackingPayload::LoggingGuide {
                meal_types: vec![
                    MealType::Breakfast,
                    MealType::Lunch,
                    MealType::Dinner,
                    MealType::Snack,
                ],
            }),
            "**Food Logging**\n\
             Foods are logged when the nutrition calculator analyzes them.\n\
             1. Ask me to \"analyze nutrition in [food]\" first\n\
             2. The nutrition data is saved to your log automatically\n\
             3. Check your progress with \"track my daily progress\"\n\n\
             Examples: \"analyze nutrition in two eggs\", \"calories in 100g chicken\".",
        )
    }

    async fn general(&self, request: &HandlerRequest) -> AppResult<HandlerResponse> {
        let user_id = request.user_id();
        let recent = self.meals.entries_since(user_id, 7).await?;
        let chat = self.recent_chat(user_id).await;
        let answer = self
            .generator
            .generate(
                &format!(
                    "Answer this diet tracking question: {}\n\
                     Meal entries in the last 7 days: {}.\nRecent questions:\n{}\n\
                     Give practical advice for tracking and reaching nutrition goals.",
                    request.message,
                    recent.len(),
                    chat_summary(&chat)
                ),
                &request.context,
            )
            .await;
        Ok(HandlerResponse::success(
            HandlerId::Tracking,
            HandlerPayload::Tracking(TrackingPayload::General {
                answer: answer.clone(),
            }),
            answer,
        ))
    }
}

#[async_trait]
impl RequestHandler for TrackingHandler {
    fn id(&self) -> HandlerId {
        HandlerId::Tracking
    }

    fn identity(&self) -> &HandlerIdentity {
        self.generator.identity()
    }

    fn supported_requests(&self) -> &'static [&'static str] {
        &[
            "overview",
            "daily_progress",
            "weekly_progress",
            "monthly_progress",
            "goal_analysis",
            "trend_analysis",
            "log_food",
            "general",
        ]
    }

    fn data_sources(&self) -> &'static [&'static str] {
        &["Meal log", "Chat history", "User profile"]
    }

    async fn process(&self, request: &HandlerRequest) -> AppResult<HandlerResponse> {
        if request.message.trim().is_empty() || matches!(request.handoff, Some(Handoff::TrackData(_)))
        {
            return self.overview(request).await;
        }
        match self.reports.first(&request.lowercase()) {
            Some(TrackingReport::Daily) => self.daily(request).await,
            Some(TrackingReport::Weekly) => self.weekly(request).await,
            Some(TrackingReport::Monthly) => self.monthly(request).await,
            Some(TrackingReport::Goals) => self.goals(request).await,
            Some(TrackingReport::Trends) => self.trends(request).await,
            Some(TrackingReport::LoggingGuide) => Ok(Self::logging_guide()),
            None => self.general(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difference_is_signed() {
        let today = NutrientProfile::new(1800.0, 90.0, 200.0, 60.0, 20.0, 40.0, 2000.0);
        let yesterday = NutrientProfile::new(2000.0, 100.0, 180.0, 70.0, 25.0, 30.0, 2200.0);
        let change = difference(&today, &yesterday);
        assert!((change.calories + 200.0).abs() < 1e-9);
        assert!((change.carbs - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_day_start_is_midnight_utc() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(day_start(date).to_rfc3339(), "2025-03-01T00:00:00+00:00");
    }
}
