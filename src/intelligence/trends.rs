// ABOUTME: Day-keyed aggregation of meal log entries and simple calorie trend detection
// ABOUTME: Daily totals, per-day averages, meal breakdowns, half and week-over-week comparisons
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{MealLogEntry, MealType, NutrientProfile};

/// Days of data needed before weeks are compared
const WEEK_COMPARISON_MIN_DAYS: usize = 14;

/// Entries needed before weekly summaries are produced
const WEEKLY_SUMMARY_MIN_ENTRIES: usize = 7;

/// Entries a week needs to be summarized
const WEEK_MIN_ENTRIES: usize = 3;

/// Totals for one calendar day (UTC)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    /// Calendar day
    pub date: NaiveDate,
    /// Summed nutrients
    pub totals: NutrientProfile,
    /// Number of entries
    pub entries: usize,
}

/// Sum entries per day, oldest day first
#[must_use]
pub fn daily_totals(entries: &[MealLogEntry]) -> Vec<DailyTotal> {
    let mut days: BTreeMap<NaiveDate, DailyTotal> = BTreeMap::new();
    for entry in entries {
        let date = entry.logged_at.date_naive();
        let day = days.entry(date).or_insert_with(|| DailyTotal {
            date,
            totals: NutrientProfile::default(),
            entries: 0,
        });
        day.totals += entry.nutrients;
        day.entries += 1;
    }
    days.into_values().collect()
}

/// Mean of the daily totals; zero when there are no days
#[must_use]
pub fn average_per_day(days: &[DailyTotal]) -> NutrientProfile {
    if days.is_empty() {
        return NutrientProfile::default();
    }
    NutrientProfile::total(days.iter().map(|d| &d.totals)).scaled(1.0 / days.len() as f64)
}

/// Calories and item count for one meal slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MealSummary {
    /// Summed calories
    pub calories: f64,
    /// Number of entries
    pub items: usize,
}

/// Per-meal calories and item counts
#[must_use]
pub fn meal_breakdown(entries: &[MealLogEntry]) -> BTreeMap<MealType, MealSummary> {
    let mut meals: BTreeMap<MealType, MealSummary> = BTreeMap::new();
    for entry in entries {
        let meal = meals.entry(entry.meal_type).or_insert(MealSummary {
            calories: 0.0,
            items: 0,
        });
        meal.calories += entry.nutrients.calories;
        meal.items += 1;
    }
    meals
}

/// Entry count per meal slot
#[must_use]
pub fn meal_distribution(entries: &[MealLogEntry]) -> BTreeMap<MealType, usize> {
    meal_breakdown(entries)
        .into_iter()
        .map(|(meal, summary)| (meal, summary.items))
        .collect()
}

/// First week against second week of daily calories
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeekComparison {
    /// Average daily calories in the first seven days
    pub week1_avg: f64,
    /// Average daily calories in the next seven days
    pub week2_avg: f64,
    /// `week2_avg - week1_avg`
    pub change: f64,
}

/// Signed calorie trend over a day-keyed series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    /// Second-half average minus first-half average (kcal/day); zero with fewer than two days
    pub calorie_trend: f64,
    /// Days in the series
    pub total_days: usize,
    /// Present once at least fourteen days are available
    pub week_comparison: Option<WeekComparison>,
}

impl TrendReport {
    /// "increasing", "decreasing" or "stable"
    #[must_use]
    pub fn direction(&self) -> &'static str {
        if self.calorie_trend > 0.0 {
            "increasing"
        } else if self.calorie_trend < 0.0 {
            "decreasing"
        } else {
            "stable"
        }
    }
}

fn mean_calories(days: &[DailyTotal]) -> f64 {
    if days.is_empty() {
        0.0
    } else {
        days.iter().map(|d| d.totals.calories).sum::<f64>() / days.len() as f64
    }
}

/// Compare halves of the series and, with fourteen days, week 1 against week 2
#[must_use]
pub fn calorie_trend(days: &[DailyTotal]) -> TrendReport {
    let calorie_trend = if days.len() >= 2 {
        let (first, second) = days.split_at(days.len() / 2);
        mean_calories(second) - mean_calories(first)
    } else {
        0.0
    };

    let week_comparison = (days.len() >= WEEK_COMPARISON_MIN_DAYS).then(|| {
        let week1_avg = mean_calories(&days[..7]);
        let week2_avg = mean_calories(&days[7..14]);
        WeekComparison {
            week1_avg,
            week2_avg,
            change: week2_avg - week1_avg,
        }
    });

    TrendReport {
        calorie_trend,
        total_days: days.len(),
        week_comparison,
    }
}

/// Averages for one seven-day window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeekSummary {
    /// Average calories per tracked day
    pub avg_calories: f64,
    /// Average protein per tracked day
    pub avg_protein: f64,
    /// Distinct days with entries
    pub days_tracked: usize,
}

fn summarize_week(entries: &[&MealLogEntry]) -> Option<WeekSummary> {
    if entries.len() < WEEK_MIN_ENTRIES {
        return None;
    }
    let days_tracked = entries
        .iter()
        .map(|e| e.logged_at.date_naive())
        .collect::<BTreeSet<_>>()
        .len();
    let totals = NutrientProfile::total(entries.iter().map(|e| &e.nutrients));
    Some(WeekSummary {
        avg_calories: totals.calories / days_tracked as f64,
        avg_protein: totals.protein / days_tracked as f64,
        days_tracked,
    })
}

/// Split entries into consecutive seven-day windows starting at the oldest entry
///
/// Needs at least seven entries; windows with fewer than three entries are skipped.
#[must_use]
pub fn weekly_summaries(entries: &[MealLogEntry]) -> Vec<WeekSummary> {
    if entries.len() < WEEKLY_SUMMARY_MIN_ENTRIES {
        return Vec::new();
    }
    let mut sorted: Vec<&MealLogEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.logged_at);

    let mut weeks = Vec::new();
    let mut current: Vec<&MealLogEntry> = Vec::new();
    for entry in sorted {
        let starts_new_week = current
            .first()
            .is_some_and(|start| (entry.logged_at - start.logged_at).num_days() >= 7);
        if starts_new_week {
            weeks.extend(summarize_week(&current));
            current.clear();
        }
        current.push(entry);
    }
    weeks.extend(summarize_week(&current));
    weeks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn entry(day: i64, calories: f64, meal_type: MealType) -> MealLogEntry {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        MealLogEntry {
            id: Uuid::new_v4(),
            user_id: "u".to_owned(),
            logged_at: start + Duration::days(day),
            food_name: "food".to_owned(),
            meal_type,
            quantity_g: 100.0,
            nutrients: NutrientProfile::new(calories, 10.0, 0.0, 0.0, 0.0, 0.0, 0.0),
        }
    }

    #[test]
    fn test_daily_totals_group_by_date() {
        let entries = vec![
            entry(1, 300.0, MealType::Lunch),
            entry(0, 500.0, MealType::Breakfast),
            entry(0, 200.0, MealType::Snack),
        ];
        let days = daily_totals(&entries);
        assert_eq!(days.len(), 2);
        assert!((days[0].totals.calories - 700.0).abs() < f64::EPSILON);
        assert_eq!(days[0].entries, 2);
        assert!((average_per_day(&days).calories - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_trend_uses_halves_and_weeks() {
        let entries: Vec<_> = (0..14)
            .map(|d| entry(d, if d < 7 { 2000.0 } else { 2200.0 }, MealType::Dinner))
            .collect();
        let report = calorie_trend(&daily_totals(&entries));
        assert!((report.calorie_trend - 200.0).abs() < 1e-9);
        assert_eq!(report.direction(), "increasing");
        let weeks = report.week_comparison.unwrap();
        assert!((weeks.change - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_series_has_no_week_comparison() {
        let entries = vec![entry(0, 2000.0, MealType::Lunch), entry(1, 1800.0, MealType::Lunch)];
        let report = calorie_trend(&daily_totals(&entries));
        assert!((report.calorie_trend + 200.0).abs() < 1e-9);
        assert!(report.week_comparison.is_none());
    }

    #[test]
    fn test_meal_distribution_counts_slots() {
        let entries = vec![
            entry(0, 100.0, MealType::Breakfast),
            entry(0, 100.0, MealType::Breakfast),
            entry(0, 100.0, MealType::Dinner),
        ];
        let distribution = meal_distribution(&entries);
        assert_eq!(distribution[&MealType::Breakfast], 2);
        assert_eq!(distribution[&MealType::Dinner], 1);
    }

    #[test]
    fn test_weekly_summaries_skip_sparse_weeks() {
        let mut entries: Vec<_> = (0..7).map(|d| entry(d, 1500.0, MealType::Lunch)).collect();
        entries.push(entry(8, 1000.0, MealType::Lunch));
        let weeks = weekly_summaries(&entries);
        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks[0].days_tracked, 7);
        assert!(weekly_summaries(&entries[..3]).is_empty());
    }
}
