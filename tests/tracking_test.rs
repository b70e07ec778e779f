// ABOUTME: Integration tests for the tracking handler's reports over the meal log
// ABOUTME: Covers report dispatch, no-data answers, goal targets, and JSON fixture loading
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::fs;

use chrono::{Duration, Utc};
use common::{meal, user_context, Harness, ScriptedLlm};
use platewise::handlers::{
    HandlerRequest, HandlerResponse, Handoff, RequestHandler, ResponseStatus, TrackingHandler,
};
use platewise::models::{MealType, Sex, UserProfile};
use platewise::stores::{MealLogStore, UserProfileStore};
use serde_json::{json, Value};
use tempfile::tempdir;

async fn ask(harness: &Harness, user: &str, message: &str) -> HandlerResponse {
    let handler = TrackingHandler::new(&harness.deps).unwrap();
    handler
        .process(&HandlerRequest::new(message).with_context(user_context(user)))
        .await
        .unwrap()
}

fn payload(response: &HandlerResponse) -> Value {
    serde_json::to_value(&response.payload).unwrap()
}

#[tokio::test]
async fn test_daily_report_without_entries_is_no_data() {
    let harness = Harness::new(ScriptedLlm::replying("ok"));
    let response = ask(&harness, "ana", "track my daily progress").await;
    assert_eq!(response.status, ResponseStatus::NoData);
    assert!(harness.llm.prompts().is_empty());
}

#[tokio::test]
async fn test_daily_report_compares_with_yesterday() {
    let harness = Harness::new(ScriptedLlm::replying("Eat more greens."));
    let now = Utc::now();
    let store = &harness.store;
    store
        .add_entry(meal("ben", now, "oats", MealType::Breakfast, 300.0, 10.0))
        .await
        .unwrap();
    store
        .add_entry(meal("ben", now, "chicken", MealType::Dinner, 500.0, 40.0))
        .await
        .unwrap();
    store
        .add_entry(meal("ben", now - Duration::days(1), "pasta", MealType::Dinner, 1000.0, 30.0))
        .await
        .unwrap();

    let response = ask(&harness, "ben", "how am I doing today?").await;
    assert_eq!(response.status, ResponseStatus::Success);

    let json = payload(&response);
    assert_eq!(json["type"], "daily");
    assert_eq!(json["entries"], 2);
    assert_eq!(json["totals"]["calories"], 800.0);
    assert_eq!(json["change_from_yesterday"]["calories"], -200.0);
    assert_eq!(json["meals"]["dinner"]["items"], 1);

    let text = response.text.unwrap();
    assert!(text.contains("Calories vs yesterday: -200 kcal"));
    assert!(text.ends_with("Eat more greens."));
}

#[tokio::test]
async fn test_weekly_report_counts_tracked_days() {
    let harness = Harness::new(ScriptedLlm::replying("ok"));
    let now = Utc::now();
    for days_ago in [0, 1, 3] {
        harness
            .store
            .add_entry(meal(
                "cal",
                now - Duration::days(days_ago),
                "rice",
                MealType::Lunch,
                600.0,
                12.0,
            ))
            .await
            .unwrap();
    }
    // Outside the window.
    harness
        .store
        .add_entry(meal("cal", now - Duration::days(20), "cake", MealType::Snack, 900.0, 5.0))
        .await
        .unwrap();

    let response = ask(&harness, "cal", "show my weekly summary").await;
    let json = payload(&response);
    assert_eq!(json["type"], "weekly");
    assert_eq!(json["consistency"], "3/7 days");
    assert_eq!(json["days"].as_array().unwrap().len(), 3);
    assert_eq!(json["average"]["calories"], 600.0);
}

#[tokio::test]
async fn test_goals_without_entries_still_report_targets() {
    let harness = Harness::new(ScriptedLlm::replying("ok"));
    let response = ask(&harness, "dee", "what are my goals").await;

    assert_eq!(response.status, ResponseStatus::NoData);
    let json = payload(&response);
    assert_eq!(json["type"], "goals");
    assert_eq!(json["targets"]["personalized"], false);
    assert!(json["progress"].as_array().unwrap().is_empty());
    assert!(response.text.unwrap().contains("Start logging your meals"));
}

#[tokio::test]
async fn test_goals_use_profile_targets() {
    let harness = Harness::new(ScriptedLlm::replying("ok"));
    let dir = tempdir().unwrap();
    let profile = dir.path().join("profile.json");
    fs::write(
        &profile,
        json!({
            "age": 30,
            "gender": "male",
            "weight": 80.0,
            "height": 180.0,
            "activity_level": "sedentary",
            "health_goals": ["weight_loss"]
        })
        .to_string(),
    )
    .unwrap();
    harness.store.load_profile_file("eli", &profile).await.unwrap();
    assert!(harness.store.get_profile("eli").await.unwrap().is_some());

    harness
        .store
        .add_entry(meal("eli", Utc::now(), "salmon", MealType::Dinner, 700.0, 45.0))
        .await
        .unwrap();

    let response = ask(&harness, "eli", "am I hitting my target?").await;
    assert_eq!(response.status, ResponseStatus::Success);

    let json = payload(&response);
    assert_eq!(json["targets"]["personalized"], true);
    // Sedentary maintenance is 1853.632 * 1.2, minus the 500 kcal deficit.
    assert_eq!(json["targets"]["calories"], 1724.0);
    let nutrients: Vec<&str> = json["progress"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["nutrient"].as_str().unwrap())
        .collect();
    assert_eq!(nutrients, vec!["calories", "protein", "carbs", "fat", "fiber"]);
}

#[tokio::test]
async fn test_profile_without_activity_level_uses_default_targets() {
    let harness = Harness::new(ScriptedLlm::replying("ok"));
    harness
        .store
        .save_profile(
            "fin",
            UserProfile {
                age: Some(25),
                sex: Some(Sex::Female),
                weight_kg: Some(60.0),
                height_cm: Some(165.0),
                ..UserProfile::default()
            },
        )
        .await
        .unwrap();

    let response = ask(&harness, "fin", "what are my goals").await;
    let json = payload(&response);
    assert_eq!(json["targets"]["personalized"], false);
    assert_eq!(json["targets"]["calories"], 2000.0);
}

#[tokio::test]
async fn test_logging_guide_is_info() {
    let harness = Harness::new(ScriptedLlm::replying("ok"));
    let response = ask(&harness, "fay", "how do I log a meal").await;
    assert_eq!(response.status, ResponseStatus::Info);
    assert_eq!(payload(&response)["type"], "logging_guide");
    assert!(harness.llm.prompts().is_empty());
}

#[tokio::test]
async fn test_empty_message_and_handoff_give_overview() {
    let harness = Harness::new(ScriptedLlm::replying("ok"));
    let handler = TrackingHandler::new(&harness.deps).unwrap();

    let empty = handler
        .process(&HandlerRequest::new("").with_context(user_context("gil")))
        .await
        .unwrap();
    assert_eq!(empty.status, ResponseStatus::Success);
    assert_eq!(payload(&empty)["type"], "overview");

    let handoff = handler
        .process(
            &HandlerRequest::new("analyze two eggs")
                .with_context(user_context("gil"))
                .with_handoff(Handoff::TrackData(json!({"food": "egg"}))),
        )
        .await
        .unwrap();
    assert_eq!(payload(&handoff)["type"], "overview");
    assert_eq!(payload(&handoff)["days_tracked"], 0);
}

#[tokio::test]
async fn test_monthly_and_trend_reports() {
    let harness = Harness::new(ScriptedLlm::replying("ok"));
    let now = Utc::now();
    for (days_ago, meal_type) in [
        (1, MealType::Breakfast),
        (2, MealType::Breakfast),
        (9, MealType::Dinner),
    ] {
        harness
            .store
            .add_entry(meal("hal", now - Duration::days(days_ago), "eggs", meal_type, 400.0, 25.0))
            .await
            .unwrap();
    }

    let monthly = ask(&harness, "hal", "my monthly report").await;
    let json = payload(&monthly);
    assert_eq!(json["type"], "monthly");
    assert_eq!(json["entries"], 3);
    assert_eq!(json["days_tracked"], 3);

    let trends = ask(&harness, "hal", "any eating patterns?").await;
    let json = payload(&trends);
    assert_eq!(json["type"], "trends");
    assert_eq!(json["meal_distribution"]["breakfast"], 2);
    assert_eq!(json["meal_distribution"]["dinner"], 1);
}

#[tokio::test]
async fn test_other_questions_get_generated_answer() {
    let harness = Harness::new(ScriptedLlm::replying("Weigh portions when you can."));
    let response = ask(&harness, "ivy", "any tips for accuracy?").await;
    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(payload(&response)["answer"], "Weigh portions when you can.");
}

#[tokio::test]
async fn test_meal_fixture_fills_missing_user() {
    let harness = Harness::new(ScriptedLlm::replying("ok"));
    let dir = tempdir().unwrap();
    let path = dir.path().join("meals.json");
    let logged_at = Utc::now().to_rfc3339();
    fs::write(
        &path,
        json!([
            {"logged_at": logged_at, "food_name": "toast", "meal_type": "breakfast", "calories": 250.0},
            {"user_id": "other", "logged_at": logged_at, "food_name": "soup", "calories": 180.0}
        ])
        .to_string(),
    )
    .unwrap();

    let loaded = harness.store.load_meals_file("jo", &path).await.unwrap();
    assert_eq!(loaded, 2);
    assert_eq!(harness.store.entries_since("jo", 1).await.unwrap().len(), 1);
    assert_eq!(harness.store.entries_since("other", 1).await.unwrap().len(), 1);

    let missing = harness
        .store
        .load_meals_file("jo", &dir.path().join("absent.json"))
        .await;
    assert!(missing.is_err());
}
