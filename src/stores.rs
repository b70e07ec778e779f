// ABOUTME: Persistence collaborator contracts for profiles, chat turns, and meal logs
// ABOUTME: Async traits with an in-memory implementation backed by RwLock-guarded maps
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

//! Storage collaborators
//!
//! The agent layer never owns durable state. It reads profiles and meal
//! logs, and hands finished turns to a [`ChatTurnStore`], through these
//! traits. [`InMemoryStore`] implements all three and is what the CLI and
//! the tests use.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::{AppError, AppResult};
use crate::models::{ChatTurn, MealLogEntry, UserProfile};

/// Read and write user profiles
#[async_trait]
pub trait UserProfileStore: Send + Sync {
    /// Profile for `user_id`, if one exists
    async fn get_profile(&self, user_id: &str) -> AppResult<Option<UserProfile>>;

    /// Create or replace the profile for `user_id`
    async fn save_profile(&self, user_id: &str, profile: UserProfile) -> AppResult<()>;
}

/// Persist and retrieve finished chat turns
#[async_trait]
pub trait ChatTurnStore: Send + Sync {
    /// Append a finished turn
    async fn append_turn(&self, turn: ChatTurn) -> AppResult<()>;

    /// Up to `limit` most recent turns for `user_id`, newest first
    async fn recent_turns(&self, user_id: &str, limit: usize) -> AppResult<Vec<ChatTurn>>;
}

/// Meal log access
#[async_trait]
pub trait MealLogStore: Send + Sync {
    /// Record one eaten food
    async fn add_entry(&self, entry: MealLogEntry) -> AppResult<()>;

    /// Entries for `user_id` logged in `[from, to)`, oldest first
    async fn entries_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<MealLogEntry>>;

    /// Entries for `user_id` from the last `days` days, oldest first
    async fn entries_since(&self, user_id: &str, days: i64) -> AppResult<Vec<MealLogEntry>> {
        let now = Utc::now();
        self.entries_between(user_id, now - Duration::days(days), now + Duration::seconds(1))
            .await
    }
}

/// In-memory implementation of every store
#[derive(Debug, Default)]
pub struct InMemoryStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
    turns: RwLock<HashMap<String, Vec<ChatTurn>>>,
    meals: RwLock<HashMap<String, Vec<MealLogEntry>>>,
}

impl InMemoryStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total meal entries across users
    pub async fn meal_count(&self) -> usize {
        self.meals.read().await.values().map(Vec::len).sum()
    }

    /// Save the JSON profile at `path` for `user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a profile.
    pub async fn load_profile_file(&self, user_id: &str, path: &Path) -> AppResult<()> {
        let profile: UserProfile = serde_json::from_str(&read_fixture(path)?)?;
        self.save_profile(user_id, profile).await
    }

    /// Add every entry of the JSON array at `path`; entries without a
    /// `user_id` are filed under `user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or an entry is malformed.
    pub async fn load_meals_file(&self, user_id: &str, path: &Path) -> AppResult<usize> {
        let raw: Vec<Value> = serde_json::from_str(&read_fixture(path)?)?;
        let count = raw.len();
        for mut value in raw {
            if let Value::Object(fields) = &mut value {
                fields
                    .entry("user_id")
                    .or_insert_with(|| Value::from(user_id));
            }
            self.add_entry(serde_json::from_value(value)?).await?;
        }
        Ok(count)
    }
}

fn read_fixture(path: &Path) -> AppResult<String> {
    fs::read_to_string(path).map_err(|e| {
        AppError::invalid_input(format!("Cannot read {}", path.display())).with_source(e)
    })
}

#[async_trait]
impl UserProfileStore for InMemoryStore {
    async fn get_profile(&self, user_id: &str) -> AppResult<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn save_profile(&self, user_id: &str, profile: UserProfile) -> AppResult<()> {
        self.profiles
            .write()
            .await
            .insert(user_id.to_owned(), profile);
        Ok(())
    }
}

#[async_trait]
impl ChatTurnStore for InMemoryStore {
    async fn append_turn(&self, turn: ChatTurn) -> AppResult<()> {
        self.turns
            .write()
            .await
            .entry(turn.user_id.clone())
            .or_default()
            .push(turn);
        Ok(())
    }

    async fn recent_turns(&self, user_id: &str, limit: usize) -> AppResult<Vec<ChatTurn>> {
        Ok(self
            .turns
            .read()
            .await
            .get(user_id)
            .map(|turns| turns.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl MealLogStore for InMemoryStore {
    async fn add_entry(&self, entry: MealLogEntry) -> AppResult<()> {
        let mut meals = self.meals.write().await;
        let entries = meals.entry(entry.user_id.clone()).or_default();
        let position = entries.partition_point(|existing| existing.logged_at <= entry.logged_at);
        entries.insert(position, entry);
        Ok(())
    }

    async fn entries_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<MealLogEntry>> {
        Ok(self
            .meals
            .read()
            .await
            .get(user_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.logged_at >= from && e.logged_at < to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MealType, NutrientProfile};
    use uuid::Uuid;

    fn entry(user: &str, hours_ago: i64) -> MealLogEntry {
        MealLogEntry {
            id: Uuid::new_v4(),
            user_id: user.to_owned(),
            logged_at: Utc::now() - Duration::hours(hours_ago),
            food_name: "rice".to_owned(),
            meal_type: MealType::Lunch,
            quantity_g: 100.0,
            nutrients: NutrientProfile::new(130.0, 2.7, 28.0, 0.3, 0.4, 0.1, 1.0),
        }
    }

    #[tokio::test]
    async fn test_meal_entries_stay_ordered_and_scoped() {
        let store = InMemoryStore::new();
        store.add_entry(entry("a", 2)).await.unwrap();
        store.add_entry(entry("a", 30)).await.unwrap();
        store.add_entry(entry("a", 24 * 10)).await.unwrap();
        store.add_entry(entry("b", 1)).await.unwrap();

        let week = store.entries_since("a", 7).await.unwrap();
        assert_eq!(week.len(), 2);
        assert!(week[0].logged_at < week[1].logged_at);
        assert_eq!(store.meal_count().await, 4);
    }

    #[tokio::test]
    async fn test_recent_turns_newest_first() {
        let store = InMemoryStore::new();
        for i in 0..3 {
            store
                .append_turn(ChatTurn {
                    user_id: "u".to_owned(),
                    session_id: None,
                    message: format!("m{i}"),
                    response_text: "r".to_owned(),
                    producing_handler: "NutritionCalculator".to_owned(),
                    timestamp: Utc::now(),
                })
                .await
                .unwrap();
        }
        let turns = store.recent_turns("u", 2).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].message, "m2");
        assert!(store.recent_turns("nobody", 5).await.unwrap().is_empty());
    }
}
