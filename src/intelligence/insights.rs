// ABOUTME: Macro calorie-share breakdown with threshold-based insight flags
// ABOUTME: Flags high-protein, high-fat, high-carb, high-sodium, and good-fiber foods
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::config::InsightThresholds;
use crate::constants::energy::{KCAL_PER_GRAM_CARBS, KCAL_PER_GRAM_FAT, KCAL_PER_GRAM_PROTEIN};
use crate::models::NutrientProfile;

bitflags! {
    /// Threshold flags raised by a nutrient profile
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct InsightFlags: u8 {
        /// Protein share of calories above the threshold
        const HIGH_PROTEIN = 1 << 0;
        /// Fat share of calories above the threshold
        const HIGH_FAT = 1 << 1;
        /// Carbohydrate share of calories above the threshold
        const HIGH_CARB = 1 << 2;
        /// Sodium above the threshold
        const HIGH_SODIUM = 1 << 3;
        /// Fiber at or above the threshold
        const GOOD_FIBER = 1 << 4;
    }
}

impl InsightFlags {
    /// One short note per raised flag
    #[must_use]
    pub fn notes(self) -> Vec<&'static str> {
        [
            (Self::HIGH_PROTEIN, "High in protein"),
            (Self::HIGH_FAT, "High in fat"),
            (Self::HIGH_CARB, "High in carbohydrates"),
            (Self::HIGH_SODIUM, "High in sodium"),
            (Self::GOOD_FIBER, "Good source of fiber"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, note)| note)
        .collect()
    }
}

/// Calories contributed by each macro and their share of the total
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroBreakdown {
    /// kcal from protein
    pub protein_kcal: f64,
    /// kcal from carbohydrates
    pub carbs_kcal: f64,
    /// kcal from fat
    pub fat_kcal: f64,
    /// Protein share of total calories (%)
    pub protein_pct: f64,
    /// Carbohydrate share of total calories (%)
    pub carbs_pct: f64,
    /// Fat share of total calories (%)
    pub fat_pct: f64,
    /// Raised flags
    pub flags: InsightFlags,
}

impl MacroBreakdown {
    /// Analyze a profile against `thresholds`
    ///
    /// Shares are relative to the reported calories, or to the macro-derived
    /// calories when none are reported.
    #[must_use]
    pub fn analyze(nutrients: &NutrientProfile, thresholds: &InsightThresholds) -> Self {
        let protein_kcal = nutrients.protein * KCAL_PER_GRAM_PROTEIN;
        let carbs_kcal = nutrients.carbs * KCAL_PER_GRAM_CARBS;
        let fat_kcal = nutrients.fat * KCAL_PER_GRAM_FAT;

        let total = if nutrients.calories > 0.0 {
            nutrients.calories
        } else {
            protein_kcal + carbs_kcal + fat_kcal
        };
        let share = |kcal: f64| if total > 0.0 { kcal / total * 100.0 } else { 0.0 };

        let protein_pct = share(protein_kcal);
        let carbs_pct = share(carbs_kcal);
        let fat_pct = share(fat_kcal);

        let mut flags = InsightFlags::empty();
        flags.set(InsightFlags::HIGH_PROTEIN, protein_pct > thresholds.high_protein_pct);
        flags.set(InsightFlags::HIGH_FAT, fat_pct > thresholds.high_fat_pct);
        flags.set(InsightFlags::HIGH_CARB, carbs_pct > thresholds.high_carb_pct);
        flags.set(InsightFlags::HIGH_SODIUM, nutrients.sodium > thresholds.high_sodium_mg);
        flags.set(InsightFlags::GOOD_FIBER, nutrients.fiber >= thresholds.good_fiber_g);

        Self {
            protein_kcal,
            carbs_kcal,
            fat_kcal,
            protein_pct,
            carbs_pct,
            fat_pct,
            flags,
        }
    }

    /// Short prose summary, one line per share plus raised flags
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Calories from protein {:.0}%, carbs {:.0}%, fat {:.0}%",
            self.protein_pct, self.carbs_pct, self.fat_pct
        )];
        lines.extend(self.flags.notes().into_iter().map(str::to_owned));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chicken_is_high_protein() {
        let chicken = NutrientProfile::new(165.0, 31.0, 0.0, 3.6, 0.0, 0.0, 74.0);
        let breakdown = MacroBreakdown::analyze(&chicken, &InsightThresholds::default());
        // 31 g * 4 = 124 kcal of 165
        assert!((breakdown.protein_pct - 124.0 / 165.0 * 100.0).abs() < 1e-9);
        assert!(breakdown.flags.contains(InsightFlags::HIGH_PROTEIN));
        assert!(!breakdown.flags.contains(InsightFlags::HIGH_CARB));
    }

    #[test]
    fn test_bread_flags_sodium_and_carbs() {
        let bread = NutrientProfile::new(265.0, 9.0, 49.0, 3.2, 2.7, 5.0, 491.0);
        let mut thresholds = InsightThresholds::default();
        let breakdown = MacroBreakdown::analyze(&bread, &thresholds);
        assert!(breakdown.flags.contains(InsightFlags::HIGH_CARB));
        assert!(!breakdown.flags.contains(InsightFlags::HIGH_SODIUM));

        thresholds.high_sodium_mg = 400.0;
        let strict = MacroBreakdown::analyze(&bread, &thresholds);
        assert!(strict.flags.contains(InsightFlags::HIGH_SODIUM));
    }

    #[test]
    fn test_zero_calories_uses_macro_total() {
        let profile = NutrientProfile::new(0.0, 10.0, 10.0, 0.0, 6.0, 0.0, 0.0);
        let breakdown = MacroBreakdown::analyze(&profile, &InsightThresholds::default());
        assert!((breakdown.protein_pct - 50.0).abs() < 1e-9);
        assert_eq!(breakdown.flags.notes().last(), Some(&"Good source of fiber"));
    }
}
