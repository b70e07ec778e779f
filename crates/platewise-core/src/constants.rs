// ABOUTME: Application constants for nutrient identifiers, unit conversions, and energy densities
// ABOUTME: Shared by provider adapters and the agent layer so both scale and label values identically
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

/// USDA `FoodData` Central nutrient identifiers
pub mod usda_nutrients {
    /// Energy (kcal)
    pub const ENERGY_KCAL: u32 = 1008;
    /// Protein (g)
    pub const PROTEIN: u32 = 1003;
    /// Carbohydrate, by difference (g)
    pub const CARBOHYDRATE: u32 = 1005;
    /// Total lipid (g)
    pub const TOTAL_FAT: u32 = 1004;
    /// Fiber, total dietary (g)
    pub const FIBER: u32 = 1079;
    /// Sugars, total (g)
    pub const SUGARS: u32 = 2000;
    /// Sodium, Na (mg)
    pub const SODIUM: u32 = 1093;
}

/// Conversion factors from household units to grams
pub mod unit_conversions {
    /// One cup
    pub const GRAMS_PER_CUP: f64 = 240.0;
    /// One tablespoon
    pub const GRAMS_PER_TABLESPOON: f64 = 15.0;
    /// One teaspoon
    pub const GRAMS_PER_TEASPOON: f64 = 5.0;
    /// One ounce
    pub const GRAMS_PER_OUNCE: f64 = 28.35;
    /// One pound
    pub const GRAMS_PER_POUND: f64 = 453.6;
    /// Canonical unit label
    pub const CANONICAL_UNIT: &str = "g";
}

/// Reference amounts used when scaling nutrient data
pub mod reference_amounts {
    /// Remote food data is expressed per this many grams
    pub const PER_100_GRAMS: f64 = 100.0;
    /// Mass of one large egg
    pub const EGG_GRAMS: f64 = 50.0;
    /// Mass of one medium fruit (banana, apple, orange)
    pub const MEDIUM_FRUIT_GRAMS: f64 = 150.0;
    /// Mass of one generic piece or serving
    pub const DEFAULT_PIECE_GRAMS: f64 = 100.0;
}

/// Energy densities of macronutrients
pub mod energy {
    /// Protein kcal per gram
    pub const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
    /// Carbohydrate kcal per gram
    pub const KCAL_PER_GRAM_CARBS: f64 = 4.0;
    /// Fat kcal per gram
    pub const KCAL_PER_GRAM_FAT: f64 = 9.0;
}

/// Names and labels used by the agent layer
pub mod agents {
    /// Communication protocols advertised by every handler
    pub const HANDLER_PROTOCOLS: &[&str] = &["HTTP", "JSON"];
    /// Protocols advertised by the coordinator
    pub const COORDINATOR_PROTOCOLS: &[&str] = &["HTTP", "JSON", "A2A"];
    /// Coordinator display name
    pub const COORDINATOR_NAME: &str = "AgentCoordinator";
    /// Routing method reported in response metadata
    pub const ROUTING_METHOD: &str = "intent_analysis";
}
