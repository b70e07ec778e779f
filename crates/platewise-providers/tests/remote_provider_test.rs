// ABOUTME: Integration tests for the USDA and HTTP recipe adapters against mock servers
// ABOUTME: Covers normalization, scaling, caching, and fail-soft behavior on HTTP errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use mockito::{Matcher, Server, ServerGuard};
use platewise_core::models::DataSource;
use platewise_providers::{
    FoodDataProvider, FoodQuery, HttpRecipeProvider, RecipeDataProvider, UsdaClientConfig,
    UsdaFoodProvider,
};

const APPLE_SEARCH: &str = r#"{
    "totalHits": 1,
    "foods": [{
        "fdcId": 171688,
        "description": "Apples, raw, with skin",
        "dataType": "SR Legacy",
        "foodCategory": "Fruits and Fruit Juices",
        "foodNutrients": [
            {"nutrientId": 1008, "nutrientName": "Energy", "unitName": "KCAL", "value": 52.0},
            {"nutrientId": 1003, "nutrientName": "Protein", "unitName": "G", "value": 0.26},
            {"nutrientId": 1005, "nutrientName": "Carbohydrate, by difference", "unitName": "G", "value": 13.81},
            {"nutrientId": 1004, "nutrientName": "Total lipid (fat)", "unitName": "G", "value": 0.17}
        ]
    }]
}"#;

fn usda_for(server: &ServerGuard) -> UsdaFoodProvider {
    UsdaFoodProvider::new(UsdaClientConfig {
        api_key: "test-key".to_owned(),
        base_url: server.url(),
        ..UsdaClientConfig::default()
    })
}

// ============================================================================
// USDA Adapter
// ============================================================================

#[tokio::test]
async fn test_usda_lookup_normalizes_and_scales() {
    let mut server = Server::new_async().await;
    let _search = server
        .mock("GET", "/foods/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(APPLE_SEARCH)
        .create_async()
        .await;

    let provider = usda_for(&server);
    let record = provider
        .lookup(&FoodQuery::new("apple", 200.0))
        .await
        .unwrap()
        .expect("apple should be found");

    assert_eq!(record.source, DataSource::Usda);
    assert_eq!(record.fdc_id, Some(171_688));
    assert!((record.scale_factor - 2.0).abs() < f64::EPSILON);
    assert!((record.nutrients.calories - 104.0).abs() < 0.1);
    assert!((record.nutrients.carbs - 27.6).abs() < 0.1);
    assert!(record.nutrients.sodium.abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_usda_http_500_is_not_found() {
    let mut server = Server::new_async().await;
    let _search = server
        .mock("GET", "/foods/search")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let provider = usda_for(&server);
    let record = provider
        .lookup(&FoodQuery::new("apple", 100.0))
        .await
        .unwrap();
    assert!(record.is_none());

    let results = provider.search("apple", 10).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_usda_search_results_are_cached() {
    let mut server = Server::new_async().await;
    let search = server
        .mock("GET", "/foods/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(APPLE_SEARCH)
        .expect(1)
        .create_async()
        .await;

    let provider = usda_for(&server);
    let first = provider.search("apple", 10).await.unwrap();
    let second = provider.search("Apple", 10).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first[0].category.as_deref(), Some("Fruits and Fruit Juices"));
    assert_eq!(provider.cache_stats().await, 1);
    search.assert_async().await;

    provider.clear_caches().await;
    assert_eq!(provider.cache_stats().await, 0);
}

#[tokio::test]
async fn test_usda_rejects_invalid_search_arguments() {
    let server = Server::new_async().await;
    let provider = usda_for(&server);

    assert!(provider.search("", 10).await.is_err());
    assert!(provider.search("apple", 0).await.is_err());
    assert!(provider.search("apple", 201).await.is_err());
}

// ============================================================================
// HTTP Recipe Adapter
// ============================================================================

#[tokio::test]
async fn test_recipe_provider_parses_wrapped_response() {
    let mut server = Server::new_async().await;
    let _search = server
        .mock("GET", "/recipes/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"recipes": [
                {"title": "Lentil Soup", "ingredients": ["lentils", "carrot"], "prepTime": "40 minutes", "calories": 320},
                {"name": "Oat Porridge", "ingredients": ["oats", "milk"]}
            ]}"#,
        )
        .create_async()
        .await;

    let provider = HttpRecipeProvider::new(server.url());
    let recipes = provider.search("lentils", 10).await.unwrap();

    assert_eq!(recipes.len(), 2);
    assert_eq!(recipes[0].name, "Lentil Soup");
    assert_eq!(recipes[0].prep_time.as_deref(), Some("40 minutes"));
    assert_eq!(recipes[1].calories, None);
}

#[tokio::test]
async fn test_recipe_provider_failure_yields_empty_list() {
    let mut server = Server::new_async().await;
    let _search = server
        .mock("GET", "/recipes/search")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let provider = HttpRecipeProvider::new(server.url());
    assert!(provider.search("soup", 5).await.unwrap().is_empty());
    assert!(provider.search("  ", 5).await.is_err());
}
