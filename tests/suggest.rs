use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use neguev_dispatch::api::rest::router;
use neguev_dispatch::config::SuggestConfig;
use neguev_dispatch::engine::menu::suggest_menu;
use neguev_dispatch::error::AppError;
use neguev_dispatch::state::AppState;
use neguev_dispatch::store::Store;
use neguev_dispatch::suggest::GeminiSuggester;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/models/test-model:generateContent";

fn state_for(server_uri: &str) -> Arc<AppState> {
    let config = SuggestConfig {
        endpoint: server_uri.to_string(),
        model: "test-model".to_string(),
        api_key: Some("test-key".to_string()),
        max_dishes: 3,
    };
    let suggester = GeminiSuggester::from_config(&config).unwrap();
    Arc::new(AppState::new(Store::in_memory(), 64).with_suggester(Arc::new(suggester), 3))
}

fn generated(dishes: Value) -> Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": dishes.to_string() }] }
        }]
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn suggestions_replace_the_menu() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_string_contains("Playero"))
        .respond_with(ResponseTemplate::new(200).set_body_json(generated(json!([
            { "name": "Pescado Frito", "description": "Con tostones", "price": 650.0 },
            { "name": "Yaroa", "description": "De pollo", "price": 300.0 },
            { "name": "Coco Frío", "description": "Directo del coco", "price": 100.0 },
            { "name": "Extra", "description": "Sobra", "price": 50.0 }
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let state = state_for(&server.uri());
    let app = router(state.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/menu/suggestions")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "theme": "Playero" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let menu = body_json(response).await;
    let menu = menu.as_array().unwrap();
    assert_eq!(menu.len(), 3);
    assert_eq!(menu[0]["name"], "Pescado Frito");
    assert_eq!(menu[0]["category"], "Platos");
    assert!(menu[0]["id"].as_str().unwrap().starts_with("ai-"));
    assert!(menu[0]["imageUrl"].as_str().unwrap().contains("Pescado%20Frito"));

    let stored = state.store.menu().await.unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[1].name, "Yaroa");
}

#[tokio::test]
async fn missing_theme_uses_the_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("Criollo Tradicional"))
        .respond_with(ResponseTemplate::new(200).set_body_json(generated(json!([
            { "name": "Locrio", "description": "De salami", "price": 380.0 }
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let state = state_for(&server.uri());
    let menu = suggest_menu(&state, Some("   ")).await.unwrap();
    assert_eq!(menu.len(), 1);
    assert_eq!(menu[0].name, "Locrio");
}

#[tokio::test]
async fn service_error_keeps_the_current_menu() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let state = state_for(&server.uri());
    let result = suggest_menu(&state, Some("Navidad")).await;

    assert!(matches!(result, Err(AppError::SuggestionUnavailable(_))));
    assert_eq!(state.store.menu().await.unwrap().len(), 6);
}

#[tokio::test]
async fn malformed_dishes_keep_the_current_menu() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "no es json" }] } }]
        })))
        .mount(&server)
        .await;

    let state = state_for(&server.uri());
    let result = suggest_menu(&state, None).await;

    assert!(matches!(result, Err(AppError::SuggestionUnavailable(_))));
    assert_eq!(state.store.menu().await.unwrap().len(), 6);
}

#[tokio::test]
async fn unusable_prices_keep_the_current_menu() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(generated(json!([
            { "name": "Gratis", "description": "Nada", "price": 0.0 }
        ]))))
        .mount(&server)
        .await;

    let state = state_for(&server.uri());
    assert!(suggest_menu(&state, None).await.is_err());

    let encoded = state.metrics.encode().unwrap();
    assert!(encoded.contains("menu_suggestions_total{outcome=\"unavailable\"} 1"));
}

#[tokio::test]
async fn unreachable_service_keeps_the_current_menu() {
    let state = state_for("http://127.0.0.1:1");
    let result = suggest_menu(&state, None).await;

    assert!(matches!(result, Err(AppError::SuggestionUnavailable(_))));
    assert_eq!(state.store.menu().await.unwrap().len(), 6);
}
