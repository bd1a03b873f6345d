use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use serde::Deserialize;

use crate::engine::menu;
use crate::error::AppError;
use crate::models::dish::Dish;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/menu", get(get_menu).put(replace_menu))
        .route("/menu/suggestions", post(suggest_menu))
}

#[derive(Deserialize, Default)]
pub struct SuggestRequest {
    pub theme: Option<String>,
}

async fn get_menu(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Dish>>, AppError> {
    Ok(Json(state.store.menu().await?))
}

async fn replace_menu(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Vec<Dish>>,
) -> Result<Json<Vec<Dish>>, AppError> {
    Ok(Json(menu::replace_menu(&state, payload).await?))
}

async fn suggest_menu(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<SuggestRequest>>,
) -> Result<Json<Vec<Dish>>, AppError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    Ok(Json(menu::suggest_menu(&state, request.theme.as_deref()).await?))
}
