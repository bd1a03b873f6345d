use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::get;
use serde::{Deserialize, Serialize};

use crate::engine::feed;
use crate::error::AppError;
use crate::models::courier::{Courier, LatLng};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/couriers", get(list_couriers))
        .route(
            "/couriers/:id/location",
            get(get_courier_location).put(report_courier_location),
        )
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: LatLng,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationResponse {
    pub courier_id: String,
    pub location: Option<LatLng>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub courier_id: String,
    pub location: LatLng,
    pub orders_updated: usize,
}

async fn list_couriers(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Courier>>, AppError> {
    Ok(Json(state.store.couriers().await?))
}

async fn ensure_courier(state: &AppState, id: &str) -> Result<(), AppError> {
    let couriers = state.store.couriers().await?;
    if couriers.iter().any(|courier| courier.id == id) {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("courier {id} not found")))
    }
}

async fn get_courier_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LocationResponse>, AppError> {
    ensure_courier(&state, &id).await?;
    let location = feed::get_location(&state, &id).await?;

    Ok(Json(LocationResponse {
        courier_id: id,
        location,
    }))
}

async fn report_courier_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<ReportResponse>, AppError> {
    ensure_courier(&state, &id).await?;
    let orders_updated = feed::report_location(&state, &id, payload.location).await?;

    Ok(Json(ReportResponse {
        courier_id: id,
        location: payload.location,
        orders_updated,
    }))
}
