use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::engine::feed;
use crate::engine::orders::{self, ItemRequest, NewOrder};
use crate::error::AppError;
use crate::models::courier::LatLng;
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;
use crate::ticket::render_ticket;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/ticket", get(get_ticket))
        .route("/orders/:id/items", put(edit_items))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/orders/:id/assign", post(assign_courier))
        .route("/orders/:id/status", post(advance_status))
        .route("/orders/:id/pickup", post(pickup))
        .route("/orders/:id/deliver", post(deliver))
}

#[derive(Deserialize)]
pub struct EditItemsRequest {
    pub items: Vec<ItemRequest>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub courier_id: String,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

#[derive(Deserialize)]
pub struct PickupRequest {
    pub location: Option<LatLng>,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewOrder>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(orders::place_order(&state, payload).await?))
}

async fn list_orders(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(orders::list_orders(&state).await?))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(orders::get_order(&state, id).await?))
}

async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = orders::get_order(&state, id).await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        render_ticket(&order),
    ))
}

async fn edit_items(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditItemsRequest>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(orders::edit_items(&state, id, payload.items).await?))
}

async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(orders::cancel_order(&state, id).await?))
}

async fn assign_courier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRequest>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(orders::assign_courier(&state, id, &payload.courier_id).await?))
}

async fn advance_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusRequest>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(orders::advance_status(&state, id, payload.status).await?))
}

/// The courier device may attach a one-shot position read; it is reported
/// after the order is committed as IN_TRANSIT.
async fn pickup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    payload: Option<Json<PickupRequest>>,
) -> Result<Json<Order>, AppError> {
    let order = orders::pickup(&state, id).await?;

    let location = payload.and_then(|Json(request)| request.location);
    let (Some(location), Some(courier_id)) = (location, order.delivery_assigned_to.clone()) else {
        return Ok(Json(order));
    };

    match feed::report_location(&state, &courier_id, location).await {
        Ok(_) => Ok(Json(orders::get_order(&state, id).await?)),
        Err(err) => {
            warn!(order_id = %id, courier_id = %courier_id, error = %err, "pickup position not recorded");
            Ok(Json(order))
        }
    }
}

async fn deliver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(orders::deliver(&state, id).await?))
}
