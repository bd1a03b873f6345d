//! One-shot board refreshes for clients that poll over HTTP. Each response
//! carries the role's refresh period in `x-poll-interval-ms`.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::HeaderName;
use axum::response::IntoResponse;
use axum::routing::get;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::sync::{AdminSync, CourierSync, CustomerSync, refresh};
use crate::state::AppState;

const POLL_INTERVAL: HeaderName = HeaderName::from_static("x-poll-interval-ms");

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/views/customer", get(customer_board))
        .route("/views/admin", get(admin_board))
        .route("/views/courier/:id", get(courier_board))
}

#[derive(Deserialize)]
pub struct CustomerQuery {
    pub selected: Option<Uuid>,
}

fn poll_hint(period: Duration) -> [(HeaderName, String); 1] {
    [(POLL_INTERVAL, period.as_millis().to_string())]
}

async fn customer_board(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CustomerQuery>,
) -> impl IntoResponse {
    let mut sync = CustomerSync::new(query.selected);
    let board = refresh(&state, &mut sync).await;
    (poll_hint(state.poll.customer), Json(board))
}

async fn admin_board(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let board = refresh(&state, &mut AdminSync).await;
    (poll_hint(state.poll.admin), Json(board))
}

async fn courier_board(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let mut sync = CourierSync::new(id);
    let board = refresh(&state, &mut sync).await;
    (poll_hint(state.poll.courier), Json(board))
}
