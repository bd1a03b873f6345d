//! Courier location feed.
//!
//! Only the latest position per courier is kept. Each report is copied into
//! every order the courier is carrying (assigned and IN_TRANSIT).

use tracing::debug;

use crate::error::AppError;
use crate::models::courier::LatLng;
use crate::models::event::DispatchEvent;
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

pub fn validate_location(location: LatLng) -> Result<(), AppError> {
    let valid = location.lat.is_finite()
        && location.lng.is_finite()
        && (-90.0..=90.0).contains(&location.lat)
        && (-180.0..=180.0).contains(&location.lng);

    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "invalid coordinates ({}, {})",
            location.lat, location.lng
        )))
    }
}

/// Copies `location` into the orders `courier_id` is carrying and returns how
/// many were touched.
pub fn fan_out(orders: &mut [Order], courier_id: &str, location: LatLng) -> usize {
    let mut touched = 0;
    for order in orders
        .iter_mut()
        .filter(|order| order.status == OrderStatus::InTransit && order.is_assigned_to(courier_id))
    {
        order.delivery_location = Some(location);
        touched += 1;
    }
    touched
}

/// Both collections are read before anything is written. The location blob is
/// committed first, then the orders blob; a failure on the second write leaves
/// the courier's position updated but the orders showing the previous one.
/// Dropping the future between the writes has the same effect, so background
/// callers only stop between reports.
pub async fn report_location(
    state: &AppState,
    courier_id: &str,
    location: LatLng,
) -> Result<usize, AppError> {
    validate_location(location)?;

    let mut locations = state.store.courier_locations().await?;
    let mut orders = state.store.orders().await?;

    locations.insert(courier_id.to_string(), location);
    let touched = fan_out(&mut orders, courier_id, location);

    state.store.put_courier_locations(&locations).await?;
    if touched > 0 {
        state.store.put_orders(&orders).await?;
    }

    state.metrics.location_reports_total.inc();
    state
        .metrics
        .location_fanout_orders_total
        .inc_by(touched as u64);
    debug!(courier_id, lat = location.lat, lng = location.lng, orders = touched, "location reported");
    state.publish(DispatchEvent::CourierMoved {
        courier_id: courier_id.to_string(),
        location,
        orders_updated: touched,
    });

    Ok(touched)
}

pub async fn get_location(state: &AppState, courier_id: &str) -> Result<Option<LatLng>, AppError> {
    Ok(state.store.courier_locations().await?.remove(courier_id))
}
