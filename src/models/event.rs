use serde::{Deserialize, Serialize};

use crate::models::courier::LatLng;
use crate::models::order::Order;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderChange {
    Placed,
    ItemsEdited,
    Cancelled,
    Assigned,
    StatusChanged,
}

/// Published after a change is committed to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchEvent {
    OrderChanged { change: OrderChange, order: Order },
    CourierMoved { courier_id: String, location: LatLng, orders_updated: usize },
    MenuReplaced { dishes: usize },
}
