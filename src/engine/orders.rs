//! Store-backed order operations.
//!
//! Each operation reads the whole orders collection, applies one rule from
//! [`crate::engine::lifecycle`] and writes the collection back. A rejected rule
//! returns before the write, so the stored collection is left as it was.
//! Writers are not isolated from each other: see [`crate::store`].

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::{feed, lifecycle};
use crate::error::AppError;
use crate::geo::gps_address;
use crate::models::courier::LatLng;
use crate::models::dish::Dish;
use crate::models::event::{DispatchEvent, OrderChange};
use crate::models::order::{
    CustomerInfo, Order, OrderItem, OrderStatus, PaymentMethod, sort_most_recent_first,
};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub customer: CustomerInfo,
    pub dish_id: String,
    pub payment_method: PaymentMethod,
    /// One-shot device reading; fills the address when the customer left it blank.
    #[serde(default)]
    pub location: Option<LatLng>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    pub dish_id: String,
    pub quantity: u32,
}

pub async fn list_orders(state: &AppState) -> Result<Vec<Order>, AppError> {
    let mut orders = state.store.orders().await?;
    sort_most_recent_first(&mut orders);
    Ok(orders)
}

pub async fn get_order(state: &AppState, id: Uuid) -> Result<Order, AppError> {
    state
        .store
        .orders()
        .await?
        .into_iter()
        .find(|order| order.id == id)
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))
}

pub async fn place_order(state: &AppState, mut request: NewOrder) -> Result<Order, AppError> {
    if request.customer.address.trim().is_empty()
        && let Some(position) = request.location
    {
        feed::validate_location(position)?;
        request.customer.address = gps_address(position);
    }
    for (field, value) in [
        ("name", &request.customer.name),
        ("address", &request.customer.address),
        ("phone", &request.customer.phone),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("customer {field} cannot be empty")));
        }
    }

    let menu = state.store.menu().await?;
    let dish = find_orderable(&menu, &request.dish_id)?;

    let order = lifecycle::place_order(request.customer, dish, request.payment_method, Utc::now());

    let mut orders = state.store.orders().await?;
    orders.push(order.clone());
    state.store.put_orders(&orders).await?;

    state.metrics.record_transition("place", true);
    info!(order_id = %order.id, dish_id = %dish.id, total = order.total, "order placed");
    state.publish(DispatchEvent::OrderChanged {
        change: OrderChange::Placed,
        order: order.clone(),
    });

    Ok(order)
}

pub async fn edit_items(
    state: &AppState,
    id: Uuid,
    requests: Vec<ItemRequest>,
) -> Result<Order, AppError> {
    let menu = state.store.menu().await?;

    mutate_order(state, id, "edit_items", OrderChange::ItemsEdited, |order| {
        lifecycle::ensure_editable(order)?;
        let items = resolve_items(order, &menu, &requests)?;
        lifecycle::edit_items(order, items)
    })
    .await
}

pub async fn cancel_order(state: &AppState, id: Uuid) -> Result<Order, AppError> {
    mutate_order(state, id, "cancel", OrderChange::Cancelled, lifecycle::cancel).await
}

pub async fn assign_courier(state: &AppState, id: Uuid, courier_id: &str) -> Result<Order, AppError> {
    let couriers = state.store.couriers().await?;
    if !couriers.iter().any(|courier| courier.id == courier_id) {
        return Err(AppError::NotFound(format!("courier {courier_id} not found")));
    }

    mutate_order(state, id, "assign", OrderChange::Assigned, |order| {
        lifecycle::assign_courier(order, courier_id)
    })
    .await
}

pub async fn advance_status(
    state: &AppState,
    id: Uuid,
    target: OrderStatus,
) -> Result<Order, AppError> {
    let transition = match target {
        OrderStatus::InTransit => "pickup",
        OrderStatus::Delivered => "deliver",
        OrderStatus::Cancelled => "cancel",
        _ => "advance",
    };

    mutate_order(state, id, transition, OrderChange::StatusChanged, |order| {
        lifecycle::advance_status(order, target)
    })
    .await
}

pub async fn pickup(state: &AppState, id: Uuid) -> Result<Order, AppError> {
    mutate_order(state, id, "pickup", OrderChange::StatusChanged, lifecycle::pickup).await
}

pub async fn deliver(state: &AppState, id: Uuid) -> Result<Order, AppError> {
    mutate_order(state, id, "deliver", OrderChange::StatusChanged, lifecycle::deliver).await
}

async fn mutate_order<F>(
    state: &AppState,
    id: Uuid,
    transition: &'static str,
    change: OrderChange,
    rule: F,
) -> Result<Order, AppError>
where
    F: FnOnce(&Order) -> Result<Order, AppError>,
{
    let mut orders = state.store.orders().await?;
    let index = orders
        .iter()
        .position(|order| order.id == id)
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

    let updated = match rule(&orders[index]) {
        Ok(updated) => updated,
        Err(err) => {
            state.metrics.record_transition(transition, false);
            warn!(order_id = %id, transition, error = %err, "order change rejected");
            return Err(err);
        }
    };

    if updated == orders[index] {
        state.metrics.record_transition(transition, true);
        return Ok(updated);
    }

    orders[index] = updated.clone();
    state.store.put_orders(&orders).await?;

    state.metrics.record_transition(transition, true);
    info!(
        order_id = %id,
        transition,
        status = %updated.status,
        courier_id = updated.delivery_assigned_to.as_deref().unwrap_or("-"),
        "order updated"
    );
    state.publish(DispatchEvent::OrderChanged {
        change,
        order: updated.clone(),
    });

    Ok(updated)
}

fn find_orderable<'a>(menu: &'a [Dish], dish_id: &str) -> Result<&'a Dish, AppError> {
    let dish = menu
        .iter()
        .find(|dish| dish.id == dish_id)
        .ok_or_else(|| AppError::NotFound(format!("dish {dish_id} not found")))?;

    if !dish.available {
        return Err(AppError::BadRequest(format!("dish {dish_id} is not available")));
    }
    Ok(dish)
}

/// Dishes already on the order keep the name and price captured when they
/// were added; new dishes are captured from the current menu. Repeated dish
/// ids are merged.
fn resolve_items(
    order: &Order,
    menu: &[Dish],
    requests: &[ItemRequest],
) -> Result<Vec<OrderItem>, AppError> {
    let mut items: Vec<OrderItem> = Vec::with_capacity(requests.len());

    for request in requests {
        if request.quantity == 0 {
            return Err(AppError::BadRequest(format!(
                "item {} must have quantity >= 1",
                request.dish_id
            )));
        }

        if let Some(existing) = items.iter_mut().find(|item| item.dish_id == request.dish_id) {
            existing.quantity = existing.quantity.saturating_add(request.quantity);
            continue;
        }

        let item = match order.items.iter().find(|item| item.dish_id == request.dish_id) {
            Some(snapshot) => OrderItem {
                quantity: request.quantity,
                ..snapshot.clone()
            },
            None => {
                let dish = find_orderable(menu, &request.dish_id)?;
                OrderItem {
                    dish_id: dish.id.clone(),
                    name: dish.name.clone(),
                    quantity: request.quantity,
                    price: dish.price,
                }
            }
        };
        items.push(item);
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{ItemRequest, resolve_items};
    use crate::engine::{feed, lifecycle};
    use crate::error::AppError;
    use crate::models::dish::default_menu;
    use crate::models::order::{CustomerInfo, PaymentMethod};

    fn request(dish_id: &str, quantity: u32) -> ItemRequest {
        ItemRequest {
            dish_id: dish_id.to_string(),
            quantity,
        }
    }

    fn order_with_old_price() -> crate::models::order::Order {
        let mut dish = default_menu().remove(0);
        dish.price = 300.0;
        lifecycle::place_order(
            CustomerInfo {
                name: "Ana".to_string(),
                address: "Calle 1".to_string(),
                phone: "809".to_string(),
                notes: None,
            },
            &dish,
            PaymentMethod::Prepaid,
            Utc::now(),
        )
    }

    #[test]
    fn existing_items_keep_their_snapshot_price() {
        let order = order_with_old_price();
        let items = resolve_items(&order, &default_menu(), &[request("1", 2), request("3", 1)]).unwrap();

        assert_eq!(items[0].price, 300.0);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[1].price, 120.0);
        assert_eq!(items[1].name, "Jugo de Chinola Natural");
    }

    #[test]
    fn repeated_dishes_are_merged() {
        let order = order_with_old_price();
        let items = resolve_items(&order, &default_menu(), &[request("3", 1), request("3", 2)]).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
    }

    #[test]
    fn unknown_and_unavailable_dishes_are_rejected() {
        let order = order_with_old_price();
        let mut menu = default_menu();
        menu[2].available = false;

        assert!(matches!(
            resolve_items(&order, &menu, &[request("99", 1)]),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            resolve_items(&order, &menu, &[request("3", 1)]),
            Err(AppError::BadRequest(_))
        ));
    }
}
