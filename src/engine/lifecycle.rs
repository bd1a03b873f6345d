//! Order status rules.
//!
//! Every function takes an order by reference and returns the next version of
//! it. On error the input is untouched, so a caller that only persists `Ok`
//! results never writes a partially applied change.
//!
//! ```text
//! PENDING    --assign-->  PREPARING
//! PENDING    --cancel-->  CANCELLED
//! PENDING    --pickup-->  IN_TRANSIT
//! PREPARING  --pickup-->  IN_TRANSIT
//! IN_TRANSIT --deliver--> DELIVERED
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::dish::Dish;
use crate::models::order::{
    CustomerInfo, Order, OrderItem, OrderStatus, PaymentMethod, items_total,
};

pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;

    matches!(
        (from, to),
        (Pending, Preparing)
            | (Pending, Cancelled)
            | (Pending, InTransit)
            | (Preparing, InTransit)
            | (InTransit, Delivered)
    )
}

pub fn place_order(
    customer: CustomerInfo,
    dish: &Dish,
    payment_method: PaymentMethod,
    now: DateTime<Utc>,
) -> Order {
    let items = vec![OrderItem {
        dish_id: dish.id.clone(),
        name: dish.name.clone(),
        quantity: 1,
        price: dish.price,
    }];

    Order {
        id: Uuid::new_v4(),
        customer_name: customer.name,
        address: customer.address,
        phone: customer.phone,
        notes: customer.notes.filter(|notes| !notes.trim().is_empty()),
        total: items_total(&items),
        items,
        status: OrderStatus::Pending,
        payment_method,
        delivery_assigned_to: None,
        created_at: now,
        delivery_location: None,
    }
}

pub fn ensure_editable(order: &Order) -> Result<(), AppError> {
    if order.status != OrderStatus::Pending {
        return Err(AppError::OrderNotEditable(order.status));
    }
    Ok(())
}

pub fn edit_items(order: &Order, items: Vec<OrderItem>) -> Result<Order, AppError> {
    ensure_editable(order)?;
    if items.is_empty() {
        return Err(AppError::EmptyOrder);
    }
    if let Some(item) = items.iter().find(|item| item.quantity == 0) {
        return Err(AppError::BadRequest(format!(
            "item {} must have quantity >= 1",
            item.dish_id
        )));
    }

    let mut updated = order.clone();
    updated.total = items_total(&items);
    updated.items = items;
    Ok(updated)
}

/// Re-cancelling a cancelled order is accepted and leaves it as it was.
pub fn cancel(order: &Order) -> Result<Order, AppError> {
    match order.status {
        OrderStatus::Cancelled => Ok(order.clone()),
        from if is_valid_transition(from, OrderStatus::Cancelled) => {
            let mut updated = order.clone();
            updated.status = OrderStatus::Cancelled;
            Ok(updated)
        }
        from => Err(AppError::InvalidTransition {
            from,
            to: OrderStatus::Cancelled,
        }),
    }
}

/// Assignment and the advance to PREPARING are one update. Assigning an order
/// that is already PREPARING swaps the courier and keeps the status.
pub fn assign_courier(order: &Order, courier_id: &str) -> Result<Order, AppError> {
    match order.status {
        OrderStatus::Pending | OrderStatus::Preparing => {
            let mut updated = order.clone();
            updated.delivery_assigned_to = Some(courier_id.to_string());
            updated.status = OrderStatus::Preparing;
            Ok(updated)
        }
        from => Err(AppError::InvalidTransition {
            from,
            to: OrderStatus::Preparing,
        }),
    }
}

/// Generic driver behind pickup and deliver. PREPARING is only reachable
/// through [`assign_courier`] since it needs a courier.
pub fn advance_status(order: &Order, target: OrderStatus) -> Result<Order, AppError> {
    if target == OrderStatus::Preparing || !is_valid_transition(order.status, target) {
        return Err(AppError::InvalidTransition {
            from: order.status,
            to: target,
        });
    }

    let mut updated = order.clone();
    updated.status = target;
    Ok(updated)
}

pub fn pickup(order: &Order) -> Result<Order, AppError> {
    advance_status(order, OrderStatus::InTransit)
}

pub fn deliver(order: &Order) -> Result<Order, AppError> {
    advance_status(order, OrderStatus::Delivered)
}
