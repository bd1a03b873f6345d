use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::courier::LatLng;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Preparing,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::InTransit => "IN_TRANSIT",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Prepaid,
    CashOnDelivery,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub dish_id: String,
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

impl OrderItem {
    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub name: String,
    pub address: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub customer_name: String,
    pub address: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_assigned_to: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_location: Option<LatLng>,
}

impl Order {
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn is_assigned_to(&self, courier_id: &str) -> bool {
        self.delivery_assigned_to.as_deref() == Some(courier_id)
    }
}

pub fn items_total(items: &[OrderItem]) -> f64 {
    items.iter().map(OrderItem::subtotal).sum()
}

/// Most recent first; equal timestamps keep insertion order.
pub fn sort_most_recent_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    use super::{Order, OrderItem, OrderStatus, PaymentMethod, sort_most_recent_first};

    fn order(seed: u128, created_ms: i64) -> Order {
        Order {
            id: Uuid::from_u128(seed),
            customer_name: "Ana".to_string(),
            address: "Calle 1".to_string(),
            phone: "809".to_string(),
            notes: None,
            items: vec![OrderItem {
                dish_id: "1".to_string(),
                name: "La Bandera Dominicana".to_string(),
                quantity: 1,
                price: 350.0,
            }],
            total: 350.0,
            status: OrderStatus::Pending,
            payment_method: PaymentMethod::CashOnDelivery,
            delivery_assigned_to: None,
            created_at: Utc.timestamp_millis_opt(created_ms).unwrap(),
            delivery_location: None,
        }
    }

    #[test]
    fn serializes_with_camel_case_and_screaming_enums() {
        let value = serde_json::to_value(order(1, 1_700_000_000_000)).unwrap();

        assert_eq!(value["customerName"], "Ana");
        assert_eq!(value["status"], "PENDING");
        assert_eq!(value["paymentMethod"], "CASH_ON_DELIVERY");
        assert_eq!(value["createdAt"], json!(1_700_000_000_000_i64));
        assert_eq!(value["items"][0]["dishId"], "1");
        assert!(value.get("deliveryAssignedTo").is_none());
    }

    #[test]
    fn sort_is_stable_for_equal_timestamps() {
        let mut orders = vec![order(1, 10), order(2, 30), order(3, 10), order(4, 20)];
        sort_most_recent_first(&mut orders);

        let ids: Vec<u128> = orders.iter().map(|o| o.id.as_u128()).collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
    }
}
