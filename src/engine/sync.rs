//! Polling synchronizer.
//!
//! A board re-reads the store on its own timer and rebuilds a role's view of
//! it through a pure [`Reconcile`] implementation. Boards never write to the
//! store. A failed read shows up as an empty collection for that tick; the next
//! tick is the retry.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::courier::Courier;
use crate::models::dish::Dish;
use crate::models::order::{Order, OrderStatus, sort_most_recent_first};
use crate::state::AppState;

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub orders: Vec<Order>,
    pub menu: Vec<Dish>,
    pub couriers: Vec<Courier>,
    pub degraded: bool,
}

pub async fn load_snapshot(state: &AppState) -> Snapshot {
    let mut degraded = false;

    let orders = or_empty(state.store.orders().await, "orders", &mut degraded);
    let menu = or_empty(state.store.menu().await, "menu", &mut degraded);
    let couriers = or_empty(state.store.couriers().await, "couriers", &mut degraded);

    Snapshot {
        orders,
        menu,
        couriers,
        degraded,
    }
}

fn or_empty<T>(result: Result<Vec<T>, AppError>, collection: &str, degraded: &mut bool) -> Vec<T> {
    result.unwrap_or_else(|err| {
        warn!(collection, error = %err, "store read failed; showing empty collection");
        *degraded = true;
        Vec::new()
    })
}

/// Keeps `previous` if it is still among `candidates`, otherwise falls back to
/// the first candidate, otherwise nothing.
pub fn select(previous: Option<Uuid>, candidates: &[Order]) -> Option<Uuid> {
    previous
        .filter(|id| candidates.iter().any(|order| order.id == *id))
        .or_else(|| candidates.first().map(|order| order.id))
}

pub trait Reconcile: Send + 'static {
    type Board: Clone + Serialize + Send + Sync + 'static;

    const NAME: &'static str;

    fn reconcile(&mut self, snapshot: &Snapshot) -> Self::Board;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBoard {
    pub active: Vec<Order>,
    pub history: Vec<Order>,
    pub selected: Option<Uuid>,
    pub menu: Vec<Dish>,
}

impl CustomerBoard {
    pub fn selected_order(&self) -> Option<&Order> {
        let id = self.selected?;
        self.active.iter().find(|order| order.id == id)
    }
}

#[derive(Debug, Default)]
pub struct CustomerSync {
    selected: Option<Uuid>,
}

impl CustomerSync {
    pub fn new(selected: Option<Uuid>) -> Self {
        Self { selected }
    }

    pub fn selected(&self) -> Option<Uuid> {
        self.selected
    }
}

impl Reconcile for CustomerSync {
    type Board = CustomerBoard;

    const NAME: &'static str = "customer";

    fn reconcile(&mut self, snapshot: &Snapshot) -> CustomerBoard {
        let (mut active, mut history): (Vec<Order>, Vec<Order>) = snapshot
            .orders
            .iter()
            .cloned()
            .partition(Order::is_active);
        sort_most_recent_first(&mut active);
        sort_most_recent_first(&mut history);

        self.selected = select(self.selected, &active);

        CustomerBoard {
            active,
            history,
            selected: self.selected,
            menu: snapshot.menu.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminBoard {
    pub orders: Vec<Order>,
    pub menu: Vec<Dish>,
    pub couriers: Vec<Courier>,
}

#[derive(Debug, Default)]
pub struct AdminSync;

impl Reconcile for AdminSync {
    type Board = AdminBoard;

    const NAME: &'static str = "admin";

    fn reconcile(&mut self, snapshot: &Snapshot) -> AdminBoard {
        let mut orders = snapshot.orders.clone();
        sort_most_recent_first(&mut orders);

        AdminBoard {
            orders,
            menu: snapshot.menu.clone(),
            couriers: snapshot.couriers.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourierBoard {
    pub courier_id: String,
    pub in_transit: Vec<Order>,
    pub ready_to_pick_up: Vec<Order>,
    pub completed: Vec<Order>,
    pub tracking_required: bool,
}

#[derive(Debug)]
pub struct CourierSync {
    courier_id: String,
}

impl CourierSync {
    pub fn new(courier_id: impl Into<String>) -> Self {
        Self {
            courier_id: courier_id.into(),
        }
    }

    pub fn courier_id(&self) -> &str {
        &self.courier_id
    }
}

impl Reconcile for CourierSync {
    type Board = CourierBoard;

    const NAME: &'static str = "courier";

    fn reconcile(&mut self, snapshot: &Snapshot) -> CourierBoard {
        let mine = snapshot
            .orders
            .iter()
            .filter(|order| order.is_assigned_to(&self.courier_id));

        let mut in_transit = Vec::new();
        let mut ready_to_pick_up = Vec::new();
        let mut completed = Vec::new();
        for order in mine {
            match order.status {
                OrderStatus::InTransit => in_transit.push(order.clone()),
                OrderStatus::Pending | OrderStatus::Preparing => {
                    ready_to_pick_up.push(order.clone())
                }
                OrderStatus::Delivered => completed.push(order.clone()),
                OrderStatus::Cancelled => {}
            }
        }
        sort_most_recent_first(&mut in_transit);
        sort_most_recent_first(&mut ready_to_pick_up);
        sort_most_recent_first(&mut completed);

        CourierBoard {
            courier_id: self.courier_id.clone(),
            tracking_required: !in_transit.is_empty(),
            in_transit,
            ready_to_pick_up,
            completed,
        }
    }
}

pub async fn refresh<R: Reconcile>(state: &AppState, sync: &mut R) -> R::Board {
    let snapshot = load_snapshot(state).await;
    let outcome = if snapshot.degraded { "degraded" } else { "ok" };
    state
        .metrics
        .board_ticks_total
        .with_label_values(&[R::NAME, outcome])
        .inc();

    sync.reconcile(&snapshot)
}

/// Drives `sync` every `period` and publishes each board on `board_tx` until
/// `shutdown` flips to true, its sender goes away, or every board receiver is
/// dropped. Ticks run one after another and never overlap.
pub async fn run_board<R: Reconcile>(
    state: Arc<AppState>,
    mut sync: R,
    period: Duration,
    board_tx: watch::Sender<Option<R::Board>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(board = R::NAME, period_ms = period.as_millis() as u64, "board refresh started");

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let board = refresh(&state, &mut sync).await;
                if board_tx.send(Some(board)).is_err() {
                    break;
                }
            }
        }
    }

    info!(board = R::NAME, "board refresh stopped");
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::engine::lifecycle;
    use crate::models::dish::default_menu;
    use crate::models::order::{CustomerInfo, PaymentMethod};

    fn order_at(minutes_ago: i64) -> Order {
        lifecycle::place_order(
            CustomerInfo {
                name: "Ana".to_string(),
                address: "Calle 1".to_string(),
                phone: "809".to_string(),
                notes: None,
            },
            &default_menu()[0],
            PaymentMethod::CashOnDelivery,
            Utc::now() - Duration::minutes(minutes_ago),
        )
    }

    fn snapshot(orders: Vec<Order>) -> Snapshot {
        Snapshot {
            orders,
            ..Snapshot::default()
        }
    }

    #[test]
    fn customer_selection_survives_refresh() {
        let older = order_at(10);
        let newer = order_at(1);
        let mut sync = CustomerSync::new(Some(older.id));

        let board = sync.reconcile(&snapshot(vec![older.clone(), newer.clone()]));

        assert_eq!(board.selected, Some(older.id));
        assert_eq!(sync.selected(), Some(older.id));
        assert_eq!(board.active[0].id, newer.id);
    }

    #[test]
    fn customer_selection_falls_back_to_first_active_then_none() {
        let delivered = lifecycle::deliver(&lifecycle::pickup(&order_at(5)).unwrap()).unwrap();
        let newer = order_at(1);
        let older = order_at(3);
        let mut sync = CustomerSync::new(Some(delivered.id));

        let board = sync.reconcile(&snapshot(vec![delivered.clone(), older, newer.clone()]));
        assert_eq!(board.selected, Some(newer.id));
        assert_eq!(board.history.len(), 1);

        let board = sync.reconcile(&snapshot(vec![delivered]));
        assert_eq!(board.selected, None);
        assert!(board.selected_order().is_none());
    }

    #[test]
    fn reconcile_is_idempotent_on_unchanged_data() {
        let data = snapshot(vec![order_at(4), order_at(2), order_at(9)]);
        let mut sync = CustomerSync::default();

        let first = sync.reconcile(&data);
        let second = sync.reconcile(&data);

        assert_eq!(first.selected, second.selected);
        let ids = |b: &CustomerBoard| b.active.iter().map(|o| o.id).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn courier_board_splits_own_orders() {
        let carrying = lifecycle::pickup(&lifecycle::assign_courier(&order_at(3), "d1").unwrap()).unwrap();
        let waiting = lifecycle::assign_courier(&order_at(2), "d1").unwrap();
        let done = lifecycle::deliver(
            &lifecycle::pickup(&lifecycle::assign_courier(&order_at(9), "d1").unwrap()).unwrap(),
        )
        .unwrap();
        let someone_else = lifecycle::pickup(&lifecycle::assign_courier(&order_at(1), "d2").unwrap()).unwrap();
        let unassigned = order_at(1);

        let mut sync = CourierSync::new("d1");
        assert_eq!(sync.courier_id(), "d1");

        let board = sync.reconcile(&snapshot(vec![
            carrying.clone(),
            waiting.clone(),
            done.clone(),
            someone_else,
            unassigned,
        ]));

        assert!(board.tracking_required);
        assert_eq!(board.in_transit.len(), 1);
        assert_eq!(board.in_transit[0].id, carrying.id);
        assert_eq!(board.ready_to_pick_up[0].id, waiting.id);
        assert_eq!(board.completed[0].id, done.id);
    }

    #[test]
    fn courier_without_in_transit_orders_needs_no_tracking() {
        let waiting = lifecycle::assign_courier(&order_at(2), "d1").unwrap();
        let board = CourierSync::new("d1").reconcile(&snapshot(vec![waiting]));

        assert!(!board.tracking_required);
    }

    #[test]
    fn admin_board_lists_everything_most_recent_first() {
        let a = order_at(5);
        let b = order_at(1);
        let c = lifecycle::cancel(&order_at(3)).unwrap();

        let board = AdminSync.reconcile(&snapshot(vec![a.clone(), b.clone(), c.clone()]));
        let ids: Vec<Uuid> = board.orders.iter().map(|o| o.id).collect();

        assert_eq!(ids, vec![b.id, c.id, a.id]);
    }
}
