use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

use crate::engine::feed;
use crate::engine::sync::{CourierBoard, CourierSync, refresh};
use crate::engine::tracking::{TrackingChange, TrackingGate};
use crate::positioning::Positioning;
use crate::state::AppState;

/// Courier-side loop: refreshes the courier's board and keeps the
/// positioning subscription in step with `tracking_required` on every tick,
/// so a late start or a restart mid-delivery picks tracking back up. The
/// subscription is released when the loop ends. A fresh session reports a
/// one-shot read right away instead of waiting for the first watch update.
pub async fn run_courier_agent(
    state: Arc<AppState>,
    courier_id: String,
    positioning: Arc<dyn Positioning>,
    period: Duration,
    board_tx: watch::Sender<Option<CourierBoard>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut sync = CourierSync::new(courier_id.clone());
    let mut gate = TrackingGate::new(state.clone(), courier_id.clone(), positioning.clone());
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(courier_id = %courier_id, period_ms = period.as_millis() as u64, "courier agent started");

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let board = refresh(&state, &mut sync).await;
                match gate.reconcile(board.tracking_required) {
                    Ok(Some(TrackingChange::Started)) => {
                        report_current_position(&state, &courier_id, positioning.as_ref()).await;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(courier_id = %courier_id, error = %err, "could not start location tracking");
                    }
                }
                if board_tx.send(Some(board)).is_err() {
                    break;
                }
            }
        }
    }

    gate.release();
    info!(courier_id = %courier_id, "courier agent stopped");
}

async fn report_current_position(state: &AppState, courier_id: &str, positioning: &dyn Positioning) {
    let position = match positioning.current_position().await {
        Ok(position) => position,
        Err(err) => {
            warn!(courier_id, error = %err, "one-shot position read failed");
            return;
        }
    };

    if let Err(err) = feed::report_location(state, courier_id, position).await {
        warn!(courier_id, error = %err, "one-shot position not recorded");
    }
}
