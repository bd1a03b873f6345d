//! Holds a positioning subscription only while a courier is carrying orders.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::engine::feed;
use crate::error::AppError;
use crate::positioning::{Positioning, WatchHandle};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingChange {
    Started,
    Stopped,
}

struct ActiveWatch {
    handle: WatchHandle,
    stop_forwarder: oneshot::Sender<()>,
}

pub struct TrackingGate {
    state: Arc<AppState>,
    courier_id: String,
    positioning: Arc<dyn Positioning>,
    active: Option<ActiveWatch>,
}

impl TrackingGate {
    pub fn new(state: Arc<AppState>, courier_id: impl Into<String>, positioning: Arc<dyn Positioning>) -> Self {
        Self {
            state,
            courier_id: courier_id.into(),
            positioning,
            active: None,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.active.is_some()
    }

    /// Starts the watch on a false→true edge of `tracking_required` and
    /// releases it on a true→false edge. Anything else is a no-op. A failed
    /// start leaves the gate idle so the next call tries again.
    pub fn reconcile(&mut self, tracking_required: bool) -> Result<Option<TrackingChange>, AppError> {
        match (tracking_required, self.active.is_some()) {
            (true, false) => {
                self.start()?;
                Ok(Some(TrackingChange::Started))
            }
            (false, true) => {
                self.release();
                Ok(Some(TrackingChange::Stopped))
            }
            _ => Ok(None),
        }
    }

    fn start(&mut self) -> Result<(), AppError> {
        let watch = self.positioning.watch_position()?;
        let mut updates = watch.updates;
        let state = self.state.clone();
        let courier_id = self.courier_id.clone();

        let (stop_forwarder, mut stopped) = oneshot::channel::<()>();

        // The stop signal is only observed between reports: a report that has
        // started always commits both of its writes.
        tokio::spawn(async move {
            loop {
                let position = tokio::select! {
                    biased;
                    _ = &mut stopped => break,
                    update = updates.recv() => match update {
                        Some(position) => position,
                        None => break,
                    },
                };

                if let Err(err) = feed::report_location(&state, &courier_id, position).await {
                    warn!(courier_id = %courier_id, error = %err, "dropping position report");
                }
            }
        });

        self.active = Some(ActiveWatch {
            handle: watch.handle,
            stop_forwarder,
        });
        self.state.metrics.tracking_sessions_active.inc();
        info!(courier_id = %self.courier_id, "location tracking started");
        Ok(())
    }

    /// Returns whether a subscription was actually released. A report already
    /// in flight is allowed to finish; nothing is forwarded after it.
    pub fn release(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };

        active.handle.stop();
        let _ = active.stop_forwarder.send(());
        self.state.metrics.tracking_sessions_active.dec();
        info!(courier_id = %self.courier_id, "location tracking stopped");
        true
    }
}

impl Drop for TrackingGate {
    fn drop(&mut self) {
        self.release();
    }
}
