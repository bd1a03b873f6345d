use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

use crate::error::AppError;
use crate::models::courier::LatLng;
use crate::positioning::{PositionWatch, Positioning, WatchHandle};

/// Pretend GPS that drifts away from an origin in fixed steps.
pub struct SimulatedDevice {
    origin: LatLng,
    step: LatLng,
    cadence: Duration,
}

impl SimulatedDevice {
    pub fn new(origin: LatLng, cadence: Duration) -> Self {
        Self {
            origin,
            step: LatLng {
                lat: 0.0004,
                lng: 0.0003,
            },
            cadence,
        }
    }
}

#[async_trait]
impl Positioning for SimulatedDevice {
    async fn current_position(&self) -> Result<LatLng, AppError> {
        Ok(self.origin)
    }

    fn watch_position(&self) -> Result<PositionWatch, AppError> {
        let (tx, rx) = mpsc::channel(16);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let (origin, step, cadence) = (self.origin, self.step, self.cadence);

        tokio::spawn(async move {
            let mut ticker = interval(cadence);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut n = 0u32;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let position = LatLng {
                            lat: origin.lat + step.lat * f64::from(n),
                            lng: origin.lng + step.lng * f64::from(n),
                        };
                        if tx.send(position).await.is_err() {
                            break;
                        }
                        n = n.saturating_add(1);
                    }
                }
            }
            debug!("simulated position watch stopped");
        });

        Ok(PositionWatch {
            updates: rx,
            handle: WatchHandle::new(move || {
                let _ = stop_tx.send(());
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::SimulatedDevice;
    use crate::models::courier::LatLng;
    use crate::positioning::Positioning;

    #[tokio::test]
    async fn watch_emits_until_stopped() {
        let origin = LatLng { lat: 18.4861, lng: -69.9312 };
        let device = SimulatedDevice::new(origin, Duration::from_millis(5));

        let mut watch = device.watch_position().unwrap();
        let first = watch.updates.recv().await.unwrap();
        let second = watch.updates.recv().await.unwrap();
        assert_eq!(first, origin);
        assert!(second.lat > first.lat);

        watch.handle.stop();
        // drain whatever was buffered before the stop was observed
        while watch.updates.recv().await.is_some() {}
    }
}
