//! Device positioning capability.
//!
//! A watch is split into the update stream and a [`WatchHandle`]. Whoever
//! owns the handle owns the sensor: stopping or dropping the handle releases
//! it exactly once.

pub mod simulated;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::models::courier::LatLng;

pub use simulated::SimulatedDevice;

#[async_trait]
pub trait Positioning: Send + Sync {
    async fn current_position(&self) -> Result<LatLng, AppError>;

    fn watch_position(&self) -> Result<PositionWatch, AppError>;
}

pub struct PositionWatch {
    pub updates: mpsc::Receiver<LatLng>,
    pub handle: WatchHandle,
}

pub struct WatchHandle {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl WatchHandle {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn stop(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.release_now();
    }
}
