//! Whole-collection persistence.
//!
//! Every collection is one JSON blob under a fixed key. Mutations are
//! read-modify-write of the entire blob and carry no isolation: two writers
//! that read the same version both succeed and the later write wins, silently
//! discarding the earlier change. Callers that need stronger guarantees must
//! serialize their writes (single writer task) on top of this contract.

pub mod file;
pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::{Config, StoreBackendKind};
use crate::error::AppError;
use crate::models::courier::{Courier, LatLng, default_roster};
use crate::models::dish::{Dish, default_menu};
use crate::models::order::Order;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Orders,
    Menu,
    Couriers,
    CourierLocations,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Orders => "orders",
            Collection::Menu => "menu",
            Collection::Couriers => "couriers",
            Collection::CourierLocations => "courier_locations",
        }
    }
}

pub type CourierLocations = BTreeMap<String, LatLng>;

/// Raw blob storage. `Ok(None)` means the key was never written.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    async fn get_blob(&self, key: &str) -> Result<Option<Vec<u8>>, AppError>;

    async fn put_blob(&self, key: &str, value: Vec<u8>) -> Result<(), AppError>;
}

pub struct Store {
    backend: Box<dyn StoreBackend>,
}

impl Store {
    pub fn new(backend: Box<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(memory::MemoryBackend::new()))
    }

    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        match config.store_backend {
            StoreBackendKind::Memory => Ok(Self::in_memory()),
            StoreBackendKind::File => {
                let backend = file::FileBackend::open(&config.store_path).await?;
                Ok(Self::new(Box::new(backend)))
            }
        }
    }

    pub async fn orders(&self) -> Result<Vec<Order>, AppError> {
        Ok(self.read(Collection::Orders).await?.unwrap_or_default())
    }

    pub async fn put_orders(&self, orders: &[Order]) -> Result<(), AppError> {
        self.write(Collection::Orders, orders).await
    }

    pub async fn menu(&self) -> Result<Vec<Dish>, AppError> {
        Ok(self
            .read(Collection::Menu)
            .await?
            .unwrap_or_else(default_menu))
    }

    pub async fn put_menu(&self, menu: &[Dish]) -> Result<(), AppError> {
        self.write(Collection::Menu, menu).await
    }

    pub async fn couriers(&self) -> Result<Vec<Courier>, AppError> {
        Ok(self
            .read(Collection::Couriers)
            .await?
            .unwrap_or_else(default_roster))
    }

    pub async fn put_couriers(&self, couriers: &[Courier]) -> Result<(), AppError> {
        self.write(Collection::Couriers, couriers).await
    }

    pub async fn courier_locations(&self) -> Result<CourierLocations, AppError> {
        Ok(self
            .read(Collection::CourierLocations)
            .await?
            .unwrap_or_default())
    }

    pub async fn put_courier_locations(
        &self,
        locations: &CourierLocations,
    ) -> Result<(), AppError> {
        self.write(Collection::CourierLocations, locations).await
    }

    async fn read<T: DeserializeOwned>(&self, collection: Collection) -> Result<Option<T>, AppError> {
        let Some(bytes) = self.backend.get_blob(collection.as_str()).await? else {
            return Ok(None);
        };

        serde_json::from_slice(&bytes).map(Some).map_err(|err| {
            AppError::StoreUnavailable(format!("corrupt {} collection: {err}", collection.as_str()))
        })
    }

    async fn write<T: Serialize + ?Sized>(
        &self,
        collection: Collection,
        value: &T,
    ) -> Result<(), AppError> {
        let bytes = serde_json::to_vec(value).map_err(|err| {
            AppError::Internal(format!("failed to encode {}: {err}", collection.as_str()))
        })?;
        self.backend.put_blob(collection.as_str(), bytes).await
    }
}
