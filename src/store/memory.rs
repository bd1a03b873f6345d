use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::AppError;
use crate::store::StoreBackend;

/// Process-lifetime backend. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryBackend {
    blobs: DashMap<String, Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn get_blob(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        Ok(self.blobs.get(key).map(|entry| entry.value().clone()))
    }

    async fn put_blob(&self, key: &str, value: Vec<u8>) -> Result<(), AppError> {
        self.blobs.insert(key.to_string(), value);
        Ok(())
    }
}
