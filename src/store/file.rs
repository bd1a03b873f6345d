use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::store::StoreBackend;

/// One `<key>.json` file per collection under a root directory.
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, AppError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await.map_err(|err| {
            AppError::StoreUnavailable(format!("cannot create {}: {err}", root.display()))
        })?;

        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

#[async_trait]
impl StoreBackend for FileBackend {
    async fn get_blob(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        match fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AppError::StoreUnavailable(format!("read {key}: {err}"))),
        }
    }

    async fn put_blob(&self, key: &str, value: Vec<u8>) -> Result<(), AppError> {
        let path = self.path_for(key);
        // one temp file per write so overlapping writers never share an inode
        let tmp = self.root.join(format!(".{key}.json.{}.tmp", Uuid::new_v4().simple()));

        if let Err(err) = fs::write(&tmp, &value).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(AppError::StoreUnavailable(format!("write {key}: {err}")));
        }
        // rename is atomic on the same filesystem: readers see the old or the new blob
        if let Err(err) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(AppError::StoreUnavailable(format!("commit {key}: {err}")));
        }

        debug!(key, bytes = value.len(), "collection written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::FileBackend;
    use crate::store::{Store, StoreBackend};

    #[tokio::test]
    async fn missing_file_reads_as_never_written() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).await.unwrap();

        assert_eq!(backend.get_blob("orders").await.unwrap(), None);
    }

    #[tokio::test]
    async fn written_menu_survives_reopening_the_directory() {
        let dir = tempfile::tempdir().unwrap();

        let store = Store::new(Box::new(FileBackend::open(dir.path()).await.unwrap()));
        let mut menu = store.menu().await.unwrap();
        menu.truncate(2);
        store.put_menu(&menu).await.unwrap();

        let reopened = Store::new(Box::new(FileBackend::open(dir.path()).await.unwrap()));
        let stored = reopened.menu().await.unwrap();
        assert_eq!(stored, menu);
        assert!(dir.path().join("menu.json").exists());
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overlapping_writers_leave_one_whole_blob() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FileBackend::open(dir.path()).await.unwrap());

        for round in 0..50 {
            let writers: Vec<_> = (0..8usize)
                .map(|writer| {
                    let backend = backend.clone();
                    // different sizes so a torn or mixed write cannot parse
                    let payload = serde_json::to_vec(&vec![writer; 64 * (writer + 1)]).unwrap();
                    tokio::spawn(async move {
                        backend.put_blob("orders", payload.clone()).await.map(|_| payload)
                    })
                })
                .collect();

            let mut written = Vec::new();
            for writer in writers {
                written.push(writer.await.unwrap().expect("every writer commits"));
            }

            let stored = backend.get_blob("orders").await.unwrap().unwrap();
            let parsed: Vec<usize> = serde_json::from_slice(&stored)
                .unwrap_or_else(|err| panic!("round {round}: corrupt blob: {err}"));
            assert!(written.contains(&stored), "round {round}: {} entries", parsed.len());
        }
    }
}
