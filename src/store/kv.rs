use std::{collections::HashMap, future::Future, io::ErrorKind, path::PathBuf, sync::Mutex};

use anyhow::{bail, Result};
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::debug;

/// Interface for abstracting the opaque string key-value store behind the
/// persisted slots. Callers treat values as raw strings; JSON shape is the
/// business of [crate::store::state].
pub trait KvStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;

    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}

/// The main realization of [KvStore]. One file per slot under `slot_dir`,
/// guarded with advisory locks so a second daycloud invocation can't interleave
/// a partial write.
pub struct FileKvStore {
    slot_dir: PathBuf,
}

impl FileKvStore {
    pub fn new(slot_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&slot_dir)?;

        Ok(Self { slot_dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.slot_dir.join(format!("{key}.json"))
    }
}

impl KvStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        debug!("Reading slot {path:?}");
        let mut file = match File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        file.lock_shared()?;
        let mut value = String::new();
        let read = file.read_to_string(&mut value).await;
        file.unlock_async().await?;
        read?;
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .await?;
        file.lock_exclusive()?;
        let write = async {
            file.write_all(value.as_bytes()).await?;
            file.flush().await
        }
        .await;
        file.unlock_async().await?;
        write?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory [KvStore]. Used by tests and by anything that wants a throwaway
/// state. `fail_writes` simulates a full or unavailable backing store.
#[derive(Default)]
pub struct MemoryKvStore {
    slots: Mutex<HashMap<String, String>>,
    fail_writes: bool,
}

impl MemoryKvStore {
    /// A store that rejects every write, for exercising the best-effort
    /// persistence path.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }
}

impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            bail!("write refused");
        }
        self.slots
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.slots.lock().unwrap().remove(key);
        Ok(())
    }
}
