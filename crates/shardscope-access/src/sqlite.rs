//! SQLite-backed shard client.
//!
//! The database is opened on first use, so a shard whose file is missing or
//! corrupt only fails the calls made against it.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use shardscope_config::ShardConfig;
use shardscope_store::{
    DelegationEdge, InterruptHandle, RelationshipType, ShardDatabase, StoreError, Subject,
    SubjectFilter, SubjectId,
};
use tracing::debug;

use crate::traits::ShardClient;

/// Shard client over one SQLite shard database.
///
/// rusqlite connections are not `Sync`, so the connection sits behind a mutex
/// and every query runs on the blocking thread pool. Dropping a call before it
/// completes, as the executor's timeout does, interrupts its running query so
/// the connection is released for the next caller.
#[derive(Clone)]
pub struct SqliteShardClient {
    key: String,
    path: PathBuf,
    read_only: bool,
    db: Arc<Mutex<Option<ShardDatabase>>>,
    interrupt: Arc<OnceCell<InterruptHandle>>,
}

impl SqliteShardClient {
    /// Client for a configured shard. Does not touch the filesystem.
    pub fn new(config: &ShardConfig) -> Self {
        Self {
            key: config.key.clone(),
            path: config.path.clone(),
            read_only: config.read_only,
            db: Arc::new(Mutex::new(None)),
            interrupt: Arc::new(OnceCell::new()),
        }
    }

    /// Wrap an already open database.
    pub fn from_database(db: ShardDatabase) -> Self {
        Self {
            key: db.shard_key().to_string(),
            path: PathBuf::new(),
            read_only: false,
            interrupt: Arc::new(OnceCell::with_value(db.interrupt_handle())),
            db: Arc::new(Mutex::new(Some(db))),
        }
    }

    /// Path of the database file
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Run `op` against the connection on the blocking pool.
    async fn with_db<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&ShardDatabase) -> Result<T, StoreError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let interrupt = Arc::clone(&self.interrupt);
        let key = self.key.clone();
        let path = self.path.clone();
        let read_only = self.read_only;

        let mut pending = InterruptOnDrop {
            handle: Arc::clone(&self.interrupt),
            running: Arc::new(AtomicBool::new(false)),
            settled: false,
        };
        let running = Arc::clone(&pending.running);

        let task = tokio::task::spawn_blocking(move || {
            let mut guard = db.lock();
            if guard.is_none() {
                debug!("Opening shard '{}' at {:?}", key, path);
                let opened = ShardDatabase::open(&path, &key, read_only)?;
                let _ = interrupt.set(opened.interrupt_handle());
                *guard = Some(opened);
            }
            match guard.as_ref() {
                Some(conn) => {
                    running.store(true, Ordering::SeqCst);
                    let result = op(conn);
                    running.store(false, Ordering::SeqCst);
                    result
                }
                None => Err(StoreError::unavailable(format!("shard '{}' not open", key))),
            }
        });

        let joined = task.await;
        pending.settled = true;
        joined.map_err(|e| StoreError::unavailable(format!("shard task failed: {}", e)))?
    }
}

/// Interrupts this call's query if the caller stops waiting for it.
///
/// Only fires while the call's own operation holds the connection, so a call
/// still queued on the mutex never interrupts another caller's query.
struct InterruptOnDrop {
    handle: Arc<OnceCell<InterruptHandle>>,
    running: Arc<AtomicBool>,
    settled: bool,
}

impl Drop for InterruptOnDrop {
    fn drop(&mut self) {
        if self.settled || !self.running.load(Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.handle.get() {
            debug!("Interrupting abandoned shard query");
            handle.interrupt();
        }
    }
}

#[async_trait]
impl ShardClient for SqliteShardClient {
    async fn count_subjects(
        &self,
        filter: &SubjectFilter,
        ids: Option<&[SubjectId]>,
    ) -> Result<u64, StoreError> {
        let filter = filter.clone();
        let ids = ids.map(<[SubjectId]>::to_vec);
        self.with_db(move |db| db.count_subjects(&filter, ids.as_deref()))
            .await
    }

    async fn fetch_subjects(
        &self,
        filter: &SubjectFilter,
        ids: Option<&[SubjectId]>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Subject>, StoreError> {
        let filter = filter.clone();
        let ids = ids.map(<[SubjectId]>::to_vec);
        self.with_db(move |db| db.fetch_subjects(&filter, ids.as_deref(), offset, limit))
            .await
    }

    async fn delegation_edges(
        &self,
        superior_ids: &[SubjectId],
        relationship: Option<RelationshipType>,
    ) -> Result<Vec<DelegationEdge>, StoreError> {
        let superior_ids = superior_ids.to_vec();
        self.with_db(move |db| db.delegation_edges(&superior_ids, relationship))
            .await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.with_db(|db| db.get_metadata("schema_version").map(|_| ()))
            .await
    }
}
