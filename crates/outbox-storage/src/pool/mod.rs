//! Connection pool managing the write connection and read connections.

pub mod pragmas;
pub mod read_pool;
pub mod write_connection;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use outbox_core::errors::OutboxResult;

pub use read_pool::ReadPool;
pub use write_connection::WriteConnection;

/// The single write connection plus a round-robin read pool.
pub struct ConnectionPool {
    pub writer: Arc<WriteConnection>,
    pub readers: Arc<ReadPool>,
    pub db_path: Option<PathBuf>,
}

impl ConnectionPool {
    /// Open a connection pool for the given database file.
    pub fn open(path: &Path, read_pool_size: usize, busy_timeout_ms: u32) -> OutboxResult<Self> {
        let writer = Arc::new(WriteConnection::open(path, busy_timeout_ms)?);
        let readers = Arc::new(ReadPool::open(path, read_pool_size, busy_timeout_ms)?);
        Ok(Self {
            writer,
            readers,
            db_path: Some(path.to_path_buf()),
        })
    }

    /// In-memory pool. Readers are isolated databases, so callers route
    /// reads through the writer.
    pub fn open_in_memory() -> OutboxResult<Self> {
        let writer = Arc::new(WriteConnection::open_in_memory()?);
        let readers = Arc::new(ReadPool::open_in_memory(1)?);
        Ok(Self {
            writer,
            readers,
            db_path: None,
        })
    }
}
