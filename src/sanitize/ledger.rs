//! Seen-hash ledgers for duplicate detection.

use chrono::Utc;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger lock poisoned")]
    Poisoned,

    #[error("sqlite ledger: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to create ledger directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Lookup-and-insert store keyed by content hash.
///
/// Implementations are shared across threads; a single call must be atomic so
/// two identical items can never both be reported as new. Durable ledgers
/// only keep inserted hashes once [`HashLedger::commit`] succeeds.
pub trait HashLedger: Send + Sync {
    /// Record `hash`. Returns `true` if it had not been seen before.
    fn check_and_insert(&self, hash: &str) -> Result<bool, LedgerError>;

    /// Persist everything inserted since the last commit. Returns the number
    /// of hashes written.
    fn commit(&self) -> Result<usize, LedgerError> {
        Ok(0)
    }

    /// Seen hashes, pending ones included.
    fn len(&self) -> Result<usize, LedgerError>;

    fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }
}

/// Run-scoped ledger. Forgets everything when dropped.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    seen: Mutex<HashSet<String>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashLedger for MemoryLedger {
    fn check_and_insert(&self, hash: &str) -> Result<bool, LedgerError> {
        let mut seen = self.seen.lock().map_err(|_| LedgerError::Poisoned)?;
        Ok(seen.insert(hash.to_string()))
    }

    fn len(&self) -> Result<usize, LedgerError> {
        Ok(self.seen.lock().map_err(|_| LedgerError::Poisoned)?.len())
    }
}

/// Ledger persisted in a SQLite file, for dedup across runs.
///
/// New hashes stay pending in memory until `commit`, so a run that aborts
/// before its handoff is written leaves the file untouched.
pub struct SqliteLedger {
    state: Mutex<SqliteState>,
}

struct SqliteState {
    conn: Connection,
    pending: HashSet<String>,
}

impl SqliteLedger {
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, LedgerError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, LedgerError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS seen_hashes (
                hash TEXT PRIMARY KEY,
                first_seen TEXT NOT NULL
            );
            ",
        )?;
        Ok(Self { state: Mutex::new(SqliteState { conn, pending: HashSet::new() }) })
    }
}

impl HashLedger for SqliteLedger {
    fn check_and_insert(&self, hash: &str) -> Result<bool, LedgerError> {
        let mut state = self.state.lock().map_err(|_| LedgerError::Poisoned)?;
        if state.pending.contains(hash) {
            return Ok(false);
        }
        let stored: bool = state.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM seen_hashes WHERE hash = ?1)",
            params![hash],
            |row| row.get(0),
        )?;
        if stored {
            return Ok(false);
        }
        state.pending.insert(hash.to_string());
        Ok(true)
    }

    fn commit(&self) -> Result<usize, LedgerError> {
        let mut guard = self.state.lock().map_err(|_| LedgerError::Poisoned)?;
        let state = &mut *guard;
        if state.pending.is_empty() {
            return Ok(0);
        }
        let first_seen = Utc::now().to_rfc3339();
        let tx = state.conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO seen_hashes(hash, first_seen) VALUES(?1, ?2)")?;
            for hash in &state.pending {
                written += stmt.execute(params![hash, first_seen])?;
            }
        }
        tx.commit()?;
        state.pending.clear();
        Ok(written)
    }

    fn len(&self) -> Result<usize, LedgerError> {
        let state = self.state.lock().map_err(|_| LedgerError::Poisoned)?;
        let count: i64 =
            state.conn.query_row("SELECT COUNT(*) FROM seen_hashes", [], |row| row.get(0))?;
        Ok(count as usize + state.pending.len())
    }
}
