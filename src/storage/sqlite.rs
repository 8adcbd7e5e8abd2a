//! SQLite-backed medium: one database file per origin.
//!
//! Every process that opens the same file is a separate context. Writes are
//! recorded in a `changes` log alongside the item table, and each context's
//! feed reads the log past its own cursor, skipping entries it wrote itself.
//!
//! ```text
//! items(key PRIMARY KEY, value)
//! changes(seq AUTOINCREMENT, key, old_value, new_value, origin)
//! ```

use std::path::Path;
use std::rc::Rc;

use rusqlite::{
    Connection, ErrorCode, OptionalExtension, Transaction, TransactionBehavior, params,
};
use uuid::Uuid;

use super::{ChangeFeed, Result, StorageError, StorageEvent, StorageMedium};

/// Number of change log entries kept. A feed that falls further behind than
/// this misses the older events.
const CHANGE_LOG_RETENTION: i64 = 256;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS items (
        key   TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS changes (
        seq       INTEGER PRIMARY KEY AUTOINCREMENT,
        key       TEXT NOT NULL,
        old_value TEXT,
        new_value TEXT,
        origin    TEXT NOT NULL
    );
";

/// A context attached to a shared SQLite origin file.
pub struct SqliteMedium {
    conn: Rc<Connection>,
    origin: String,
}

impl SqliteMedium {
    /// Opens (creating if needed) the origin database at `path` as a new context.
    ///
    /// The parent directory is created if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_secs(2))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Rc::new(conn),
            origin: Uuid::new_v4().to_string(),
        })
    }

    /// Applies a write and appends it to the change log in one transaction.
    ///
    /// The write lock is taken up front so a concurrent writer makes this
    /// wait on the busy timeout instead of failing mid-transaction.
    fn write(&self, key: &str, new_value: Option<&str>) -> Result<()> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let old_value: Option<String> = tx
            .query_row("SELECT value FROM items WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        if old_value.as_deref() == new_value {
            return Ok(());
        }

        match new_value {
            Some(value) => tx.execute(
                "INSERT INTO items (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?,
            None => tx.execute("DELETE FROM items WHERE key = ?1", [key])?,
        };
        tx.execute(
            "INSERT INTO changes (key, old_value, new_value, origin) VALUES (?1, ?2, ?3, ?4)",
            params![key, old_value, new_value, self.origin],
        )?;
        tx.execute(
            "DELETE FROM changes WHERE seq <= (SELECT MAX(seq) FROM changes) - ?1",
            [CHANGE_LOG_RETENTION],
        )?;
        tx.commit()?;
        Ok(())
    }
}

impl StorageMedium for SqliteMedium {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM items WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.write(key, Some(value)).map_err(|e| match e {
            StorageError::Sqlite(ref err) if err.sqlite_error_code() == Some(ErrorCode::DiskFull) => {
                StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed: value.len(),
                    available: 0,
                }
            }
            e => e,
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.write(key, None)
    }

    fn subscribe(&self) -> Result<Box<dyn ChangeFeed>> {
        let cursor: i64 =
            self.conn
                .query_row("SELECT COALESCE(MAX(seq), 0) FROM changes", [], |row| {
                    row.get(0)
                })?;
        Ok(Box::new(SqliteFeed {
            conn: Rc::clone(&self.conn),
            origin: self.origin.clone(),
            cursor,
        }))
    }
}

/// Polls the change log for entries written by other contexts.
struct SqliteFeed {
    conn: Rc<Connection>,
    origin: String,
    cursor: i64,
}

impl ChangeFeed for SqliteFeed {
    fn drain(&mut self) -> Result<Vec<StorageEvent>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT seq, key, old_value, new_value, origin FROM changes
             WHERE seq > ?1 ORDER BY seq",
        )?;
        let rows = stmt.query_map([self.cursor], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (seq, key, old_value, new_value, origin) = row?;
            self.cursor = seq;
            if origin != self.origin {
                events.push(StorageEvent {
                    key,
                    old_value,
                    new_value,
                });
            }
        }
        Ok(events)
    }
}
