use super::error::StoreError;
use super::schema::SCHEMA;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Handle on the SQLite file shared by the registry and the workflow engine.
/// Every operation opens its own connection, so handles are cheap to clone
/// and safe to move across threads.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Database {
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateParent {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let database = Self {
            path: path.to_path_buf(),
            busy_timeout,
        };
        database.ensure_schema()?;
        Ok(database)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        let connection = self.connect()?;
        connection.execute_batch(SCHEMA).map_err(StoreError::sql)
    }

    pub fn connect(&self) -> Result<Connection, StoreError> {
        let connection = Connection::open(&self.path).map_err(|source| StoreError::Open {
            path: self.path.display().to_string(),
            source,
        })?;
        connection
            .busy_timeout(self.busy_timeout)
            .map_err(StoreError::sql)?;
        connection
            .execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(StoreError::sql)?;
        Ok(connection)
    }

    pub fn table_names(&self) -> Result<Vec<String>, StoreError> {
        let connection = self.connect()?;
        let mut statement = connection
            .prepare(
                "
                SELECT name FROM sqlite_master
                WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                ORDER BY name ASC
                ",
            )
            .map_err(StoreError::sql)?;
        let rows = statement
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(StoreError::sql)?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row.map_err(StoreError::sql)?);
        }
        Ok(names)
    }
}

/// Begins an IMMEDIATE transaction. The write lock is taken before the first
/// read, so a competing writer makes this wait on the busy timeout instead
/// of failing a later read-to-write upgrade.
pub fn begin_write(connection: &mut Connection) -> Result<Transaction<'_>, StoreError> {
    connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(StoreError::sql)
}

pub fn date_to_db(date: chrono::NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn date_from_db(raw: &str) -> Option<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
