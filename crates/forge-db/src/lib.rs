pub mod migrations;
pub mod models;
pub mod queries;
pub mod search;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }

    /// Same connection and lock as `with_conn`; the separate name marks
    /// call sites that write.
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        self.with_conn(f)
    }
}

#[cfg(test)]
pub(crate) fn test_db() -> Database {
    let db = Database::open(Path::new(":memory:")).expect("in-memory db");
    // Tests build their own catalog; drop the seeded recipes.
    db.with_conn_mut(|conn| {
        conn.execute("DELETE FROM recipe_ingredients", [])?;
        conn.execute("DELETE FROM recipes", [])?;
        Ok(())
    })
    .expect("clear seed data");
    db
}
