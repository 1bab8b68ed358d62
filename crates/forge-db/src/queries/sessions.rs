use anyhow::Result;
use rusqlite::OptionalExtension;

use crate::Database;
use crate::models::SessionRow;

impl Database {
    pub fn create_session(&self, token: &str, user_id: &str, expires_at: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![token, user_id, expires_at],
            )?;
            Ok(())
        })
    }

    /// Look up a session, ignoring expired rows. Expired rows are removed
    /// on sight so the table does not accumulate dead sessions.
    pub fn get_valid_session(&self, token: &str) -> Result<Option<SessionRow>> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "DELETE FROM sessions WHERE token = ?1 AND expires_at <= datetime('now')",
                [token],
            )?;
            let row = conn
                .query_row(
                    "SELECT token, user_id, created_at, expires_at
                     FROM sessions
                     WHERE token = ?1 AND expires_at > datetime('now')",
                    [token],
                    |row| {
                        Ok(SessionRow {
                            token: row.get(0)?,
                            user_id: row.get(1)?,
                            created_at: row.get(2)?,
                            expires_at: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn delete_session(&self, token: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("DELETE FROM sessions WHERE token = ?1", [token])?;
            Ok(())
        })
    }

    pub fn purge_expired_sessions(&self) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM sessions WHERE expires_at <= datetime('now')",
                [],
            )?;
            Ok(removed)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::queries::users::tests::seed_user;
    use crate::test_db;

    #[test]
    fn valid_session_round_trip() {
        let db = test_db();
        let user_id = seed_user(&db, "alice");

        db.create_session("tok-1", &user_id, "2999-01-01 00:00:00")
            .unwrap();
        let session = db.get_valid_session("tok-1").unwrap().unwrap();
        assert_eq!(session.user_id, user_id);

        db.delete_session("tok-1").unwrap();
        assert!(db.get_valid_session("tok-1").unwrap().is_none());
    }

    #[test]
    fn expired_session_does_not_authenticate() {
        let db = test_db();
        let user_id = seed_user(&db, "alice");

        db.create_session("tok-old", &user_id, "2000-01-01 00:00:00")
            .unwrap();
        assert!(db.get_valid_session("tok-old").unwrap().is_none());
    }

    #[test]
    fn purge_removes_only_expired_rows() {
        let db = test_db();
        let user_id = seed_user(&db, "alice");

        db.create_session("tok-old", &user_id, "2000-01-01 00:00:00")
            .unwrap();
        db.create_session("tok-new", &user_id, "2999-01-01 00:00:00")
            .unwrap();

        assert_eq!(db.purge_expired_sessions().unwrap(), 1);
        assert!(db.get_valid_session("tok-new").unwrap().is_some());
    }
}
