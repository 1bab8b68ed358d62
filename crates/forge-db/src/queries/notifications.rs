use anyhow::Result;

use crate::Database;
use crate::models::NotificationRow;

impl Database {
    pub fn insert_notification(
        &self,
        user_id: &str,
        kind: &str,
        title: &str,
        message: &str,
        related_id: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO notifications (user_id, type, title, message, related_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![user_id, kind, title, message, related_id],
            )?;
            Ok(())
        })
    }

    pub fn notifications_for(&self, user_id: &str, limit: u32) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, type, title, message, related_id, is_read, created_at
                 FROM notifications
                 WHERE user_id = ?1
                 ORDER BY id DESC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        kind: row.get(2)?,
                        title: row.get(3)?,
                        message: row.get(4)?,
                        related_id: row.get(5)?,
                        is_read: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// The badge count, derived at query time.
    pub fn unread_notification_count(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
                [user_id],
                |r| r.get(0),
            )?;
            Ok(count)
        })
    }

    /// Mark one notification read. Scoped to the owner: a foreign id
    /// changes nothing and returns false.
    pub fn mark_notification_read(&self, id: i64, user_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
                rusqlite::params![id, user_id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn mark_all_notifications_read(&self, user_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
                [user_id],
            )?;
            Ok(changed)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::queries::users::tests::seed_user;
    use crate::test_db;

    #[test]
    fn count_is_derived_and_drains_on_read_all() {
        let db = test_db();
        let alice = seed_user(&db, "alice");

        db.insert_notification(&alice, "message", "New message", "bob sent you a message", None)
            .unwrap();
        db.insert_notification(&alice, "like", "New like", "bob liked your post", Some("p1"))
            .unwrap();

        assert_eq!(db.unread_notification_count(&alice).unwrap(), 2);

        assert_eq!(db.mark_all_notifications_read(&alice).unwrap(), 2);
        assert_eq!(db.unread_notification_count(&alice).unwrap(), 0);

        // Rows survive; only the flag changed.
        assert_eq!(db.notifications_for(&alice, 50).unwrap().len(), 2);
    }

    #[test]
    fn list_is_newest_first_and_capped() {
        let db = test_db();
        let alice = seed_user(&db, "alice");

        for i in 0..5 {
            db.insert_notification(&alice, "message", "New message", &format!("m{i}"), None)
                .unwrap();
        }

        let page = db.notifications_for(&alice, 3).unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].message, "m4");
        assert_eq!(page[2].message, "m2");
    }

    #[test]
    fn mark_read_is_scoped_to_the_owner() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        db.insert_notification(&alice, "follow", "New follower", "bob followed you", None)
            .unwrap();
        let id = db.notifications_for(&alice, 1).unwrap()[0].id;

        // Bob cannot touch Alice's notification.
        assert!(!db.mark_notification_read(id, &bob).unwrap());
        assert_eq!(db.unread_notification_count(&alice).unwrap(), 1);

        assert!(db.mark_notification_read(id, &alice).unwrap());
        assert_eq!(db.unread_notification_count(&alice).unwrap(), 0);
    }
}
