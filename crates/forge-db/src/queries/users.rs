use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::Database;
use crate::models::UserRow;

const USER_COLS: &str = "id, username, email, password, name, initials, avatar_color, \
                         profile_picture, role, status, created_at";

/// Map a user row starting at `offset`, for queries that join users onto
/// other tables.
pub(crate) fn user_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(offset)?,
        username: row.get(offset + 1)?,
        email: row.get(offset + 2)?,
        password: row.get(offset + 3)?,
        name: row.get(offset + 4)?,
        initials: row.get(offset + 5)?,
        avatar_color: row.get(offset + 6)?,
        profile_picture: row.get(offset + 7)?,
        role: row.get(offset + 8)?,
        status: row.get(offset + 9)?,
        created_at: row.get(offset + 10)?,
    })
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLS} FROM users WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], |row| user_from_row(row, 0)).optional()?;
    Ok(row)
}

impl Database {
    pub fn create_user(&self, user: &UserRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, name, initials, avatar_color, role, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    user.id,
                    user.username,
                    user.email,
                    user.password,
                    user.name,
                    user.initials,
                    user.avatar_color,
                    user.role,
                    user.status,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    /// The user directory shown in the chat sidebar — everyone but the
    /// viewer.
    pub fn list_users_except(&self, user_id: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLS} FROM users WHERE id != ?1 ORDER BY username"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], |row| user_from_row(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn set_user_status(&self, id: &str, status: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET status = ?2 WHERE id = ?1",
                rusqlite::params![id, status],
            )?;
            Ok(())
        })
    }

    pub fn update_user_profile(
        &self,
        id: &str,
        name: &str,
        initials: &str,
        email: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET name = ?2, initials = ?3, email = ?4 WHERE id = ?1",
                rusqlite::params![id, name, initials, email],
            )?;
            Ok(())
        })
    }

    pub fn set_profile_picture(&self, id: &str, path: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET profile_picture = ?2 WHERE id = ?1",
                rusqlite::params![id, path],
            )?;
            Ok(())
        })
    }

    /// (followers, following, posts) counters for the profile page.
    pub fn profile_stats(&self, id: &str) -> Result<(i64, i64, i64)> {
        self.with_conn(|conn| {
            let followers: i64 = conn.query_row(
                "SELECT COUNT(*) FROM user_followers WHERE following_id = ?1",
                [id],
                |r| r.get(0),
            )?;
            let following: i64 = conn.query_row(
                "SELECT COUNT(*) FROM user_followers WHERE follower_id = ?1",
                [id],
                |r| r.get(0),
            )?;
            let posts: i64 = conn.query_row(
                "SELECT COUNT(*) FROM posts WHERE user_id = ?1",
                [id],
                |r| r.get(0),
            )?;
            Ok((followers, following, posts))
        })
    }

    /// Toggle a follow edge: removes if present, inserts if not.
    /// Returns true when the follow was added.
    pub fn toggle_follow(&self, follower_id: &str, following_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT rowid FROM user_followers WHERE follower_id = ?1 AND following_id = ?2",
                    rusqlite::params![follower_id, following_id],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(rowid) = existing {
                conn.execute("DELETE FROM user_followers WHERE rowid = ?1", [rowid])?;
                Ok(false)
            } else {
                conn.execute(
                    "INSERT INTO user_followers (follower_id, following_id) VALUES (?1, ?2)",
                    rusqlite::params![follower_id, following_id],
                )?;
                Ok(true)
            }
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::test_db;
    use uuid::Uuid;

    /// Insert a user with sane defaults and return its id.
    pub(crate) fn seed_user(db: &Database, username: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&UserRow {
            id: id.clone(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "argon2-hash".to_string(),
            name: format!("{username} surname"),
            initials: "TS".to_string(),
            avatar_color: "#3498db".to_string(),
            profile_picture: None,
            role: "user".to_string(),
            status: "offline".to_string(),
            created_at: String::new(),
        })
        .expect("create user");
        id
    }

    #[test]
    fn create_and_fetch_user() {
        let db = test_db();
        let id = seed_user(&db, "alice");

        let by_id = db.get_user_by_id(&id).unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
        assert_eq!(by_id.role, "user");

        let by_name = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, id);

        let by_email = db.get_user_by_email("alice@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, id);

        assert!(db.get_user_by_username("nobody").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let db = test_db();
        seed_user(&db, "alice");

        let dup = UserRow {
            id: Uuid::new_v4().to_string(),
            username: "alice".to_string(),
            email: "other@example.com".to_string(),
            password: "hash".to_string(),
            name: "Other".to_string(),
            initials: "O".to_string(),
            avatar_color: "#000".to_string(),
            profile_picture: None,
            role: "user".to_string(),
            status: "offline".to_string(),
            created_at: String::new(),
        };
        assert!(db.create_user(&dup).is_err());
    }

    #[test]
    fn status_and_profile_updates() {
        let db = test_db();
        let id = seed_user(&db, "alice");

        db.set_user_status(&id, "online").unwrap();
        assert_eq!(db.get_user_by_id(&id).unwrap().unwrap().status, "online");

        db.update_user_profile(&id, "Alice Liddell", "AL", "alice@new.example")
            .unwrap();
        let user = db.get_user_by_id(&id).unwrap().unwrap();
        assert_eq!(user.name, "Alice Liddell");
        assert_eq!(user.initials, "AL");
        assert_eq!(user.email, "alice@new.example");

        db.set_profile_picture(&id, "avatars/abc").unwrap();
        assert_eq!(
            db.get_user_by_id(&id).unwrap().unwrap().profile_picture,
            Some("avatars/abc".to_string())
        );
    }

    #[test]
    fn follow_toggles_and_feeds_stats() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        assert!(db.toggle_follow(&alice, &bob).unwrap());
        let (followers, following, _) = db.profile_stats(&bob).unwrap();
        assert_eq!((followers, following), (1, 0));
        let (followers, following, _) = db.profile_stats(&alice).unwrap();
        assert_eq!((followers, following), (0, 1));

        // Second toggle unfollows.
        assert!(!db.toggle_follow(&alice, &bob).unwrap());
        let (followers, _, _) = db.profile_stats(&bob).unwrap();
        assert_eq!(followers, 0);
    }

    #[test]
    fn directory_excludes_the_viewer() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        seed_user(&db, "bob");
        seed_user(&db, "carol");

        let others = db.list_users_except(&alice).unwrap();
        let names: Vec<_> = others.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["bob", "carol"]);
    }
}
