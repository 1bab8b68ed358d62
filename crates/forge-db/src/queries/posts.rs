use anyhow::Result;
use rusqlite::OptionalExtension;

use crate::Database;
use crate::models::{CommentRow, PostLikeOutcome, PostRow, UserRow};
use crate::queries::user_from_row;

impl Database {
    pub fn insert_post(&self, id: &str, user_id: &str, content: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO posts (id, user_id, content) VALUES (?1, ?2, ?3)",
                rusqlite::params![id, user_id, content],
            )?;
            Ok(())
        })
    }

    /// The community feed: newest posts first, each with its author row and
    /// whether the viewer has liked it.
    pub fn feed(&self, viewer_id: &str, limit: u32) -> Result<Vec<(PostRow, UserRow)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.user_id, p.content, p.image_url, p.likes_count, p.comments_count,
                        p.created_at,
                        EXISTS(SELECT 1 FROM post_likes pl
                               WHERE pl.post_id = p.id AND pl.user_id = ?1) AS liked,
                        u.id, u.username, u.email, u.password, u.name, u.initials, u.avatar_color,
                        u.profile_picture, u.role, u.status, u.created_at
                 FROM posts p
                 JOIN users u ON u.id = p.user_id
                 ORDER BY p.created_at DESC, p.rowid DESC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![viewer_id, limit], |row| {
                    let post = PostRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        content: row.get(2)?,
                        image_url: row.get(3)?,
                        likes_count: row.get(4)?,
                        comments_count: row.get(5)?,
                        created_at: row.get(6)?,
                        liked_by_me: row.get(7)?,
                    };
                    let author = user_from_row(row, 8)?;
                    Ok((post, author))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Toggle the viewer's like and keep the denormalized counter in step.
    /// Returns None when the post does not exist.
    pub fn toggle_post_like(&self, post_id: &str, user_id: &str) -> Result<Option<PostLikeOutcome>> {
        self.with_conn_mut(|conn| {
            let owner: Option<String> = conn
                .query_row(
                    "SELECT user_id FROM posts WHERE id = ?1",
                    [post_id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(owner_id) = owner else {
                return Ok(None);
            };

            let existing: Option<i64> = conn
                .query_row(
                    "SELECT rowid FROM post_likes WHERE post_id = ?1 AND user_id = ?2",
                    rusqlite::params![post_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;

            let liked = if let Some(rowid) = existing {
                conn.execute("DELETE FROM post_likes WHERE rowid = ?1", [rowid])?;
                conn.execute(
                    "UPDATE posts SET likes_count = likes_count - 1 WHERE id = ?1",
                    [post_id],
                )?;
                false
            } else {
                conn.execute(
                    "INSERT INTO post_likes (post_id, user_id) VALUES (?1, ?2)",
                    rusqlite::params![post_id, user_id],
                )?;
                conn.execute(
                    "UPDATE posts SET likes_count = likes_count + 1 WHERE id = ?1",
                    [post_id],
                )?;
                true
            };

            let likes_count: i64 = conn.query_row(
                "SELECT likes_count FROM posts WHERE id = ?1",
                [post_id],
                |row| row.get(0),
            )?;

            Ok(Some(PostLikeOutcome {
                liked,
                likes_count,
                owner_id,
            }))
        })
    }

    /// Insert a comment and bump the post counter. Returns the post
    /// author's id, or None when the post does not exist.
    pub fn insert_comment(
        &self,
        id: &str,
        post_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<Option<String>> {
        self.with_conn_mut(|conn| {
            let owner: Option<String> = conn
                .query_row(
                    "SELECT user_id FROM posts WHERE id = ?1",
                    [post_id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(owner_id) = owner else {
                return Ok(None);
            };

            conn.execute(
                "INSERT INTO comments (id, post_id, user_id, content) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, post_id, user_id, content],
            )?;
            conn.execute(
                "UPDATE posts SET comments_count = comments_count + 1 WHERE id = ?1",
                [post_id],
            )?;
            Ok(Some(owner_id))
        })
    }

    /// Comments on a post, oldest first, each with its author row.
    pub fn comments_for_post(&self, post_id: &str) -> Result<Vec<(CommentRow, UserRow)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.post_id, c.user_id, c.content, c.created_at,
                        u.id, u.username, u.email, u.password, u.name, u.initials, u.avatar_color,
                        u.profile_picture, u.role, u.status, u.created_at
                 FROM comments c
                 JOIN users u ON u.id = c.user_id
                 WHERE c.post_id = ?1
                 ORDER BY c.created_at ASC, c.rowid ASC",
            )?;
            let rows = stmt
                .query_map([post_id], |row| {
                    let comment = CommentRow {
                        id: row.get(0)?,
                        post_id: row.get(1)?,
                        user_id: row.get(2)?,
                        content: row.get(3)?,
                        created_at: row.get(4)?,
                    };
                    let author = user_from_row(row, 5)?;
                    Ok((comment, author))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn post_exists(&self, post_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row("SELECT 1 FROM posts WHERE id = ?1", [post_id], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(found.is_some())
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::queries::users::tests::seed_user;
    use crate::test_db;
    use uuid::Uuid;

    #[test]
    fn feed_carries_authors_and_like_state() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        let post_id = Uuid::new_v4().to_string();
        db.insert_post(&post_id, &bob, "fresh bread today").unwrap();
        db.toggle_post_like(&post_id, &alice).unwrap();

        let feed_for_alice = db.feed(&alice, 50).unwrap();
        assert_eq!(feed_for_alice.len(), 1);
        let (post, author) = &feed_for_alice[0];
        assert_eq!(author.username, "bob");
        assert!(post.liked_by_me);
        assert_eq!(post.likes_count, 1);

        // Bob has not liked his own post.
        let feed_for_bob = db.feed(&bob, 50).unwrap();
        assert!(!feed_for_bob[0].0.liked_by_me);
    }

    #[test]
    fn like_toggle_keeps_counter_consistent() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        let post_id = Uuid::new_v4().to_string();
        db.insert_post(&post_id, &bob, "post").unwrap();

        let outcome = db.toggle_post_like(&post_id, &alice).unwrap().unwrap();
        assert!(outcome.liked);
        assert_eq!(outcome.likes_count, 1);
        assert_eq!(outcome.owner_id, bob);

        let outcome = db.toggle_post_like(&post_id, &alice).unwrap().unwrap();
        assert!(!outcome.liked);
        assert_eq!(outcome.likes_count, 0);

        assert!(db.toggle_post_like("missing", &alice).unwrap().is_none());
    }

    #[test]
    fn comments_bump_counter_and_list_in_order() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        let post_id = Uuid::new_v4().to_string();
        db.insert_post(&post_id, &bob, "post").unwrap();

        let owner = db
            .insert_comment(&Uuid::new_v4().to_string(), &post_id, &alice, "first")
            .unwrap();
        assert_eq!(owner, Some(bob.clone()));
        db.insert_comment(&Uuid::new_v4().to_string(), &post_id, &bob, "second")
            .unwrap();

        let comments = db.comments_for_post(&post_id).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].0.content, "first");
        assert_eq!(comments[1].1.username, "bob");

        let (post, _) = &db.feed(&alice, 50).unwrap()[0];
        assert_eq!(post.comments_count, 2);

        assert!(
            db.insert_comment(&Uuid::new_v4().to_string(), "missing", &alice, "x")
                .unwrap()
                .is_none()
        );
    }
}
