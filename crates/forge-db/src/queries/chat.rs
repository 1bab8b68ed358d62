use anyhow::{Result, anyhow};
use rusqlite::Connection;

use crate::Database;
use crate::models::{ChatMessageRow, ConversationRow, UserRow};
use crate::queries::user_from_row;

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatMessageRow> {
    Ok(ChatMessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        message_text: row.get(3)?,
        is_read: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn query_message(conn: &Connection, id: i64) -> Result<ChatMessageRow> {
    let mut stmt = conn.prepare(
        "SELECT id, sender_id, receiver_id, message_text, is_read, created_at
         FROM chat_messages WHERE id = ?1",
    )?;
    stmt.query_row([id], message_from_row)
        .map_err(|_| anyhow!("Message not found: {}", id))
}

impl Database {
    pub fn insert_chat_message(
        &self,
        sender_id: &str,
        receiver_id: &str,
        message_text: &str,
    ) -> Result<ChatMessageRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO chat_messages (sender_id, receiver_id, message_text)
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![sender_id, receiver_id, message_text],
            )?;
            query_message(conn, conn.last_insert_rowid())
        })
    }

    /// Both directions of the conversation between two users, oldest first.
    /// `last_id = 0` returns the full history; otherwise only rows newer
    /// than the poller's cursor.
    pub fn conversation_messages(
        &self,
        user_id: &str,
        peer_id: &str,
        last_id: i64,
    ) -> Result<Vec<ChatMessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, sender_id, receiver_id, message_text, is_read, created_at
                 FROM chat_messages
                 WHERE ((sender_id = ?1 AND receiver_id = ?2)
                     OR (sender_id = ?2 AND receiver_id = ?1))
                   AND id > ?3
                 ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, peer_id, last_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Flip `is_read` on everything the peer sent this user. Returns how
    /// many rows changed.
    pub fn mark_conversation_read(&self, user_id: &str, peer_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE chat_messages SET is_read = 1
                 WHERE receiver_id = ?1 AND sender_id = ?2 AND is_read = 0",
                rusqlite::params![user_id, peer_id],
            )?;
            Ok(changed)
        })
    }

    /// One entry per peer the user has exchanged messages with, newest
    /// conversation first.
    pub fn conversations_for(&self, user_id: &str) -> Result<Vec<(ConversationRow, UserRow)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT CASE WHEN sender_id = ?1 THEN receiver_id ELSE sender_id END AS peer_id,
                        MAX(id) AS last_id
                 FROM chat_messages
                 WHERE sender_id = ?1 OR receiver_id = ?1
                 GROUP BY peer_id
                 ORDER BY last_id DESC",
            )?;
            let pairs = stmt
                .query_map([user_id], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut out = Vec::with_capacity(pairs.len());
            for (peer_id, last_id) in pairs {
                let last = query_message(conn, last_id)?;
                let unread: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM chat_messages
                     WHERE receiver_id = ?1 AND sender_id = ?2 AND is_read = 0",
                    rusqlite::params![user_id, peer_id],
                    |r| r.get(0),
                )?;
                let mut user_stmt = conn.prepare(
                    "SELECT id, username, email, password, name, initials, avatar_color,
                            profile_picture, role, status, created_at
                     FROM users WHERE id = ?1",
                )?;
                let peer = user_stmt
                    .query_row([&peer_id], |row| user_from_row(row, 0))
                    .map_err(|_| anyhow!("User not found: {}", peer_id))?;

                out.push((
                    ConversationRow {
                        peer_id,
                        last_message: last.message_text,
                        last_created_at: last.created_at,
                        unread,
                    },
                    peer,
                ));
            }
            Ok(out)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::queries::users::tests::seed_user;
    use crate::test_db;

    #[test]
    fn full_history_then_incremental_poll() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        let m1 = db.insert_chat_message(&alice, &bob, "hello").unwrap();
        let m2 = db.insert_chat_message(&bob, &alice, "hi back").unwrap();
        let m3 = db.insert_chat_message(&alice, &bob, "lunch?").unwrap();

        // last_id = 0 → the whole conversation, oldest first.
        let all = db.conversation_messages(&alice, &bob, 0).unwrap();
        assert_eq!(
            all.iter().map(|m| m.id).collect::<Vec<_>>(),
            vec![m1.id, m2.id, m3.id]
        );

        // last_id = N → only rows with id > N.
        let newer = db.conversation_messages(&alice, &bob, m1.id).unwrap();
        assert_eq!(
            newer.iter().map(|m| m.id).collect::<Vec<_>>(),
            vec![m2.id, m3.id]
        );

        let none = db.conversation_messages(&alice, &bob, m3.id).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn conversation_is_scoped_to_the_pair() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let carol = seed_user(&db, "carol");

        db.insert_chat_message(&alice, &bob, "for bob").unwrap();
        db.insert_chat_message(&alice, &carol, "for carol").unwrap();

        let with_bob = db.conversation_messages(&alice, &bob, 0).unwrap();
        assert_eq!(with_bob.len(), 1);
        assert_eq!(with_bob[0].message_text, "for bob");
    }

    #[test]
    fn mark_read_flips_only_incoming_rows() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        db.insert_chat_message(&bob, &alice, "one").unwrap();
        db.insert_chat_message(&bob, &alice, "two").unwrap();
        db.insert_chat_message(&alice, &bob, "reply").unwrap();

        assert_eq!(db.mark_conversation_read(&alice, &bob).unwrap(), 2);
        // Second call finds nothing left to flip.
        assert_eq!(db.mark_conversation_read(&alice, &bob).unwrap(), 0);

        // Alice's own outgoing message is untouched from Bob's side until
        // he marks it.
        assert_eq!(db.mark_conversation_read(&bob, &alice).unwrap(), 1);
    }

    #[test]
    fn sidebar_lists_peers_with_unread_counts() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let carol = seed_user(&db, "carol");

        db.insert_chat_message(&bob, &alice, "ping").unwrap();
        db.insert_chat_message(&bob, &alice, "ping again").unwrap();
        db.insert_chat_message(&alice, &carol, "hey carol").unwrap();

        let convs = db.conversations_for(&alice).unwrap();
        assert_eq!(convs.len(), 2);

        // Newest conversation first: the carol thread has the highest id.
        assert_eq!(convs[0].1.username, "carol");
        assert_eq!(convs[0].0.unread, 0);

        assert_eq!(convs[1].1.username, "bob");
        assert_eq!(convs[1].0.unread, 2);
        assert_eq!(convs[1].0.last_message, "ping again");
    }
}
