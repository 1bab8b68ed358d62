use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL UNIQUE,
                email           TEXT NOT NULL UNIQUE,
                password        TEXT NOT NULL,
                name            TEXT NOT NULL,
                initials        TEXT NOT NULL,
                avatar_color    TEXT NOT NULL,
                profile_picture TEXT,
                role            TEXT NOT NULL DEFAULT 'user',
                status          TEXT NOT NULL DEFAULT 'offline',
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE sessions (
                token       TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id),
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                expires_at  TEXT NOT NULL
            );

            CREATE INDEX idx_sessions_user ON sessions(user_id);

            CREATE TABLE recipes (
                id           TEXT PRIMARY KEY,
                title        TEXT NOT NULL,
                instructions TEXT NOT NULL,
                time_minutes INTEGER NOT NULL,
                difficulty   TEXT NOT NULL,
                servings     INTEGER NOT NULL,
                image_url    TEXT,
                video_url    TEXT,
                created_at   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE recipe_ingredients (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                recipe_id       TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                ingredient_name TEXT NOT NULL,
                quantity        TEXT NOT NULL
            );

            CREATE INDEX idx_ingredients_recipe ON recipe_ingredients(recipe_id);
            CREATE INDEX idx_ingredients_name ON recipe_ingredients(ingredient_name);

            CREATE TABLE saved_recipes (
                user_id    TEXT NOT NULL REFERENCES users(id),
                recipe_id  TEXT NOT NULL REFERENCES recipes(id),
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(user_id, recipe_id)
            );

            CREATE TABLE meal_plans (
                id              TEXT PRIMARY KEY,
                user_id         TEXT NOT NULL REFERENCES users(id),
                recipe_id       TEXT NOT NULL REFERENCES recipes(id),
                day_of_week     TEXT NOT NULL,
                meal_type       TEXT NOT NULL,
                week_start_date TEXT NOT NULL,
                UNIQUE(user_id, week_start_date, day_of_week, meal_type)
            );

            -- Integer ids: the chat poller fetches rows greater than the
            -- last seen id.
            CREATE TABLE chat_messages (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                sender_id    TEXT NOT NULL REFERENCES users(id),
                receiver_id  TEXT NOT NULL REFERENCES users(id),
                message_text TEXT NOT NULL,
                is_read      INTEGER NOT NULL DEFAULT 0,
                created_at   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_chat_pair ON chat_messages(sender_id, receiver_id, id);

            CREATE TABLE posts (
                id             TEXT PRIMARY KEY,
                user_id        TEXT NOT NULL REFERENCES users(id),
                content        TEXT NOT NULL,
                image_url      TEXT,
                likes_count    INTEGER NOT NULL DEFAULT 0,
                comments_count INTEGER NOT NULL DEFAULT 0,
                created_at     TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_posts_created ON posts(created_at);

            CREATE TABLE comments (
                id         TEXT PRIMARY KEY,
                post_id    TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                user_id    TEXT NOT NULL REFERENCES users(id),
                content    TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_comments_post ON comments(post_id);

            CREATE TABLE post_likes (
                post_id    TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                user_id    TEXT NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(post_id, user_id)
            );

            CREATE TABLE notifications (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id    TEXT NOT NULL REFERENCES users(id),
                type       TEXT NOT NULL,
                title      TEXT NOT NULL,
                message    TEXT NOT NULL,
                related_id TEXT,
                is_read    INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_notifications_user ON notifications(user_id, is_read);

            CREATE TABLE user_followers (
                follower_id  TEXT NOT NULL REFERENCES users(id),
                following_id TEXT NOT NULL REFERENCES users(id),
                created_at   TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(follower_id, following_id)
            );

            -- Seed a small starter catalog so a fresh install can serve
            -- searches.
            INSERT INTO recipes (id, title, instructions, time_minutes, difficulty, servings)
                VALUES ('00000000-0000-0000-0000-0000000000a1',
                        'Garlic Chicken Stir-Fry',
                        'Slice the chicken and stir-fry over high heat. Add garlic and ginger, then broccoli. Finish with soy sauce and serve over rice.',
                        25, 'easy', 2);
            INSERT INTO recipe_ingredients (recipe_id, ingredient_name, quantity) VALUES
                ('00000000-0000-0000-0000-0000000000a1', 'chicken breast', '2 pieces'),
                ('00000000-0000-0000-0000-0000000000a1', 'garlic', '3 cloves'),
                ('00000000-0000-0000-0000-0000000000a1', 'soy sauce', '2 tbsp'),
                ('00000000-0000-0000-0000-0000000000a1', 'broccoli', '1 head'),
                ('00000000-0000-0000-0000-0000000000a1', 'ginger', '1 thumb');

            INSERT INTO recipes (id, title, instructions, time_minutes, difficulty, servings)
                VALUES ('00000000-0000-0000-0000-0000000000a2',
                        'Classic Tomato Pasta',
                        'Cook the spaghetti. Soften garlic in olive oil, add chopped tomatoes and simmer. Toss with the pasta and torn basil.',
                        30, 'easy', 4);
            INSERT INTO recipe_ingredients (recipe_id, ingredient_name, quantity) VALUES
                ('00000000-0000-0000-0000-0000000000a2', 'spaghetti', '400 g'),
                ('00000000-0000-0000-0000-0000000000a2', 'tomato', '6'),
                ('00000000-0000-0000-0000-0000000000a2', 'garlic', '2 cloves'),
                ('00000000-0000-0000-0000-0000000000a2', 'olive oil', '3 tbsp'),
                ('00000000-0000-0000-0000-0000000000a2', 'basil', '1 bunch');

            INSERT INTO recipes (id, title, instructions, time_minutes, difficulty, servings)
                VALUES ('00000000-0000-0000-0000-0000000000a3',
                        'Hearty Lentil Soup',
                        'Sweat the onion, carrot and garlic. Add lentils, cumin and stock, then simmer until the lentils are tender.',
                        45, 'medium', 6);
            INSERT INTO recipe_ingredients (recipe_id, ingredient_name, quantity) VALUES
                ('00000000-0000-0000-0000-0000000000a3', 'lentils', '300 g'),
                ('00000000-0000-0000-0000-0000000000a3', 'carrot', '2'),
                ('00000000-0000-0000-0000-0000000000a3', 'onion', '1'),
                ('00000000-0000-0000-0000-0000000000a3', 'garlic', '2 cloves'),
                ('00000000-0000-0000-0000-0000000000a3', 'cumin', '1 tsp'),
                ('00000000-0000-0000-0000-0000000000a3', 'vegetable stock', '1.5 l');

            INSERT INTO recipes (id, title, instructions, time_minutes, difficulty, servings)
                VALUES ('00000000-0000-0000-0000-0000000000a4',
                        'Veggie Omelette',
                        'Whisk the eggs. Fry pepper and onion, pour over the eggs, top with cheese and fold.',
                        10, 'easy', 1);
            INSERT INTO recipe_ingredients (recipe_id, ingredient_name, quantity) VALUES
                ('00000000-0000-0000-0000-0000000000a4', 'eggs', '3'),
                ('00000000-0000-0000-0000-0000000000a4', 'bell pepper', '1'),
                ('00000000-0000-0000-0000-0000000000a4', 'onion', '1/2'),
                ('00000000-0000-0000-0000-0000000000a4', 'cheese', '50 g');

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
