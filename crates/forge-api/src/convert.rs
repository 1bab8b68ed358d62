//! Row-to-model helpers shared across handlers.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use forge_db::models::{IngredientRow, RecipeRow, UserRow};
use forge_types::media::media_url;
use forge_types::models::{Ingredient, Recipe, UserProfile, UserSummary};

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC and convert; RFC 3339 strings also pass.
pub(crate) fn parse_db_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

pub(crate) fn parse_db_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, raw, e);
        Uuid::default()
    })
}

pub(crate) fn user_summary(row: &UserRow, media_base: &str) -> UserSummary {
    UserSummary {
        id: parse_db_uuid(&row.id, "user"),
        username: row.username.clone(),
        name: row.name.clone(),
        initials: row.initials.clone(),
        avatar_color: row.avatar_color.clone(),
        avatar_url: row
            .profile_picture
            .as_deref()
            .map(|p| media_url(media_base, p)),
        status: row.status.clone(),
    }
}

pub(crate) fn user_profile(row: &UserRow, media_base: &str) -> UserProfile {
    UserProfile {
        id: parse_db_uuid(&row.id, "user"),
        username: row.username.clone(),
        email: row.email.clone(),
        name: row.name.clone(),
        initials: row.initials.clone(),
        avatar_color: row.avatar_color.clone(),
        avatar_url: row
            .profile_picture
            .as_deref()
            .map(|p| media_url(media_base, p)),
        role: row.role.clone(),
        status: row.status.clone(),
        created_at: parse_db_timestamp(&row.created_at),
    }
}

pub(crate) fn recipe_model(
    row: RecipeRow,
    ingredients: Vec<IngredientRow>,
    media_base: &str,
) -> Recipe {
    Recipe {
        id: parse_db_uuid(&row.id, "recipe"),
        title: row.title,
        instructions: row.instructions,
        time_minutes: row.time_minutes as u32,
        difficulty: row.difficulty,
        servings: row.servings as u32,
        image_url: row.image_url.map(|u| media_url(media_base, &u)),
        video_url: row.video_url.map(|u| media_url(media_base, &u)),
        ingredients: ingredients
            .into_iter()
            .map(|i| Ingredient {
                name: i.ingredient_name,
                quantity: i.quantity,
            })
            .collect(),
        created_at: parse_db_timestamp(&row.created_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sqlite_and_rfc3339_timestamps() {
        let from_sqlite = parse_db_timestamp("2026-08-06 10:30:00");
        assert_eq!(from_sqlite.to_rfc3339(), "2026-08-06T10:30:00+00:00");

        let from_rfc = parse_db_timestamp("2026-08-06T10:30:00Z");
        assert_eq!(from_sqlite, from_rfc);
    }

    #[test]
    fn corrupt_timestamp_falls_back_to_default() {
        assert_eq!(parse_db_timestamp("not a date"), DateTime::<Utc>::default());
    }

    #[test]
    fn corrupt_uuid_falls_back_to_nil() {
        assert_eq!(parse_db_uuid("oops", "user"), Uuid::default());
    }
}
