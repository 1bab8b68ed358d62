use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use forge_types::api::{AddMealRequest, MealPlanResponse, RemoveMealRequest};
use forge_types::models::MealSlot;

use crate::convert::{parse_db_uuid, recipe_model};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

const DAYS: [&str; 7] = [
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];
const MEAL_TYPES: [&str; 4] = ["breakfast", "lunch", "dinner", "snack"];

#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    pub week_start: Option<String>,
}

pub async fn week(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<WeekQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let week_start = query
        .week_start
        .ok_or_else(|| ApiError::validation("week_start is required"))?;
    validate_week_date(&week_start)?;

    let db = state.clone();
    let user_id = user.id.to_string();
    let week = week_start.clone();
    let (slots, recipes, ingredients) = tokio::task::spawn_blocking(move || {
        let slots = db.db.meal_slots_for_week(&user_id, &week)?;
        let ids: Vec<String> = slots.iter().map(|s| s.recipe_id.clone()).collect();
        let recipes = db.db.recipes_by_ids(&ids)?;
        let ingredients = db.db.ingredients_for_recipes(&ids)?;
        Ok::<_, anyhow::Error>((slots, recipes, ingredients))
    })
    .await??;

    let mut recipe_map: HashMap<String, _> = recipes
        .into_iter()
        .map(|row| (row.id.clone(), row))
        .collect();
    let mut ingredient_map: HashMap<String, Vec<_>> = HashMap::new();
    for ingredient in ingredients {
        ingredient_map
            .entry(ingredient.recipe_id.clone())
            .or_default()
            .push(ingredient);
    }

    let mut out = Vec::with_capacity(slots.len());
    for slot in slots {
        // A slot whose recipe vanished is dropped rather than failing the
        // whole week.
        let Some(recipe_row) = recipe_map.remove(&slot.recipe_id) else {
            continue;
        };
        let own = ingredient_map.remove(&slot.recipe_id).unwrap_or_default();
        out.push(MealSlot {
            id: parse_db_uuid(&slot.id, "meal slot"),
            day_of_week: slot.day_of_week,
            meal_type: slot.meal_type,
            week_start_date: slot.week_start_date,
            recipe: recipe_model(recipe_row, own, &state.media_base),
        });
    }

    Ok(Json(MealPlanResponse {
        success: true,
        week_start_date: week_start,
        slots: out,
    }))
}

/// Fill a slot; an occupied (day, meal type) slot is replaced, never
/// duplicated.
pub async fn add(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<AddMealRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_day(&req.day_of_week)?;
    validate_meal_type(&req.meal_type)?;
    validate_week_date(&req.week_start_date)?;

    let db = state.clone();
    let user_id = user.id.to_string();
    let recipe_id = req.recipe_id.to_string();
    let slot_id = Uuid::new_v4().to_string();
    let found = tokio::task::spawn_blocking(move || {
        if db.db.get_recipe(&recipe_id)?.is_none() {
            return Ok(false);
        }
        db.db.upsert_meal_slot(
            &slot_id,
            &user_id,
            &recipe_id,
            &req.day_of_week,
            &req.meal_type,
            &req.week_start_date,
        )?;
        Ok::<_, anyhow::Error>(true)
    })
    .await??;

    if !found {
        return Err(ApiError::NotFound("recipe"));
    }

    Ok(Json(json!({ "success": true })))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<RemoveMealRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_day(&req.day_of_week)?;
    validate_meal_type(&req.meal_type)?;
    validate_week_date(&req.week_start_date)?;

    let db = state.clone();
    let user_id = user.id.to_string();
    let removed = tokio::task::spawn_blocking(move || {
        db.db.remove_meal_slot(
            &user_id,
            &req.day_of_week,
            &req.meal_type,
            &req.week_start_date,
        )
    })
    .await??;

    if !removed {
        return Err(ApiError::NotFound("meal slot"));
    }

    Ok(Json(json!({ "success": true })))
}

fn validate_day(day: &str) -> Result<(), ApiError> {
    if DAYS.contains(&day) {
        Ok(())
    } else {
        Err(ApiError::validation("invalid day_of_week"))
    }
}

fn validate_meal_type(meal: &str) -> Result<(), ApiError> {
    if MEAL_TYPES.contains(&meal) {
        Ok(())
    } else {
        Err(ApiError::validation("invalid meal_type"))
    }
}

fn validate_week_date(date: &str) -> Result<(), ApiError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ApiError::validation("week_start_date must be YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validators_accept_the_domain() {
        assert!(validate_day("monday").is_ok());
        assert!(validate_day("Funday").is_err());
        assert!(validate_meal_type("dinner").is_ok());
        assert!(validate_meal_type("supper").is_err());
        assert!(validate_week_date("2026-08-03").is_ok());
        assert!(validate_week_date("03/08/2026").is_err());
    }
}
