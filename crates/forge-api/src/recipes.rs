use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use forge_db::models::{IngredientRow, RecipeRow};
use forge_types::api::{
    CreateRecipeRequest, RecipeListResponse, RecipeMatch, RecipeResponse, SearchRequest,
    SearchResponse, ToggleResponse,
};
use forge_types::matcher;

use crate::convert::recipe_model;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// At most five suggestions per search.
const SEARCH_LIMIT: usize = 5;

const DIFFICULTIES: [&str; 3] = ["easy", "medium", "hard"];

/// The ingredient matcher: tokenize the user's list, run the overlap
/// query, and split each hit into matched/needed for display.
pub async fn search(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    Json(req): Json<SearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tokens = matcher::tokenize(&req.ingredients);

    // Nothing to match; answer without touching the database.
    if tokens.is_empty() {
        return Ok(Json(SearchResponse {
            success: true,
            recipes: vec![],
        }));
    }

    let db = state.clone();
    let query_tokens = tokens.clone();
    let results = tokio::task::spawn_blocking(move || {
        db.db.search_recipes_by_ingredients(&query_tokens, SEARCH_LIMIT)
    })
    .await??;

    let recipes = results
        .into_iter()
        .map(|(row, ingredients)| {
            let names: Vec<String> = ingredients
                .iter()
                .map(|i| i.ingredient_name.clone())
                .collect();
            let (matched, needed) = matcher::partition(&names, &tokens);
            RecipeMatch {
                recipe: recipe_model(row, ingredients, &state.media_base),
                matched,
                needed,
            }
        })
        .collect();

    Ok(Json(SearchResponse {
        success: true,
        recipes,
    }))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let (rows, ingredients) = tokio::task::spawn_blocking(move || {
        let rows = db.db.list_recipes()?;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let ingredients = db.db.ingredients_for_recipes(&ids)?;
        Ok::<_, anyhow::Error>((rows, ingredients))
    })
    .await??;

    Ok(Json(RecipeListResponse {
        success: true,
        recipes: assemble(rows, ingredients, &state.media_base),
    }))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let lookup = id.to_string();
    let (row, ingredients) = tokio::task::spawn_blocking(move || {
        let Some(row) = db.db.get_recipe(&lookup)? else {
            return Ok(None);
        };
        let ingredients = db.db.ingredients_for_recipes(&[lookup])?;
        Ok::<_, anyhow::Error>(Some((row, ingredients)))
    })
    .await??
    .ok_or(ApiError::NotFound("recipe"))?;

    Ok(Json(RecipeResponse {
        success: true,
        recipe: recipe_model(row, ingredients, &state.media_base),
    }))
}

/// Admins curate the catalog; everyone else reads it.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateRecipeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if user.role != "admin" {
        return Err(ApiError::Forbidden);
    }

    if req.title.trim().is_empty() {
        return Err(ApiError::validation("title must not be empty"));
    }
    if req.instructions.trim().is_empty() {
        return Err(ApiError::validation("instructions must not be empty"));
    }
    if req.ingredients.is_empty() {
        return Err(ApiError::validation("at least one ingredient is required"));
    }
    if !DIFFICULTIES.contains(&req.difficulty.as_str()) {
        return Err(ApiError::validation("difficulty must be easy, medium or hard"));
    }
    if req.servings == 0 || req.time_minutes == 0 {
        return Err(ApiError::validation("servings and time must be positive"));
    }

    let row = RecipeRow {
        id: Uuid::new_v4().to_string(),
        title: req.title.trim().to_string(),
        instructions: req.instructions.trim().to_string(),
        time_minutes: req.time_minutes as i64,
        difficulty: req.difficulty,
        servings: req.servings as i64,
        image_url: req.image_url,
        video_url: req.video_url,
        created_at: String::new(),
    };
    let pairs: Vec<(String, String)> = req
        .ingredients
        .into_iter()
        .map(|i| (i.name.trim().to_lowercase(), i.quantity))
        .collect();

    let db = state.clone();
    let id = row.id.clone();
    let (stored, ingredients) = tokio::task::spawn_blocking(move || {
        db.db.insert_recipe(&row, &pairs)?;
        let stored = db.db.get_recipe(&id)?;
        let ingredients = db.db.ingredients_for_recipes(&[id])?;
        Ok::<_, anyhow::Error>((stored, ingredients))
    })
    .await??;

    let stored = stored.ok_or(ApiError::NotFound("recipe"))?;

    Ok((
        StatusCode::CREATED,
        Json(RecipeResponse {
            success: true,
            recipe: recipe_model(stored, ingredients, &state.media_base),
        }),
    ))
}

/// Bookmark toggle: first call saves, second unsaves.
pub async fn toggle_save(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let recipe_id = id.to_string();
    let user_id = user.id.to_string();
    let saved = tokio::task::spawn_blocking(move || {
        if db.db.get_recipe(&recipe_id)?.is_none() {
            return Ok(None);
        }
        db.db.toggle_saved_recipe(&user_id, &recipe_id).map(Some)
    })
    .await??
    .ok_or(ApiError::NotFound("recipe"))?;

    Ok(Json(ToggleResponse {
        success: true,
        action: if saved { "saved" } else { "unsaved" }.to_string(),
    }))
}

pub async fn saved(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user_id = user.id.to_string();
    let (rows, ingredients) = tokio::task::spawn_blocking(move || {
        let rows = db.db.saved_recipes(&user_id)?;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let ingredients = db.db.ingredients_for_recipes(&ids)?;
        Ok::<_, anyhow::Error>((rows, ingredients))
    })
    .await??;

    Ok(Json(RecipeListResponse {
        success: true,
        recipes: assemble(rows, ingredients, &state.media_base),
    }))
}

/// Stitch recipe rows and their batch-fetched ingredients back together,
/// preserving the row order.
pub(crate) fn assemble(
    rows: Vec<RecipeRow>,
    ingredients: Vec<IngredientRow>,
    media_base: &str,
) -> Vec<forge_types::models::Recipe> {
    let mut by_recipe: HashMap<String, Vec<IngredientRow>> = HashMap::new();
    for ingredient in ingredients {
        by_recipe
            .entry(ingredient.recipe_id.clone())
            .or_default()
            .push(ingredient);
    }

    rows.into_iter()
        .map(|row| {
            let own = by_recipe.remove(&row.id).unwrap_or_default();
            recipe_model(row, own, media_base)
        })
        .collect()
}
