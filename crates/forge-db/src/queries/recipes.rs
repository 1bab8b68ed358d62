use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::Database;
use crate::models::{IngredientRow, RecipeRow};

const RECIPE_COLS: &str = "id, title, instructions, time_minutes, difficulty, servings, \
                           image_url, video_url, created_at";

pub(crate) fn recipe_from_row(row: &Row<'_>) -> rusqlite::Result<RecipeRow> {
    Ok(RecipeRow {
        id: row.get(0)?,
        title: row.get(1)?,
        instructions: row.get(2)?,
        time_minutes: row.get(3)?,
        difficulty: row.get(4)?,
        servings: row.get(5)?,
        image_url: row.get(6)?,
        video_url: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub(crate) fn query_recipe(conn: &Connection, id: &str) -> Result<Option<RecipeRow>> {
    let sql = format!("SELECT {RECIPE_COLS} FROM recipes WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([id], recipe_from_row).optional()?;
    Ok(row)
}

impl Database {
    pub fn insert_recipe(&self, recipe: &RecipeRow, ingredients: &[(String, String)]) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO recipes (id, title, instructions, time_minutes, difficulty, servings, image_url, video_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    recipe.id,
                    recipe.title,
                    recipe.instructions,
                    recipe.time_minutes,
                    recipe.difficulty,
                    recipe.servings,
                    recipe.image_url,
                    recipe.video_url,
                ],
            )?;
            for (name, quantity) in ingredients {
                conn.execute(
                    "INSERT INTO recipe_ingredients (recipe_id, ingredient_name, quantity)
                     VALUES (?1, ?2, ?3)",
                    rusqlite::params![recipe.id, name, quantity],
                )?;
            }
            Ok(())
        })
    }

    pub fn get_recipe(&self, id: &str) -> Result<Option<RecipeRow>> {
        self.with_conn(|conn| query_recipe(conn, id))
    }

    pub fn list_recipes(&self) -> Result<Vec<RecipeRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {RECIPE_COLS} FROM recipes ORDER BY title");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], recipe_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Batch-fetch recipes by id; order follows the database, not `ids`.
    pub fn recipes_by_ids(&self, ids: &[String]) -> Result<Vec<RecipeRow>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT {RECIPE_COLS} FROM recipes WHERE id IN ({})",
                placeholders.join(", ")
            );
            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();
            let rows = stmt
                .query_map(params.as_slice(), recipe_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Batch-fetch ingredients for a set of recipe IDs.
    pub fn ingredients_for_recipes(&self, recipe_ids: &[String]) -> Result<Vec<IngredientRow>> {
        if recipe_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=recipe_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT id, recipe_id, ingredient_name, quantity
                 FROM recipe_ingredients
                 WHERE recipe_id IN ({})
                 ORDER BY id",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = recipe_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(IngredientRow {
                        id: row.get(0)?,
                        recipe_id: row.get(1)?,
                        ingredient_name: row.get(2)?,
                        quantity: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Toggle a bookmark: removes if saved, inserts if not.
    /// Returns true when the recipe was saved.
    pub fn toggle_saved_recipe(&self, user_id: &str, recipe_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT rowid FROM saved_recipes WHERE user_id = ?1 AND recipe_id = ?2",
                    rusqlite::params![user_id, recipe_id],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(rowid) = existing {
                conn.execute("DELETE FROM saved_recipes WHERE rowid = ?1", [rowid])?;
                Ok(false)
            } else {
                conn.execute(
                    "INSERT INTO saved_recipes (user_id, recipe_id) VALUES (?1, ?2)",
                    rusqlite::params![user_id, recipe_id],
                )?;
                Ok(true)
            }
        })
    }

    /// The user's bookmarks, most recently saved first.
    pub fn saved_recipes(&self, user_id: &str) -> Result<Vec<RecipeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.title, r.instructions, r.time_minutes, r.difficulty, r.servings,
                        r.image_url, r.video_url, r.created_at
                 FROM saved_recipes sr
                 JOIN recipes r ON r.id = sr.recipe_id
                 WHERE sr.user_id = ?1
                 ORDER BY sr.created_at DESC, sr.rowid DESC",
            )?;
            let rows = stmt
                .query_map([user_id], recipe_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::queries::users::tests::seed_user;
    use crate::test_db;
    use uuid::Uuid;

    /// Insert a recipe with the given ingredient names and return its id.
    pub(crate) fn seed_recipe(db: &Database, title: &str, ingredients: &[&str]) -> String {
        let id = Uuid::new_v4().to_string();
        let recipe = RecipeRow {
            id: id.clone(),
            title: title.to_string(),
            instructions: "Combine and cook.".to_string(),
            time_minutes: 30,
            difficulty: "easy".to_string(),
            servings: 2,
            image_url: None,
            video_url: None,
            created_at: String::new(),
        };
        let pairs: Vec<(String, String)> = ingredients
            .iter()
            .map(|name| (name.to_string(), "1".to_string()))
            .collect();
        db.insert_recipe(&recipe, &pairs).expect("insert recipe");
        id
    }

    #[test]
    fn insert_and_fetch_with_ingredients() {
        let db = test_db();
        let id = seed_recipe(&db, "Garlic Chicken", &["chicken", "garlic", "soy sauce"]);

        let recipe = db.get_recipe(&id).unwrap().unwrap();
        assert_eq!(recipe.title, "Garlic Chicken");

        let ingredients = db.ingredients_for_recipes(&[id.clone()]).unwrap();
        let names: Vec<_> = ingredients
            .iter()
            .map(|i| i.ingredient_name.as_str())
            .collect();
        assert_eq!(names, vec!["chicken", "garlic", "soy sauce"]);
    }

    #[test]
    fn batch_ingredient_fetch_spans_recipes() {
        let db = test_db();
        let a = seed_recipe(&db, "A", &["chicken", "garlic"]);
        let b = seed_recipe(&db, "B", &["tofu"]);
        seed_recipe(&db, "C", &["beef"]);

        let rows = db
            .ingredients_for_recipes(&[a.clone(), b.clone()])
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.recipe_id == a || r.recipe_id == b));

        assert!(db.ingredients_for_recipes(&[]).unwrap().is_empty());
    }

    #[test]
    fn save_toggles_on_and_off() {
        let db = test_db();
        let user = seed_user(&db, "alice");
        let recipe = seed_recipe(&db, "Soup", &["lentils"]);

        // First call saves, second unsaves.
        assert!(db.toggle_saved_recipe(&user, &recipe).unwrap());
        assert!(!db.toggle_saved_recipe(&user, &recipe).unwrap());
        assert!(db.saved_recipes(&user).unwrap().is_empty());

        // Saving again works after an unsave.
        assert!(db.toggle_saved_recipe(&user, &recipe).unwrap());
        let saved = db.saved_recipes(&user).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, recipe);
    }

    #[test]
    fn saved_list_is_per_user() {
        let db = test_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let recipe = seed_recipe(&db, "Soup", &["lentils"]);

        db.toggle_saved_recipe(&alice, &recipe).unwrap();
        assert_eq!(db.saved_recipes(&alice).unwrap().len(), 1);
        assert!(db.saved_recipes(&bob).unwrap().is_empty());
    }
}
