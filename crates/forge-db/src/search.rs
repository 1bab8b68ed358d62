//! The ingredient-overlap search behind the recipe suggester.
//!
//! The SQL stage counts exact (case-insensitive) name overlaps per recipe;
//! qualification and ranking apply the shared rule from
//! [`forge_types::matcher`], so the thresholds live in one place.

use std::collections::HashMap;

use anyhow::Result;
use forge_types::matcher;

use crate::Database;
use crate::models::{IngredientRow, RecipeRow};
use crate::queries::recipes::query_recipe;

/// Per-recipe overlap counts straight out of the database.
pub struct MatchCandidate {
    pub recipe_id: String,
    pub matched: usize,
    pub total: usize,
}

impl Database {
    /// Every recipe sharing at least one ingredient with the tokens,
    /// ordered by overlap descending. Tokens are expected to be normalized
    /// already (see `matcher::tokenize`).
    pub fn match_candidates(&self, tokens: &[String]) -> Result<Vec<MatchCandidate>> {
        if tokens.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=tokens.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT r.id,
                        COUNT(DISTINCT lower(ri.ingredient_name)) AS matched,
                        (SELECT COUNT(*) FROM recipe_ingredients t WHERE t.recipe_id = r.id) AS total
                 FROM recipes r
                 JOIN recipe_ingredients ri ON ri.recipe_id = r.id
                 WHERE lower(ri.ingredient_name) IN ({})
                 GROUP BY r.id
                 ORDER BY matched DESC",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = tokens
                .iter()
                .map(|t| t as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(MatchCandidate {
                        recipe_id: row.get(0)?,
                        matched: row.get::<_, i64>(1)? as usize,
                        total: row.get::<_, i64>(2)? as usize,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Qualified matches with their ingredients, best overlap first,
    /// capped at `limit`. Ties keep the database's row order.
    pub fn search_recipes_by_ingredients(
        &self,
        tokens: &[String],
        limit: usize,
    ) -> Result<Vec<(RecipeRow, Vec<IngredientRow>)>> {
        let mut candidates: Vec<MatchCandidate> = self
            .match_candidates(tokens)?
            .into_iter()
            .filter(|c| matcher::qualifies(c.matched, c.total))
            .collect();
        candidates.truncate(limit);

        let ids: Vec<String> = candidates.iter().map(|c| c.recipe_id.clone()).collect();

        // Group ingredients by recipe before stitching results together.
        let mut by_recipe: HashMap<String, Vec<IngredientRow>> = HashMap::new();
        for ingredient in self.ingredients_for_recipes(&ids)? {
            by_recipe
                .entry(ingredient.recipe_id.clone())
                .or_default()
                .push(ingredient);
        }

        let mut out = Vec::with_capacity(candidates.len());
        self.with_conn(|conn| {
            for candidate in &candidates {
                if let Some(recipe) = query_recipe(conn, &candidate.recipe_id)? {
                    let own = by_recipe.remove(&candidate.recipe_id).unwrap_or_default();
                    out.push((recipe, own));
                }
            }
            Ok(())
        })?;

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::recipes::tests::seed_recipe;
    use crate::test_db;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn three_shared_ingredients_qualify() {
        let db = test_db();
        seed_recipe(
            &db,
            "Garlic Chicken",
            &["chicken", "garlic", "soy sauce", "vinegar", "onion"],
        );

        let results = db
            .search_recipes_by_ingredients(&tokens(&["chicken", "garlic", "soy sauce"]), 5)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.title, "Garlic Chicken");
        assert_eq!(results[0].1.len(), 5);
    }

    #[test]
    fn weak_overlap_fails_both_clauses() {
        let db = test_db();
        seed_recipe(
            &db,
            "Big Stew",
            &[
                "beef", "potato", "carrot", "onion", "celery", "thyme", "bay leaf", "stock",
                "flour", "butter",
            ],
        );

        // 2 of 10 matched: under the absolute floor and at 20% coverage.
        let results = db
            .search_recipes_by_ingredients(&tokens(&["beef", "potato"]), 5)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn half_coverage_qualifies_small_recipes() {
        let db = test_db();
        seed_recipe(&db, "Omelette", &["eggs", "cheese"]);

        let results = db
            .search_recipes_by_ingredients(&tokens(&["eggs"]), 5)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.title, "Omelette");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let db = test_db();
        seed_recipe(&db, "Omelette", &["Eggs", "Cheese"]);

        // Tokens arrive lower-cased from the tokenizer; stored names may
        // be capitalized.
        let results = db
            .search_recipes_by_ingredients(&tokens(&["eggs", "cheese"]), 5)
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn results_rank_by_overlap_and_honor_the_limit() {
        let db = test_db();
        seed_recipe(&db, "Two Hits", &["chicken", "garlic", "rice", "peas"]);
        seed_recipe(
            &db,
            "Three Hits",
            &["chicken", "garlic", "soy sauce", "rice", "peas", "corn"],
        );
        for i in 0..6 {
            seed_recipe(
                &db,
                &format!("Filler {i}"),
                &["chicken", "garlic", "soy sauce"],
            );
        }

        let results = db
            .search_recipes_by_ingredients(&tokens(&["chicken", "garlic", "soy sauce"]), 5)
            .unwrap();
        assert_eq!(results.len(), 5);
        // 3-hit recipes outrank the 2-hit one, which falls off the page.
        assert!(results.iter().all(|(r, _)| r.title != "Two Hits"));
    }

    #[test]
    fn empty_tokens_skip_the_database() {
        let db = test_db();
        assert!(db.match_candidates(&[]).unwrap().is_empty());
        assert!(db.search_recipes_by_ingredients(&[], 5).unwrap().is_empty());
    }
}
