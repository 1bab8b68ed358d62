use anyhow::Result;

use crate::Database;
use crate::models::MealPlanRow;

impl Database {
    /// Fill a meal slot. An occupied (day, meal type, week) slot is updated
    /// to the new recipe; the UNIQUE slot key rules out duplicates.
    pub fn upsert_meal_slot(
        &self,
        id: &str,
        user_id: &str,
        recipe_id: &str,
        day_of_week: &str,
        meal_type: &str,
        week_start_date: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO meal_plans (id, user_id, recipe_id, day_of_week, meal_type, week_start_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(user_id, week_start_date, day_of_week, meal_type)
                 DO UPDATE SET recipe_id = excluded.recipe_id",
                rusqlite::params![id, user_id, recipe_id, day_of_week, meal_type, week_start_date],
            )?;
            Ok(())
        })
    }

    /// Clear a slot. Returns true when a row was removed.
    pub fn remove_meal_slot(
        &self,
        user_id: &str,
        day_of_week: &str,
        meal_type: &str,
        week_start_date: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM meal_plans
                 WHERE user_id = ?1 AND day_of_week = ?2 AND meal_type = ?3 AND week_start_date = ?4",
                rusqlite::params![user_id, day_of_week, meal_type, week_start_date],
            )?;
            Ok(removed > 0)
        })
    }

    pub fn meal_slots_for_week(
        &self,
        user_id: &str,
        week_start_date: &str,
    ) -> Result<Vec<MealPlanRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, recipe_id, day_of_week, meal_type, week_start_date
                 FROM meal_plans
                 WHERE user_id = ?1 AND week_start_date = ?2
                 ORDER BY day_of_week, meal_type",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, week_start_date], |row| {
                    Ok(MealPlanRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        recipe_id: row.get(2)?,
                        day_of_week: row.get(3)?,
                        meal_type: row.get(4)?,
                        week_start_date: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::queries::recipes::tests::seed_recipe;
    use crate::queries::users::tests::seed_user;
    use crate::test_db;
    use uuid::Uuid;

    const WEEK: &str = "2026-08-03";

    #[test]
    fn occupied_slot_updates_instead_of_duplicating() {
        let db = test_db();
        let user = seed_user(&db, "alice");
        let soup = seed_recipe(&db, "Soup", &["lentils"]);
        let pasta = seed_recipe(&db, "Pasta", &["spaghetti"]);

        db.upsert_meal_slot(
            &Uuid::new_v4().to_string(),
            &user,
            &soup,
            "monday",
            "dinner",
            WEEK,
        )
        .unwrap();
        db.upsert_meal_slot(
            &Uuid::new_v4().to_string(),
            &user,
            &pasta,
            "monday",
            "dinner",
            WEEK,
        )
        .unwrap();

        let slots = db.meal_slots_for_week(&user, WEEK).unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].recipe_id, pasta);
    }

    #[test]
    fn distinct_slots_coexist() {
        let db = test_db();
        let user = seed_user(&db, "alice");
        let soup = seed_recipe(&db, "Soup", &["lentils"]);

        for (day, meal) in [
            ("monday", "breakfast"),
            ("monday", "dinner"),
            ("tuesday", "dinner"),
        ] {
            db.upsert_meal_slot(&Uuid::new_v4().to_string(), &user, &soup, day, meal, WEEK)
                .unwrap();
        }

        assert_eq!(db.meal_slots_for_week(&user, WEEK).unwrap().len(), 3);
        // A different week is a different plan.
        assert!(db.meal_slots_for_week(&user, "2026-08-10").unwrap().is_empty());
    }

    #[test]
    fn remove_clears_the_slot() {
        let db = test_db();
        let user = seed_user(&db, "alice");
        let soup = seed_recipe(&db, "Soup", &["lentils"]);

        db.upsert_meal_slot(
            &Uuid::new_v4().to_string(),
            &user,
            &soup,
            "friday",
            "lunch",
            WEEK,
        )
        .unwrap();

        assert!(db.remove_meal_slot(&user, "friday", "lunch", WEEK).unwrap());
        assert!(!db.remove_meal_slot(&user, "friday", "lunch", WEEK).unwrap());
        assert!(db.meal_slots_for_week(&user, WEEK).unwrap().is_empty());
    }
}
