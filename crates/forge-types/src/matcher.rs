//! The ingredient overlap rule, defined once and shared by every caller.
//!
//! A recipe qualifies for a search when it shares at least
//! [`MIN_SHARED_INGREDIENTS`] ingredients with the user's list, or when at
//! least [`MIN_MATCH_RATIO`] of the recipe's own ingredients appear in the
//! list. Qualification uses exact (case-insensitive) name matches; the
//! matched/needed split shown to the user is looser and matches substrings,
//! so the recipe ingredient "chicken breast" counts as matched for the
//! token "chicken".

pub const MIN_SHARED_INGREDIENTS: usize = 3;
pub const MIN_MATCH_RATIO: f64 = 0.5;

/// Normalize raw user input into search tokens: split on commas, trim,
/// lower-case, drop empties, de-duplicate. First-seen order is kept.
pub fn tokenize(raw: &[String]) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for entry in raw {
        for part in entry.split(',') {
            let token = part.trim().to_lowercase();
            if !token.is_empty() && !tokens.contains(&token) {
                tokens.push(token);
            }
        }
    }
    tokens
}

pub fn qualifies(matched: usize, recipe_total: usize) -> bool {
    if matched == 0 || recipe_total == 0 {
        return false;
    }
    matched >= MIN_SHARED_INGREDIENTS
        || matched as f64 / recipe_total as f64 >= MIN_MATCH_RATIO
}

/// Split a recipe's ingredient names into (matched, needed) against the
/// user's tokens, by case-insensitive substring match in either direction.
pub fn partition(ingredient_names: &[String], tokens: &[String]) -> (Vec<String>, Vec<String>) {
    let mut matched = Vec::new();
    let mut needed = Vec::new();
    for name in ingredient_names {
        let lowered = name.to_lowercase();
        let hit = tokens
            .iter()
            .any(|t| lowered.contains(t.as_str()) || t.contains(lowered.as_str()));
        if hit {
            matched.push(name.clone());
        } else {
            needed.push(name.clone());
        }
    }
    (matched, needed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn tokenize_trims_lowercases_and_dedupes() {
        let raw = strings(&[" Chicken ", "GARLIC, soy sauce", "chicken", "", "  "]);
        assert_eq!(tokenize(&raw), strings(&["chicken", "garlic", "soy sauce"]));
    }

    #[test]
    fn tokenize_empty_input_yields_no_tokens() {
        assert!(tokenize(&[]).is_empty());
        assert!(tokenize(&strings(&["", " , ,"])).is_empty());
    }

    #[test]
    fn three_of_five_qualifies_by_both_clauses() {
        // 3 matched also clears the 60% ratio; either clause alone suffices.
        assert!(qualifies(3, 5));
    }

    #[test]
    fn two_of_ten_fails_both_clauses() {
        assert!(!qualifies(2, 10));
    }

    #[test]
    fn three_matched_qualifies_regardless_of_recipe_size() {
        assert!(qualifies(3, 40));
    }

    #[test]
    fn exactly_half_qualifies_by_ratio() {
        assert!(qualifies(1, 2));
        assert!(qualifies(2, 4));
    }

    #[test]
    fn zero_matched_never_qualifies() {
        assert!(!qualifies(0, 4));
        assert!(!qualifies(0, 0));
    }

    #[test]
    fn partition_matches_substrings() {
        let names = strings(&["Chicken breast", "Garlic", "Vinegar"]);
        let tokens = strings(&["chicken", "garlic"]);
        let (matched, needed) = partition(&names, &tokens);
        assert_eq!(matched, strings(&["Chicken breast", "Garlic"]));
        assert_eq!(needed, strings(&["Vinegar"]));
    }

    #[test]
    fn partition_matches_token_containing_ingredient() {
        // User typed the longer form; the bare ingredient still matches.
        let names = strings(&["Soy"]);
        let tokens = strings(&["soy sauce"]);
        let (matched, needed) = partition(&names, &tokens);
        assert_eq!(matched, strings(&["Soy"]));
        assert!(needed.is_empty());
    }
}
