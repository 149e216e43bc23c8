//! Rule based dish ranking.
//!
//! Preferred cuisines narrow the catalog first. Dietary type and spice
//! level only filter when no cuisine preference can be honoured, and
//! otherwise feed the score. Filters are relaxed step by step until
//! something can be recommended.

use std::collections::{HashMap, HashSet};

use super::{
    entity::{user::Preferences, Dish, Entity},
    geo::Coordinates,
    pricing,
};

pub const NEARBY_RADIUS_KM: f64 = 20.0;
/// Candidates kept per requested recommendation before scoring.
pub const CANDIDATE_FACTOR: usize = 5;

const CUISINE_GROUPS: &[(&str, &[&str])] = &[
    (
        "south indian",
        &[
            "south indian", "south", "tamil", "telugu", "kannada", "malayalam", "kerala",
            "kerala cuisine", "andhra", "andhra pradesh", "dosa", "idli", "sambar", "rasam",
        ],
    ),
    (
        "north indian",
        &[
            "north indian", "north", "punjabi", "delhi", "rajasthani", "gujarati", "uttar pradesh",
            "haryana", "himachal",
        ],
    ),
    ("bengali", &["bengali", "bengal", "kolkata", "west bengal"]),
    ("gujarati", &["gujarati", "gujarat"]),
    ("maharashtrian", &["maharashtrian", "maharashtra", "marathi", "pune", "mumbai"]),
    ("punjabi", &["punjabi", "punjab"]),
    ("rajasthani", &["rajasthani", "rajasthan"]),
    ("kerala", &["kerala", "kerala cuisine", "malayalam", "kerala food"]),
];

const NOISE_WORDS: &[&str] = &["indian", "cuisine", "food", "style", "cooking"];
const DAIRY_WORDS: &[&str] = &["dairy", "milk", "cream", "butter", "cheese", "yogurt", "curd"];
const JAIN_AVOID_WORDS: &[&str] = &["onion", "garlic", "root", "potato", "ginger"];

fn cuisine_group(cuisine: &str) -> Option<&'static str> {
    CUISINE_GROUPS
        .iter()
        .find(|(_, variants)| variants.iter().any(|variant| cuisine.contains(variant)))
        .map(|(group, _)| *group)
}

fn meaningful_words(cuisine: &str) -> HashSet<&str> {
    cuisine
        .split_whitespace()
        .filter(|word| !NOISE_WORDS.contains(word))
        .collect()
}

/// Whether a preferred cuisine matches a kitchen specialty.
///
/// North and south Indian never match each other, whatever else they
/// share.
pub fn cuisine_matches(preferred: &str, specialty: &str) -> bool {
    let preferred = preferred.trim().to_lowercase();
    let specialty = specialty.trim().to_lowercase();
    if preferred.is_empty() || specialty.is_empty() {
        return false;
    }

    let conflict = (preferred.contains("north") && specialty.contains("south"))
        || (preferred.contains("south") && specialty.contains("north"));
    if conflict {
        return false;
    }

    if let (Some(a), Some(b)) = (cuisine_group(&preferred), cuisine_group(&specialty)) {
        if a == b {
            return true;
        }
    }

    if preferred == specialty || specialty.contains(&preferred) || preferred.contains(&specialty) {
        return true;
    }

    let preferred_words = meaningful_words(&preferred);
    let specialty_words = meaningful_words(&specialty);
    let common = preferred_words.intersection(&specialty_words).count();
    common > 0 && common as f64 >= preferred_words.len().min(specialty_words.len()) as f64 * 0.5
}

/// What the ranking needs to know about a kitchen.
#[derive(Debug, Clone, PartialEq)]
pub struct Kitchen {
    pub cuisine: Option<String>,
    pub coordinates: Option<Coordinates>,
    /// Approved and active.
    pub trading: bool,
}

/// Past behaviour of the customer.
#[derive(Debug, Clone, Default)]
pub struct History {
    pub ordered_dishes: HashSet<i64>,
    pub ordered_producers: HashSet<i64>,
    /// Dishes the customer rated 4 or more.
    pub liked_dishes: HashSet<i64>,
}

pub struct Recommender<'a> {
    preferences: &'a Preferences,
    history: &'a History,
    kitchens: &'a HashMap<i64, Kitchen>,
    cuisines: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Filters {
    cuisine: bool,
    dietary: bool,
    spice: bool,
}

impl<'a> Recommender<'a> {
    pub fn new(preferences: &'a Preferences, history: &'a History, kitchens: &'a HashMap<i64, Kitchen>) -> Self {
        Self {
            preferences,
            history,
            kitchens,
            cuisines: preferences.preferred_cuisines(),
        }
    }

    fn matches_cuisine(&self, producer_id: i64) -> Option<bool> {
        if self.cuisines.is_empty() {
            return None;
        }
        let specialty = self.kitchens.get(&producer_id)?.cuisine.as_deref()?;
        Some(self.cuisines.iter().any(|cuisine| cuisine_matches(cuisine, specialty)))
    }

    fn keep_dietary(&self, dish: &Dish) -> bool {
        self.preferences.dietary_preferences.is_none()
            || dish.state.dietary_type == self.preferences.dietary_preferences
    }

    fn keep_spice(&self, dish: &Dish) -> bool {
        self.preferences.spice_level.is_none() || dish.state.spice_level == self.preferences.spice_level
    }

    /// Rank `available` dishes, best first.
    pub fn recommend(&self, available: Vec<Dish>, origin: Option<Coordinates>, limit: usize) -> Vec<Dish> {
        let mut filters = Filters::default();
        let trading = || self.kitchens.iter().filter(|(_, kitchen)| kitchen.trading);

        let nearby: Option<HashSet<i64>> = origin
            .map(|origin| {
                trading()
                    .filter(|(_, kitchen)| {
                        kitchen
                            .coordinates
                            .map_or(false, |at| origin.distance_km(&at) <= NEARBY_RADIUS_KM)
                    })
                    .map(|(id, _)| *id)
                    .collect::<HashSet<i64>>()
            })
            .filter(|nearby| !nearby.is_empty());

        let mut cuisine_kitchens = HashSet::new();
        if !self.cuisines.is_empty() {
            cuisine_kitchens = trading()
                .filter(|(id, _)| self.matches_cuisine(**id) == Some(true))
                .map(|(id, _)| *id)
                .collect();
            tracing::debug!(cuisines = ?self.cuisines, matched = cuisine_kitchens.len(), "cuisine filter");
        }
        if !cuisine_kitchens.is_empty() {
            filters.cuisine = true;
        } else {
            filters.dietary = self.preferences.dietary_preferences.is_some();
            filters.spice = self.preferences.spice_level.is_some();
        }

        let mut candidates = self.candidates(&available, limit, |dish| {
            nearby.as_ref().map_or(true, |ids| ids.contains(&dish.producer_id()))
                && (!filters.cuisine || cuisine_kitchens.contains(&dish.producer_id()))
                && (!filters.dietary || self.keep_dietary(dish))
                && (!filters.spice || self.keep_spice(dish))
        });

        if candidates.is_empty() && filters.cuisine {
            filters.cuisine = false;
            filters.dietary = self.preferences.dietary_preferences.is_some();
            filters.spice = self.preferences.spice_level.is_some();
            candidates = self.candidates(&available, limit, |dish| {
                (!filters.dietary || self.keep_dietary(dish)) && (!filters.spice || self.keep_spice(dish))
            });
        }
        if candidates.is_empty() && filters.spice {
            filters.spice = false;
            candidates = self.candidates(&available, limit, |dish| !filters.dietary || self.keep_dietary(dish));
        }
        if candidates.is_empty() {
            filters.dietary = false;
            candidates = self.candidates(&available, limit, |_| true);
        }
        tracing::debug!(candidates = candidates.len(), ?filters, "scoring candidates");

        let mut scored: Vec<(Dish, f64, bool)> = candidates
            .into_iter()
            .filter_map(|dish| {
                let cuisine_match = self.matches_cuisine(dish.producer_id());
                let score = self.score(&dish, cuisine_match, filters.cuisine);
                match cuisine_match {
                    Some(true) => Some((dish, score.max(20.0), true)),
                    _ if score > -30.0 => Some((dish, score, false)),
                    _ => None,
                }
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        if self.cuisines.is_empty() {
            return scored.into_iter().take(limit).map(|(dish, ..)| dish).collect();
        }

        let (matched, others): (Vec<_>, Vec<_>) = scored.into_iter().partition(|(.., matched)| *matched);
        matched
            .into_iter()
            .chain(others)
            .take(limit)
            .map(|(dish, ..)| dish)
            .collect()
    }

    fn candidates<F>(&self, available: &[Dish], limit: usize, keep: F) -> Vec<Dish>
    where
        F: Fn(&Dish) -> bool,
    {
        let mut dishes: Vec<Dish> = available.iter().filter(|dish| keep(dish)).cloned().collect();
        dishes.sort_by(|a, b| {
            b.state
                .average_rating
                .total_cmp(&a.state.average_rating)
                .then(b.state.order_count.cmp(&a.state.order_count))
                .then(b.state.view_count.cmp(&a.state.view_count))
        });
        dishes.truncate(limit.saturating_mul(CANDIDATE_FACTOR));
        dishes
    }

    fn score(&self, dish: &Dish, cuisine_match: Option<bool>, cuisine_filtered: bool) -> f64 {
        let prefs = self.preferences;
        let dish_state = &dish.state;
        let matched = cuisine_match == Some(true);
        let emphasised = matched || cuisine_filtered;
        let mut score = match cuisine_match {
            Some(true) => 40.0,
            Some(false) => -20.0,
            None => 0.0,
        };

        score += dish_state.average_rating * 10.0;
        score += (dish_state.order_count as f64 * 0.1).min(20.0);
        score += (dish_state.view_count as f64 * 0.01).min(10.0);

        if self.history.ordered_producers.contains(&dish.producer_id()) {
            score += 25.0;
        }
        if self.history.liked_dishes.contains(&dish.ident()) {
            score += 50.0;
        }
        if !self.history.ordered_dishes.contains(&dish.ident()) {
            score += 5.0;
        }

        if let (Some(wanted), Some(actual)) = (prefs.dietary_preferences, dish_state.dietary_type) {
            score += match (wanted == actual, matched, cuisine_filtered) {
                (true, ..) if emphasised => 20.0,
                (true, ..) => 15.0,
                (false, true, _) => -5.0,
                (false, false, true) => -10.0,
                (false, false, false) => -15.0,
            };
        }

        if let (Some(wanted), Some(actual)) = (prefs.spice_level, dish_state.spice_level) {
            score += match (wanted == actual, matched) {
                (true, _) if emphasised => 15.0,
                (true, _) => 12.0,
                (false, true) => -2.0,
                (false, false) => -5.0,
            };
        }

        let meals = prefs.meal_preferences();
        if let Some(category) = dish_state.category.as_deref().filter(|c| !c.is_empty()) {
            if !meals.is_empty() {
                let category = category.to_lowercase();
                let meal_match = meals.iter().any(|meal| {
                    let meal = meal.to_lowercase();
                    category.contains(&meal) || meal.contains(&category)
                });
                score += if meal_match { 15.0 } else { -5.0 };
            }
        }

        if let Some(budget) = prefs.budget_preference {
            score += budget_score(budget, dish_price_gbp(dish));
        }

        let restrictions: Vec<String> = prefs
            .dietary_restrictions()
            .iter()
            .map(|r| r.to_lowercase())
            .collect();
        if !restrictions.is_empty() {
            score += restriction_penalty(&restrictions, dish);
        }

        let dish_allergens: Vec<String> = dish.allergens().iter().map(|a| a.to_lowercase()).collect();
        for allergen in prefs.allergens() {
            let allergen = allergen.to_lowercase();
            if dish_allergens
                .iter()
                .any(|present| present.contains(&allergen) || allergen.contains(present.as_str()))
            {
                score -= 60.0;
            }
        }

        score
    }
}

/// Unrounded pound price used for budget bands.
fn dish_price_gbp(dish: &Dish) -> f64 {
    if pricing::is_rupees(dish.state.price, dish.state.currency.as_deref()) {
        dish.state.price / pricing::INR_PER_GBP
    } else {
        dish.state.price
    }
}

fn budget_score(budget: crate::domain::datatype::status::BudgetPreference, price: f64) -> f64 {
    use crate::domain::datatype::status::BudgetPreference::*;

    match budget {
        Low if price <= 10.0 => 25.0,
        Low if price > 20.0 => -40.0,
        Medium if price > 10.0 && price <= 20.0 => 25.0,
        High if price > 20.0 => 25.0,
        High if price < 10.0 => -15.0,
        _ => 0.0,
    }
}

fn restriction_penalty(restrictions: &[String], dish: &Dish) -> f64 {
    let text = format!(
        "{} {}",
        dish.state.description.as_deref().unwrap_or_default(),
        dish.state.ingredients.as_deref().unwrap_or_default()
    )
    .to_lowercase();
    let restricted = |name: &str| restrictions.iter().any(|r| r == name);

    let mut penalty = 0.0;
    if restricted("gluten-free") && text.contains("gluten") {
        penalty -= 50.0;
    }
    if restricted("lactose-free") && DAIRY_WORDS.iter().any(|word| text.contains(word)) {
        penalty -= 50.0;
    }
    if restricted("jain") && JAIN_AVOID_WORDS.iter().any(|word| text.contains(word)) {
        penalty -= 50.0;
    }
    penalty
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::domain::{
        datatype::status::{BudgetPreference, DietaryType, SpiceLevel},
        entity::{dish::DishState, EntityData},
    };

    #[test]
    fn north_and_south_never_match() {
        assert!(!cuisine_matches("South Indian", "North Indian"));
        assert!(!cuisine_matches("north indian", "South Indian Tiffin"));
    }

    #[test]
    fn cuisine_groups_and_containment() {
        assert!(cuisine_matches("South Indian", "Tamil Home Cooking"));
        assert!(cuisine_matches("Kerala", "Malayalam food"));
        assert!(cuisine_matches("Bengali", "Kolkata street food"));
        assert!(cuisine_matches("Chinese", "Indo Chinese"));
        assert!(cuisine_matches("Goan Seafood", "Goan curries"));
        assert!(!cuisine_matches("Chinese", "Bengali"));
        assert!(!cuisine_matches("", "Bengali"));
    }

    fn dish(id: i64, producer_id: i64, rating: f64, dietary: DietaryType, spice: SpiceLevel) -> Dish {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut state = DishState::new(producer_id, format!("Dish {id}"), 8.0, today);
        state.currency = Some("GBP".into());
        state.average_rating = rating;
        state.dietary_type = Some(dietary);
        state.spice_level = Some(spice);
        Dish::restore(EntityData::fixture(id), state)
    }

    fn kitchens() -> HashMap<i64, Kitchen> {
        HashMap::from([
            (
                1,
                Kitchen {
                    cuisine: Some("North Indian".into()),
                    coordinates: Some(Coordinates::new(51.5074, -0.1278)),
                    trading: true,
                },
            ),
            (
                2,
                Kitchen {
                    cuisine: Some("South Indian".into()),
                    coordinates: Some(Coordinates::new(53.4808, -2.2426)),
                    trading: true,
                },
            ),
        ])
    }

    fn ids(dishes: &[Dish]) -> Vec<i64> {
        dishes.iter().map(Entity::ident).collect()
    }

    #[test]
    fn preferred_cuisine_comes_first() {
        let preferences = Preferences {
            preferred_cuisines: Some(r#"["South Indian"]"#.into()),
            dietary_preferences: Some(DietaryType::NonVeg),
            ..Preferences::default()
        };
        let history = History::default();
        let kitchens = kitchens();
        let recommender = Recommender::new(&preferences, &history, &kitchens);

        let available = vec![
            dish(1, 1, 5.0, DietaryType::NonVeg, SpiceLevel::Hot),
            dish(2, 2, 3.0, DietaryType::Veg, SpiceLevel::Mild),
            dish(3, 2, 4.0, DietaryType::Veg, SpiceLevel::Mild),
        ];

        assert_eq!(ids(&recommender.recommend(available, None, 10)), vec![3, 2]);
    }

    #[test]
    fn unbounded_limit_keeps_every_candidate() {
        let preferences = Preferences::default();
        let history = History::default();
        let kitchens = kitchens();
        let recommender = Recommender::new(&preferences, &history, &kitchens);

        let available = vec![
            dish(1, 1, 5.0, DietaryType::NonVeg, SpiceLevel::Hot),
            dish(2, 2, 3.0, DietaryType::Veg, SpiceLevel::Mild),
        ];

        assert_eq!(recommender.recommend(available, None, usize::MAX).len(), 2);
    }

    #[test]
    fn dietary_filter_without_cuisine() {
        let preferences = Preferences {
            dietary_preferences: Some(DietaryType::Vegan),
            ..Preferences::default()
        };
        let history = History::default();
        let kitchens = kitchens();
        let recommender = Recommender::new(&preferences, &history, &kitchens);

        let available = vec![
            dish(1, 1, 5.0, DietaryType::NonVeg, SpiceLevel::Hot),
            dish(2, 2, 2.0, DietaryType::Vegan, SpiceLevel::Mild),
        ];
        assert_eq!(ids(&recommender.recommend(available.clone(), None, 10)), vec![2]);

        let non_vegan = vec![available[0].clone()];
        assert_eq!(ids(&recommender.recommend(non_vegan, None, 10)), vec![1]);
    }

    #[test]
    fn location_narrows_when_kitchens_are_close() {
        let preferences = Preferences::default();
        let history = History::default();
        let kitchens = kitchens();
        let recommender = Recommender::new(&preferences, &history, &kitchens);
        let available = vec![
            dish(1, 1, 3.0, DietaryType::Veg, SpiceLevel::Mild),
            dish(2, 2, 5.0, DietaryType::Veg, SpiceLevel::Mild),
        ];

        let london = Some(Coordinates::new(51.51, -0.13));
        assert_eq!(ids(&recommender.recommend(available.clone(), london, 10)), vec![1]);

        let nowhere = Some(Coordinates::new(0.0, 0.0));
        assert_eq!(ids(&recommender.recommend(available, nowhere, 10)), vec![2, 1]);
    }

    #[test]
    fn history_and_allergens_shift_scores() {
        let preferences = Preferences {
            allergens: Some("peanuts".into()),
            ..Preferences::default()
        };
        let history = History {
            liked_dishes: HashSet::from([2]),
            ..History::default()
        };
        let kitchens = kitchens();
        let recommender = Recommender::new(&preferences, &history, &kitchens);

        let mut nutty = dish(1, 1, 5.0, DietaryType::Veg, SpiceLevel::Mild);
        nutty.state.allergens = Some(r#"["Peanuts"]"#.into());
        let liked = dish(2, 1, 1.0, DietaryType::Veg, SpiceLevel::Mild);
        let plain = dish(3, 1, 2.0, DietaryType::Veg, SpiceLevel::Mild);

        assert_eq!(ids(&recommender.recommend(vec![nutty, liked, plain], None, 2)), vec![2, 3]);
    }

    #[test]
    fn budget_bands() {
        assert_eq!(budget_score(BudgetPreference::Low, 8.0), 25.0);
        assert_eq!(budget_score(BudgetPreference::Low, 25.0), -40.0);
        assert_eq!(budget_score(BudgetPreference::Medium, 15.0), 25.0);
        assert_eq!(budget_score(BudgetPreference::High, 5.0), -15.0);
        assert_eq!(budget_score(BudgetPreference::High, 15.0), 0.0);
    }
}
