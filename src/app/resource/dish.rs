use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{present, review::ReviewResponse};
use crate::{
    base::resource_id,
    domain::{
        datatype::status::{DietaryType, SpiceLevel},
        entity::{Dish, Entity, Producer},
        geo::Coordinates,
        pricing,
    },
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDish {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub dietary_type: Option<String>,
    pub spice_level: Option<String>,
    pub allergens: Option<Value>,
    pub ingredients: Option<String>,
    pub max_orders_per_day: Option<i32>,
    pub is_available: Option<bool>,
}

resource_id!(NewDish, "dish::Dish");

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DishPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub category: Option<Option<String>>,
    pub dietary_type: Option<String>,
    pub spice_level: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub allergens: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub ingredients: Option<Option<String>>,
    pub is_available: Option<bool>,
    pub max_orders_per_day: Option<i32>,
    pub display_order: Option<i32>,
}

resource_id!(DishPatch, "dish::Dish");

/// Catalogue search.
#[derive(Debug, Clone, Default)]
pub struct DishQuery {
    pub producer_id: Option<i64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius: Option<f64>,
    pub category: Option<String>,
    pub dietary_type: Option<String>,
    pub spice_level: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Admin listing, unavailable dishes included.
#[derive(Debug, Clone, Default)]
pub struct DishAdminQuery {
    pub status: Option<String>,
    pub producer_id: Option<i64>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Position and size of a popularity or recommendation request.
#[derive(Debug, Clone, Default)]
pub struct LocalQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub limit: Option<usize>,
}

impl LocalQuery {
    pub const DEFAULT_LIMIT: usize = 10;
    pub const MAX_LIMIT: usize = 100;

    pub fn limit(&self) -> usize {
        self.limit
            .filter(|limit| *limit > 0)
            .unwrap_or(Self::DEFAULT_LIMIT)
            .min(Self::MAX_LIMIT)
    }

    /// Zero parts are treated as unknown.
    pub fn origin(&self) -> Option<Coordinates> {
        Coordinates::from_parts(
            self.lat.filter(|lat| *lat != 0.0),
            self.lon.filter(|lon| *lon != 0.0),
        )
    }
}

/// Either the external engine answer, passed through, or the local ranking.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Recommendations {
    External(Value),
    RuleBased {
        recommendations: Vec<DishResponse>,
        source: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DishKitchen {
    pub id: i64,
    pub kitchen_name: String,
    pub cuisine_specialty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DishResponse {
    pub id: i64,
    pub producer_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: f64,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub dietary_type: Option<DietaryType>,
    pub spice_level: Option<SpiceLevel>,
    pub allergens: Vec<String>,
    pub ingredients: Option<String>,
    pub is_available: bool,
    pub max_orders_per_day: i32,
    pub current_day_orders: i32,
    pub average_rating: f64,
    pub total_reviews: i32,
    pub view_count: i32,
    pub order_count: i32,
    pub display_order: i32,
    pub producer: Option<DishKitchen>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<ReviewResponse>>,
}

resource_id!(DishResponse, "dish::Dish");

impl DishResponse {
    /// Prices entered in rupees are shown in pounds.
    pub fn new(dish: &Dish, kitchen: Option<&Producer>) -> Self {
        let state = &dish.state;
        let (price, currency) = pricing::display_price(state.price, state.currency.as_deref());
        Self {
            id: dish.ident(),
            producer_id: state.producer_id,
            name: state.name.clone(),
            description: state.description.clone(),
            image_url: state.image_url.clone(),
            price,
            currency,
            category: state.category.clone(),
            dietary_type: state.dietary_type,
            spice_level: state.spice_level,
            allergens: dish.allergens(),
            ingredients: state.ingredients.clone(),
            is_available: state.is_available,
            max_orders_per_day: state.max_orders_per_day,
            current_day_orders: state.current_day_orders,
            average_rating: state.average_rating,
            total_reviews: state.total_reviews,
            view_count: state.view_count,
            order_count: state.order_count,
            display_order: state.display_order,
            producer: kitchen.map(|producer| DishKitchen {
                id: producer.ident(),
                kitchen_name: producer.state.kitchen_name.clone(),
                cuisine_specialty: producer.state.cuisine_specialty.clone(),
            }),
            created_at: dish.created(),
            reviews: None,
        }
    }

    pub fn with_reviews(mut self, reviews: Vec<ReviewResponse>) -> Self {
        self.reviews = Some(reviews);
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn local_query_limit() {
        let query = |limit| LocalQuery { limit, ..LocalQuery::default() };

        assert_eq!(query(None).limit(), LocalQuery::DEFAULT_LIMIT);
        assert_eq!(query(Some(0)).limit(), LocalQuery::DEFAULT_LIMIT);
        assert_eq!(query(Some(25)).limit(), 25);
        assert_eq!(query(Some(usize::MAX)).limit(), LocalQuery::MAX_LIMIT);
    }
}
