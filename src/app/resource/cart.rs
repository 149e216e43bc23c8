use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dish::DishResponse;
use crate::{
    base::resource_id,
    domain::entity::{CartItem, Dish, Entity, Producer},
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddCartItem {
    pub dish_id: Option<i64>,
    pub quantity: Option<i32>,
}

resource_id!(AddCartItem, "cart::CartItem");

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCartItem {
    pub quantity: Option<i32>,
}

resource_id!(UpdateCartItem, "cart::CartItem");

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItemResponse {
    pub id: i64,
    pub user_id: i64,
    pub dish_id: i64,
    pub quantity: i32,
    pub dish: Option<DishResponse>,
    /// In pounds.
    pub subtotal: f64,
    pub created_at: DateTime<Utc>,
}

resource_id!(CartItemResponse, "cart::CartItem");

impl CartItemResponse {
    pub fn new(item: &CartItem, dish: Option<&Dish>, kitchen: Option<&Producer>) -> Self {
        Self {
            id: item.ident(),
            user_id: item.user_id(),
            dish_id: item.dish_id(),
            quantity: item.quantity(),
            dish: dish.map(|dish| DishResponse::new(dish, kitchen)),
            subtotal: dish.map_or(0.0, |dish| dish.gbp_price() * item.quantity() as f64),
            created_at: item.created(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
    pub total: f64,
    pub count: usize,
}

impl From<Vec<CartItemResponse>> for CartResponse {
    fn from(items: Vec<CartItemResponse>) -> Self {
        Self {
            total: items.iter().map(|item| item.subtotal).sum(),
            count: items.len(),
            items,
        }
    }
}
