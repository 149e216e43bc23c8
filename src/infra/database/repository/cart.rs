use sqlx::PgPool;

use super::{decode, decode_all, decode_optional};
use crate::{domain::entity::CartItem, error::persistence::PersistenceError};

pub async fn user_cart(pool: &PgPool, user_id: i64) -> Result<Vec<CartItem>, PersistenceError> {
    let rows = sqlx::query("SELECT * FROM cart_items WHERE user_id = $1 ORDER BY created_at, id")
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    decode_all(rows)
}

pub async fn find_cart_item(pool: &PgPool, id: i64) -> Result<Option<CartItem>, PersistenceError> {
    let row = sqlx::query("SELECT * FROM cart_items WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    decode_optional(row)
}

pub async fn find_cart_line(
    pool: &PgPool,
    user_id: i64,
    dish_id: i64,
) -> Result<Option<CartItem>, PersistenceError> {
    let row = sqlx::query("SELECT * FROM cart_items WHERE user_id = $1 AND dish_id = $2")
        .bind(user_id)
        .bind(dish_id)
        .fetch_optional(pool)
        .await?;
    decode_optional(row)
}

/// Add a line, or add the quantity to the line already holding the dish.
pub async fn add_to_cart(
    pool: &PgPool,
    user_id: i64,
    dish_id: i64,
    quantity: i32,
) -> Result<CartItem, PersistenceError> {
    let row = sqlx::query(
        "INSERT INTO cart_items (user_id, dish_id, quantity) VALUES ($1, $2, $3) \
        ON CONFLICT ON CONSTRAINT unique_user_dish_cart \
        DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity, updated_at = now() \
        RETURNING *",
    )
    .bind(user_id)
    .bind(dish_id)
    .bind(quantity)
    .fetch_one(pool)
    .await?;
    decode(&row)
}

pub async fn set_quantity(
    pool: &PgPool,
    id: i64,
    quantity: i32,
) -> Result<CartItem, PersistenceError> {
    let row = sqlx::query(
        "UPDATE cart_items SET quantity = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(quantity)
    .fetch_one(pool)
    .await?;
    decode(&row)
}

pub async fn remove_cart_items(pool: &PgPool, ids: &[i64]) -> Result<(), PersistenceError> {
    if ids.is_empty() {
        return Ok(());
    }
    sqlx::query("DELETE FROM cart_items WHERE id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn clear_cart(pool: &PgPool, user_id: i64) -> Result<(), PersistenceError> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
