use std::collections::HashMap;

use chrono::Utc;
use sqlx::PgPool;

use super::{authorize, ANY_ROLE};
use crate::{
    app::resource::{
        cart::{AddCartItem, CartItemResponse, CartResponse, UpdateCartItem},
        Message,
    },
    domain::{
        entity::{CartItem, Dish, Entity, Producer, User},
        service::TokenEncryptionService,
    },
    error::{app::ApplicationError, persistence::PersistenceError, security::ForbiddenError},
    infra::database::repository::{cart, dish, producer},
};

/// Reset the daily order window of a dish when a new day started.
pub(crate) async fn refresh_window(pool: &PgPool, item: &mut Dish) -> Result<(), PersistenceError> {
    let today = Utc::now().date_naive();
    if item.refresh_daily_window(today) {
        dish::reset_daily_window(pool, item.ident(), today).await?;
    }
    Ok(())
}

async fn cart_line(pool: &PgPool, item: &CartItem) -> Result<CartItemResponse, PersistenceError> {
    let found = dish::find_dish(pool, item.dish_id()).await?;
    let kitchen = match &found {
        Some(found) => producer::find_producer(pool, found.producer_id()).await?,
        None => None,
    };
    Ok(CartItemResponse::new(item, found.as_ref(), kitchen.as_ref()))
}

async fn owned_line(pool: &PgPool, caller: &User, id: i64) -> Result<CartItem, ApplicationError> {
    let item = cart::find_cart_item(pool, id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Cart item"))?;
    if item.user_id() != caller.ident() {
        return Err(ForbiddenError::AccessDenied.into());
    }
    Ok(item)
}

/// The caller's cart. Lines of removed or unavailable dishes are dropped.
pub async fn get_cart<TS>(pool: &PgPool, token_service: &TS, token: &str) -> Result<CartResponse, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, ANY_ROLE).await?;
    let items = cart::user_cart(pool, caller.ident()).await?;

    let dishes: HashMap<i64, Dish> = dish::find_dishes(pool, items.iter().map(CartItem::dish_id))
        .await?
        .into_iter()
        .map(|found| (found.ident(), found))
        .collect();
    let kitchens: HashMap<i64, Producer> =
        producer::find_producers(pool, dishes.values().map(Dish::producer_id).collect::<Vec<_>>())
            .await?
            .into_iter()
            .map(|kitchen| (kitchen.ident(), kitchen))
            .collect();

    let (kept, stale): (Vec<CartItem>, Vec<CartItem>) = items.into_iter().partition(|item| {
        dishes
            .get(&item.dish_id())
            .map_or(false, |found| found.state.is_available)
    });
    if !stale.is_empty() {
        let ids: Vec<i64> = stale.iter().map(Entity::ident).collect();
        tracing::debug!(user = caller.ident(), removed = ?ids, "dropping unavailable cart lines");
        cart::remove_cart_items(pool, &ids).await?;
    }

    Ok(kept
        .iter()
        .map(|item| {
            let found = dishes.get(&item.dish_id());
            let kitchen = found.and_then(|found| kitchens.get(&found.producer_id()));
            CartItemResponse::new(item, found, kitchen)
        })
        .collect::<Vec<_>>()
        .into())
}

/// Add a dish, merging with the line already holding it.
pub async fn add_item<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    form: AddCartItem,
) -> Result<Message<CartItemResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, ANY_ROLE).await?;
    let (dish_id, quantity) = match (form.dish_id, form.quantity) {
        (Some(dish_id), Some(quantity)) => (dish_id, quantity),
        _ => return Err(ApplicationError::operation("dish_id and quantity are required")),
    };
    if quantity <= 0 {
        return Err(ApplicationError::operation("Quantity must be greater than 0"));
    }

    let mut found = dish::find_dish(pool, dish_id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Dish"))?;
    if !found.state.is_available {
        return Err(ApplicationError::operation("Dish is not available"));
    }
    refresh_window(pool, &mut found).await?;
    if !found.can_order(quantity) {
        return Err(ApplicationError::operation(
            "Dish cannot be ordered (daily limit reached or unavailable)",
        ));
    }

    if let Some(line) = cart::find_cart_line(pool, caller.ident(), dish_id).await? {
        if !found.can_order(line.quantity().saturating_add(quantity)) {
            return Err(ApplicationError::operation("Quantity exceeds daily limit"));
        }
    }

    let item = cart::add_to_cart(pool, caller.ident(), dish_id, quantity).await?;
    Ok(Message::with(
        "Item added to cart successfully",
        "cart_item",
        cart_line(pool, &item).await?,
    ))
}

/// Set the quantity of a line. Zero or less removes it.
pub async fn update_item<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    id: i64,
    form: UpdateCartItem,
) -> Result<Message<Option<CartItemResponse>>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, ANY_ROLE).await?;
    let line = owned_line(pool, &caller, id).await?;
    let quantity = form.quantity.unwrap_or_else(|| line.quantity());

    if quantity <= 0 {
        cart::remove_cart_items(pool, &[line.ident()]).await?;
        return Ok(Message::with("Cart item updated successfully", "cart_item", None));
    }

    let mut found = dish::find_dish(pool, line.dish_id())
        .await?
        .filter(|found| found.state.is_available)
        .ok_or_else(|| ApplicationError::operation("Dish is not available"))?;
    refresh_window(pool, &mut found).await?;
    if !found.can_order(quantity) {
        return Err(ApplicationError::operation("Quantity exceeds daily limit"));
    }

    let item = cart::set_quantity(pool, line.ident(), quantity).await?;
    Ok(Message::with(
        "Cart item updated successfully",
        "cart_item",
        Some(cart_line(pool, &item).await?),
    ))
}

pub async fn remove_item<TS>(pool: &PgPool, token_service: &TS, token: &str, id: i64) -> Result<Message, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, ANY_ROLE).await?;
    let line = owned_line(pool, &caller, id).await?;
    cart::remove_cart_items(pool, &[line.ident()]).await?;
    Ok(Message::new("Item removed from cart successfully"))
}

pub async fn clear<TS>(pool: &PgPool, token_service: &TS, token: &str) -> Result<Message, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, ANY_ROLE).await?;
    cart::clear_cart(pool, caller.ident()).await?;
    Ok(Message::new("Cart cleared successfully"))
}
