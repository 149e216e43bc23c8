//! Operations behind the API endpoints.
//!
//! Every use case takes the pool and the services it needs, authorizes
//! the caller from the bearer token and returns a response resource.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod dish;
pub mod order;
pub mod producer;
pub mod recommendation;
pub mod report;
pub mod review;
pub mod user;

use std::collections::{HashMap, HashSet};

use sqlx::PgPool;

use crate::{
    app::resource::{
        dish::DishResponse,
        order::{OrderItemResponse, OrderResponse},
        producer::ProducerResponse,
        review::ReviewResponse,
    },
    domain::{
        datatype::{
            security::{Token, TokenKind, TokenSubject, UserClaims},
            status::Role,
        },
        entity::{Dish, Entity, Order, Producer, Review, User},
        service::{Mailer, TokenEncryptionService},
    },
    error::{
        app::ApplicationError,
        persistence::PersistenceError,
        security::{AuthenticationError, ForbiddenError, UnauthorizedError},
    },
    infra::database::repository as repo,
};

pub const ANY_ROLE: &[Role] = &[Role::Customer, Role::Producer, Role::Admin];

/// Id of the user an access token was issued to.
pub fn token_subject<TS>(token_service: &TS, token: &str) -> Result<i64, UnauthorizedError>
where
    TS: TokenEncryptionService,
{
    let token = Token::<UserClaims>::verify(token.into(), TokenKind::Access, token_service)?;
    match token.payload().subject()? {
        TokenSubject::User(id) => Ok(id),
    }
}

/// Load the caller and check it holds one of `roles`.
pub async fn authorize<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    roles: &[Role],
) -> Result<User, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let user_id = token_subject(token_service, token)?;
    let user = repo::user::find_user(pool, user_id)
        .await?
        .filter(User::is_active)
        .ok_or(AuthenticationError::InactiveUser)?;

    if !user.has_role(roles) {
        return Err(ForbiddenError::InsufficientPermissions.into());
    }
    Ok(user)
}

/// Kitchen profile of a producer user.
pub(crate) async fn kitchen_of(pool: &PgPool, owner: &User) -> Result<Producer, ApplicationError> {
    repo::producer::find_producer_by_user(pool, owner.ident())
        .await?
        .ok_or_else(|| ApplicationError::not_found("Producer profile"))
}

/// Kitchen that is allowed to trade.
pub(crate) async fn trading_kitchen_of(pool: &PgPool, owner: &User) -> Result<Producer, ApplicationError> {
    let kitchen = kitchen_of(pool, owner).await?;
    if !kitchen.is_trading() {
        return Err(ForbiddenError::InactiveProducer.into());
    }
    Ok(kitchen)
}

/// Fire and forget.
pub(crate) fn notify(mailer: &dyn Mailer, email: crate::domain::service::Email) {
    tracing::debug!(to = %email.to, subject = %email.subject, "dispatching mail");
    mailer.send(email);
}

fn by_id<T: Entity>(entities: Vec<T>) -> HashMap<i64, T> {
    entities
        .into_iter()
        .map(|entity| (entity.ident(), entity))
        .collect()
}

/// Kitchens with their owner account.
pub(crate) async fn producer_views(
    pool: &PgPool,
    producers: &[Producer],
) -> Result<Vec<ProducerResponse>, PersistenceError> {
    let owners = by_id(repo::user::find_users(pool, producers.iter().map(Producer::user_id)).await?);
    Ok(producers
        .iter()
        .map(|kitchen| ProducerResponse::new(kitchen, owners.get(&kitchen.user_id())))
        .collect())
}

pub(crate) async fn producer_view(
    pool: &PgPool,
    producer: &Producer,
) -> Result<ProducerResponse, PersistenceError> {
    let owner = repo::user::find_user(pool, producer.user_id()).await?;
    Ok(ProducerResponse::new(producer, owner.as_ref()))
}

/// Dishes with a summary of their kitchen.
pub(crate) async fn dish_views(pool: &PgPool, dishes: &[Dish]) -> Result<Vec<DishResponse>, PersistenceError> {
    let ids: HashSet<i64> = dishes.iter().map(Dish::producer_id).collect();
    let kitchens = by_id(repo::producer::find_producers(pool, ids).await?);
    Ok(dishes
        .iter()
        .map(|dish| DishResponse::new(dish, kitchens.get(&dish.producer_id())))
        .collect())
}

pub(crate) async fn dish_view(pool: &PgPool, dish: &Dish) -> Result<DishResponse, PersistenceError> {
    let kitchen = repo::producer::find_producer(pool, dish.producer_id()).await?;
    Ok(DishResponse::new(dish, kitchen.as_ref()))
}

pub(crate) async fn review_views(
    pool: &PgPool,
    reviews: &[Review],
) -> Result<Vec<ReviewResponse>, PersistenceError> {
    let ids: HashSet<i64> = reviews.iter().map(|review| review.state.user_id).collect();
    let authors = by_id(repo::user::find_users(pool, ids).await?);
    Ok(reviews
        .iter()
        .map(|review| ReviewResponse::new(review, authors.get(&review.state.user_id)))
        .collect())
}

pub(crate) async fn review_view(pool: &PgPool, review: &Review) -> Result<ReviewResponse, PersistenceError> {
    let author = repo::user::find_user(pool, review.state.user_id).await?;
    Ok(ReviewResponse::new(review, author.as_ref()))
}

/// Orders with their items, the ordered dishes and the kitchen.
pub(crate) async fn order_views(
    pool: &PgPool,
    orders: &[Order],
) -> Result<Vec<OrderResponse>, PersistenceError> {
    let mut items = repo::order::items_of_orders(pool, orders.iter().map(Entity::ident)).await?;

    let dish_ids: HashSet<i64> = items
        .values()
        .flatten()
        .filter_map(|item| item.state.dish_id)
        .collect();
    let dishes = repo::dish::find_dishes(pool, dish_ids).await?;

    let kitchens: Vec<Producer> = repo::producer::find_producers(
        pool,
        orders
            .iter()
            .map(Order::producer_id)
            .chain(dishes.iter().map(Dish::producer_id))
            .collect::<HashSet<i64>>(),
    )
    .await?;

    let kitchen_views: HashMap<i64, ProducerResponse> = kitchens
        .iter()
        .map(Entity::ident)
        .zip(producer_views(pool, &kitchens).await?)
        .collect();
    let kitchens = by_id(kitchens);
    let dishes: HashMap<i64, DishResponse> = dishes
        .iter()
        .map(|dish| (dish.ident(), DishResponse::new(dish, kitchens.get(&dish.producer_id()))))
        .collect();

    Ok(orders
        .iter()
        .map(|order| {
            let lines = items
                .remove(&order.ident())
                .unwrap_or_default()
                .iter()
                .map(|item| {
                    let dish = item.state.dish_id.and_then(|id| dishes.get(&id)).cloned();
                    OrderItemResponse::new(item, dish)
                })
                .collect();
            OrderResponse::new(order, lines, kitchen_views.get(&order.producer_id()).cloned())
        })
        .collect())
}

pub(crate) async fn order_view(pool: &PgPool, order: &Order) -> Result<OrderResponse, PersistenceError> {
    let mut views = order_views(pool, std::slice::from_ref(order)).await?;
    views.pop().ok_or(PersistenceError::NotFound)
}

/// Whether `caller` may see or handle `order`.
pub(crate) async fn check_order_access(
    pool: &PgPool,
    caller: &User,
    order: &Order,
) -> Result<(), ApplicationError> {
    let allowed = match caller.role() {
        Role::Admin => true,
        Role::Customer => order.customer_id() == caller.ident(),
        Role::Producer => repo::producer::find_producer_by_user(pool, caller.ident())
            .await?
            .map_or(false, |kitchen| kitchen.ident() == order.producer_id()),
    };
    if !allowed {
        return Err(ForbiddenError::AccessDenied.into());
    }
    Ok(())
}
