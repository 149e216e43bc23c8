//! Platform moderation: kitchens, accounts, orders, reviews and dishes.

use chrono::Utc;
use sqlx::PgPool;

use super::{authorize, dish_view, dish_views, notify, producer_view, producer_views, review_view, review_views};
use crate::{
    app::resource::{
        admin::{Moderation, ReviewQuery, UserQuery},
        dish::{DishAdminQuery, DishPatch, DishResponse},
        order::{OrderQuery, OrderResponse},
        producer::{ProducerPatch, ProducerResponse},
        review::ReviewResponse,
        user::UserResponse,
        Keyed, Message, Page,
    },
    base::Pagination,
    domain::{
        datatype::status::{ProducerStatus, Role},
        entity::{Dish, Entity, Producer, User},
        notification,
        service::{Mailer, TokenEncryptionService},
    },
    error::app::ApplicationError,
    infra::database::repository::{
        dish::{self, DishFilter, DishSort},
        order::OrderFilter,
        producer,
        report::{self, DashboardStatistics},
        review::{self, ReviewFilter},
        user,
    },
};

pub const ADMIN: &[Role] = &[Role::Admin];

pub const DEFAULT_PRODUCER_REJECTION: &str = "Producer application rejected";
pub const DEFAULT_PRODUCER_SUSPENSION: &str = "Producer account suspended";
pub const DEFAULT_USER_SUSPENSION: &str = "User account suspended";

fn reason(form: Option<Moderation>, default: &str) -> String {
    form.and_then(|form| form.reason)
        .filter(|reason| !reason.trim().is_empty())
        .unwrap_or_else(|| default.into())
}

async fn find_kitchen(pool: &PgPool, id: i64) -> Result<Producer, ApplicationError> {
    producer::find_producer(pool, id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Producer"))
}

async fn find_dish(pool: &PgPool, id: i64) -> Result<Dish, ApplicationError> {
    dish::find_dish(pool, id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Dish"))
}

/// Set the active flag of the kitchen owner account, when it changes.
async fn set_owner_active(pool: &PgPool, kitchen: &Producer, active: bool) -> Result<Option<User>, ApplicationError> {
    let Some(mut owner) = user::find_user(pool, kitchen.user_id()).await? else {
        return Ok(None);
    };
    if owner.state.is_active != active {
        owner.state.is_active = active;
        owner = user::update_user(pool, &owner).await?;
    }
    Ok(Some(owner))
}

pub async fn dashboard<TS>(pool: &PgPool, token_service: &TS, token: &str) -> Result<Keyed<DashboardStatistics>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    authorize(pool, token_service, token, ADMIN).await?;
    Ok(Keyed("statistics", report::dashboard(pool, Utc::now()).await?))
}

/// Kitchens waiting for approval, newest first.
pub async fn pending_producers<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
) -> Result<Keyed<Vec<ProducerResponse>>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    authorize(pool, token_service, token, ADMIN).await?;
    let pending = producer::producers_with_status(pool, ProducerStatus::Pending).await?;
    Ok(Keyed("producers", producer_views(pool, &pending).await?))
}

/// Approve a pending kitchen, activate its owner and let them know.
pub async fn approve_producer<TS>(
    pool: &PgPool,
    token_service: &TS,
    mailer: &dyn Mailer,
    token: &str,
    id: i64,
) -> Result<Message<ProducerResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let admin = authorize(pool, token_service, token, ADMIN).await?;
    let mut kitchen = find_kitchen(pool, id).await?;
    if kitchen.status() != ProducerStatus::Pending {
        return Err(ApplicationError::operation(format!(
            "Producer is already {}",
            kitchen.status()
        )));
    }

    kitchen.approve(Utc::now());
    let kitchen = producer::update_producer(pool, &kitchen).await?;
    if let Some(owner) = set_owner_active(pool, &kitchen, true).await? {
        notify(mailer, notification::producer_approved(&owner, &kitchen));
    }
    tracing::info!(producer = kitchen.ident(), admin = admin.ident(), "producer approved");

    Ok(Message::with(
        "Producer approved successfully",
        "producer",
        producer_view(pool, &kitchen).await?,
    ))
}

pub async fn reject_producer<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    id: i64,
    form: Option<Moderation>,
) -> Result<Message<ProducerResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let admin = authorize(pool, token_service, token, ADMIN).await?;
    let mut kitchen = find_kitchen(pool, id).await?;

    kitchen.reject(reason(form, DEFAULT_PRODUCER_REJECTION));
    let kitchen = producer::update_producer(pool, &kitchen).await?;
    tracing::info!(producer = kitchen.ident(), admin = admin.ident(), "producer rejected");

    Ok(Message::with(
        "Producer rejected successfully",
        "producer",
        producer_view(pool, &kitchen).await?,
    ))
}

/// Suspend a kitchen and deactivate the owner account.
pub async fn suspend_producer<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    id: i64,
    form: Option<Moderation>,
) -> Result<Message<ProducerResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let admin = authorize(pool, token_service, token, ADMIN).await?;
    let mut kitchen = find_kitchen(pool, id).await?;

    kitchen.suspend(reason(form, DEFAULT_PRODUCER_SUSPENSION));
    let kitchen = producer::update_producer(pool, &kitchen).await?;
    set_owner_active(pool, &kitchen, false).await?;
    tracing::info!(producer = kitchen.ident(), admin = admin.ident(), "producer suspended");

    Ok(Message::with(
        "Producer suspended successfully",
        "producer",
        producer_view(pool, &kitchen).await?,
    ))
}

/// Edit any kitchen profile. An unknown status is ignored.
pub async fn update_producer<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    id: i64,
    mut patch: ProducerPatch,
) -> Result<Message<ProducerResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    authorize(pool, token_service, token, ADMIN).await?;
    let mut kitchen = find_kitchen(pool, id).await?;

    let status = patch
        .status
        .take()
        .and_then(|text| text.parse::<ProducerStatus>().ok());
    super::producer::apply_patch(&mut kitchen, patch);
    if let Some(status) = status {
        kitchen.set_status(status, Utc::now());
    }

    let kitchen = producer::update_producer(pool, &kitchen).await?;
    if status == Some(ProducerStatus::Approved) {
        set_owner_active(pool, &kitchen, true).await?;
    }

    Ok(Message::with(
        "Producer profile updated successfully by admin",
        "producer",
        producer_view(pool, &kitchen).await?,
    ))
}

/// Every account, newest first. An unknown role matches nothing.
pub async fn list_users<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    query: UserQuery,
) -> Result<Page<UserResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    authorize(pool, token_service, token, ADMIN).await?;
    let pagination = Pagination::new(query.page, query.per_page, Pagination::PER_PAGE);

    let role = match query.role.filter(|role| !role.is_empty()).map(|role| role.parse::<Role>()) {
        Some(Ok(role)) => Some(role),
        Some(Err(_)) => return Ok(Page::empty("users", pagination)),
        None => None,
    };
    let page = user::list_users(pool, role, pagination).await?;
    let items = page.items.iter().map(UserResponse::from).collect();

    Ok(Page::new("users", items, page.total, pagination))
}

/// Deactivate an account. Producers lose their kitchen approval too.
pub async fn suspend_user<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    id: i64,
    form: Option<Moderation>,
) -> Result<Message<UserResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let admin = authorize(pool, token_service, token, ADMIN).await?;
    let mut target = user::find_user(pool, id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("User"))?;
    if target.ident() == admin.ident() {
        return Err(ApplicationError::operation("Cannot suspend yourself"));
    }

    target.state.is_active = false;
    let target = user::update_user(pool, &target).await?;

    if target.role() == Role::Producer {
        if let Some(mut kitchen) = producer::find_producer_by_user(pool, target.ident()).await? {
            kitchen.suspend(reason(form, DEFAULT_USER_SUSPENSION));
            producer::update_producer(pool, &kitchen).await?;
        }
    }
    tracing::info!(user = target.ident(), admin = admin.ident(), "user suspended");

    Ok(Message::with(
        "User suspended successfully",
        "user",
        UserResponse::from(&target),
    ))
}

/// Every order, with the status and payment status filters.
pub async fn list_orders<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    query: OrderQuery,
) -> Result<Page<OrderResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    authorize(pool, token_service, token, ADMIN).await?;
    super::order::filtered_orders(pool, OrderFilter::default(), query).await
}

/// Every review, hidden ones included.
pub async fn list_reviews<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    query: ReviewQuery,
) -> Result<Page<ReviewResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    authorize(pool, token_service, token, ADMIN).await?;
    let pagination = Pagination::new(query.page, query.per_page, Pagination::PER_PAGE);

    let filter = ReviewFilter {
        max_rating: query.min_rating.filter(|rating| *rating != 0),
        ..ReviewFilter::default()
    };
    let page = review::list_reviews(pool, &filter, pagination).await?;
    let items = review_views(pool, &page.items).await?;

    Ok(Page::new("reviews", items, page.total, pagination))
}

pub async fn hide_review<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    id: i64,
) -> Result<Message<ReviewResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let admin = authorize(pool, token_service, token, ADMIN).await?;
    let mut found = review::find_review(pool, id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Review"))?;

    found.hide();
    let hidden = review::update_review(pool, &found).await?;
    review::recompute_ratings(pool, hidden.state.dish_id, hidden.state.producer_id).await?;
    tracing::info!(review = hidden.ident(), admin = admin.ident(), "review hidden");

    Ok(Message::with(
        "Review hidden successfully",
        "review",
        review_view(pool, &hidden).await?,
    ))
}

fn availability(status: Option<&str>) -> Option<bool> {
    match status {
        Some("available") => Some(true),
        Some("unavailable") => Some(false),
        _ => None,
    }
}

/// Every dish, newest first, unavailable ones included.
pub async fn list_dishes<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    query: DishAdminQuery,
) -> Result<Page<DishResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    authorize(pool, token_service, token, ADMIN).await?;
    let pagination = Pagination::new(query.page, query.per_page, Pagination::PER_PAGE);

    let filter = DishFilter {
        producer_ids: query.producer_id.filter(|id| *id != 0).map(|id| vec![id]),
        available: availability(query.status.as_deref()),
        sort: DishSort::Newest,
        ..DishFilter::default()
    };
    let page = dish::list_dishes(pool, &filter, pagination).await?;
    let items = dish_views(pool, &page.items).await?;

    Ok(Page::new("dishes", items, page.total, pagination))
}

pub async fn update_dish<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    id: i64,
    patch: DishPatch,
) -> Result<Message<DishResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    authorize(pool, token_service, token, ADMIN).await?;
    let mut found = find_dish(pool, id).await?;
    super::dish::apply_patch(&mut found, patch)?;

    let updated = dish::update_dish(pool, &found).await?;
    Ok(Message::with(
        "Dish updated successfully by admin",
        "dish",
        dish_view(pool, &updated).await?,
    ))
}

pub async fn delete_dish<TS>(pool: &PgPool, token_service: &TS, token: &str, id: i64) -> Result<Message, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let admin = authorize(pool, token_service, token, ADMIN).await?;
    let found = find_dish(pool, id).await?;
    dish::delete_dish(pool, found.ident()).await?;
    tracing::info!(dish = found.ident(), admin = admin.ident(), "dish deleted by admin");
    Ok(Message::new("Dish deleted successfully by admin"))
}

async fn set_dish_availability<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    id: i64,
    available: bool,
) -> Result<DishResponse, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let admin = authorize(pool, token_service, token, ADMIN).await?;
    let mut found = find_dish(pool, id).await?;
    found.state.is_available = available;
    let updated = dish::update_dish(pool, &found).await?;
    tracing::info!(dish = updated.ident(), admin = admin.ident(), available, "dish availability set");
    Ok(dish_view(pool, &updated).await?)
}

/// Make a dish available.
pub async fn approve_dish<TS>(pool: &PgPool, token_service: &TS, token: &str, id: i64) -> Result<Message<DishResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let dish = set_dish_availability(pool, token_service, token, id, true).await?;
    Ok(Message::with("Dish approved successfully", "dish", dish))
}

pub async fn disable_dish<TS>(pool: &PgPool, token_service: &TS, token: &str, id: i64) -> Result<Message<DishResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let dish = set_dish_availability(pool, token_service, token, id, false).await?;
    Ok(Message::with("Dish disabled successfully", "dish", dish))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn moderation_reason_defaults() {
        assert_eq!(reason(None, DEFAULT_PRODUCER_REJECTION), DEFAULT_PRODUCER_REJECTION);
        assert_eq!(
            reason(Some(Moderation { reason: Some("  ".into()) }), DEFAULT_USER_SUSPENSION),
            DEFAULT_USER_SUSPENSION
        );
        assert_eq!(
            reason(Some(Moderation { reason: Some("Hygiene audit".into()) }), DEFAULT_PRODUCER_SUSPENSION),
            "Hygiene audit"
        );
    }

    #[test]
    fn dish_status_filter() {
        assert_eq!(availability(Some("available")), Some(true));
        assert_eq!(availability(Some("unavailable")), Some(false));
        assert_eq!(availability(Some("all")), None);
        assert_eq!(availability(None), None);
    }
}
