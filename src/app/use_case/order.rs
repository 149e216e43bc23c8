use chrono::Utc;
use sqlx::PgPool;

use super::{authorize, check_order_access, kitchen_of, notify, order_view, order_views, producer_view, ANY_ROLE};
use crate::{
    app::resource::{
        order::{OrderQuery, OrderResponse, RejectOrder, StatusUpdate, TrackResponse},
        Message, Page,
    },
    base::Pagination,
    domain::{
        datatype::status::{OrderStatus, Role},
        entity::{order::DEFAULT_REJECT_REASON, Entity, Order, User},
        notification,
        service::{Mailer, TokenEncryptionService},
    },
    error::{app::ApplicationError, persistence::PersistenceError, security::ForbiddenError},
    infra::database::repository::{
        order::{self, OrderFilter},
        producer, user,
    },
};

/// Page of orders matching `filter` plus the status filters of `query`.
///
/// An unknown status matches nothing.
pub(crate) async fn filtered_orders(
    pool: &PgPool,
    mut filter: OrderFilter,
    query: OrderQuery,
) -> Result<Page<OrderResponse>, ApplicationError> {
    let pagination = Pagination::new(query.page, query.per_page, Pagination::PER_PAGE);

    if let Some(text) = query.status.filter(|text| !text.is_empty()) {
        match text.parse() {
            Ok(status) => filter.status = Some(status),
            Err(_) => return Ok(Page::empty("orders", pagination)),
        }
    }
    if let Some(text) = query.payment_status.filter(|text| !text.is_empty()) {
        match text.parse() {
            Ok(status) => filter.payment_status = Some(status),
            Err(_) => return Ok(Page::empty("orders", pagination)),
        }
    }

    let page = order::list_orders(pool, &filter, pagination).await?;
    let items = order_views(pool, &page.items).await?;
    Ok(Page::new("orders", items, page.total, pagination))
}

/// Orders visible to the caller, newest first.
pub async fn list_orders<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    query: OrderQuery,
) -> Result<Page<OrderResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, ANY_ROLE).await?;
    let filter = match caller.role() {
        Role::Customer => OrderFilter {
            customer_id: Some(caller.ident()),
            ..OrderFilter::default()
        },
        Role::Producer => match producer::find_producer_by_user(pool, caller.ident()).await? {
            Some(kitchen) => OrderFilter {
                producer_id: Some(kitchen.ident()),
                ..OrderFilter::default()
            },
            None => {
                let pagination = Pagination::new(query.page, query.per_page, Pagination::PER_PAGE);
                return Ok(Page::empty("orders", pagination));
            }
        },
        Role::Admin => OrderFilter::default(),
    };

    filtered_orders(
        pool,
        filter,
        OrderQuery {
            payment_status: None,
            ..query
        },
    )
    .await
}

async fn visible_order(pool: &PgPool, caller: &User, id: i64) -> Result<Order, ApplicationError> {
    let found = order::find_order(pool, id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Order"))?;
    check_order_access(pool, caller, &found).await?;
    Ok(found)
}

/// Order details with its tracking block.
pub async fn get_order<TS>(pool: &PgPool, token_service: &TS, token: &str, id: i64) -> Result<OrderResponse, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, ANY_ROLE).await?;
    let found = visible_order(pool, &caller, id).await?;
    Ok(order_view(pool, &found).await?.with_tracking(&found))
}

pub async fn track_order<TS>(pool: &PgPool, token_service: &TS, token: &str, id: i64) -> Result<TrackResponse, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, ANY_ROLE).await?;
    let found = visible_order(pool, &caller, id).await?;
    let kitchen = match producer::find_producer(pool, found.producer_id()).await? {
        Some(kitchen) => Some(producer_view(pool, &kitchen).await?),
        None => None,
    };
    Ok(TrackResponse::new(&found, kitchen, Utc::now()))
}

/// Order of the caller's own kitchen.
async fn kitchen_order(pool: &PgPool, caller: &User, id: i64) -> Result<Order, ApplicationError> {
    let found = order::find_order(pool, id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Order"))?;
    let kitchen = kitchen_of(pool, caller)
        .await
        .map_err(|_| ApplicationError::from(ForbiddenError::AccessDenied))?;
    if kitchen.ident() != found.producer_id() {
        return Err(ForbiddenError::AccessDenied.into());
    }
    Ok(found)
}

async fn customer_of(pool: &PgPool, order: &Order) -> Result<Option<User>, PersistenceError> {
    let customer = user::find_user(pool, order.customer_id()).await?;
    if customer.is_none() {
        tracing::warn!(order = order.ident(), "order customer not found, skipping mail");
    }
    Ok(customer)
}

pub async fn update_status<TS>(
    pool: &PgPool,
    token_service: &TS,
    mailer: &dyn Mailer,
    token: &str,
    id: i64,
    form: StatusUpdate,
) -> Result<Message<OrderResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, &[Role::Producer, Role::Admin]).await?;
    let mut found = match caller.role() {
        Role::Admin => order::find_order(pool, id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Order"))?,
        _ => kitchen_order(pool, &caller, id).await?,
    };

    let status: OrderStatus = match form.status.as_deref().filter(|text| !text.is_empty()) {
        None => return Err(ApplicationError::operation("Status is required")),
        Some(text) => text.parse().map_err(|_| {
            let valid: Vec<&str> = OrderStatus::ALL.iter().map(OrderStatus::as_str).collect();
            ApplicationError::operation(format!("Invalid status. Must be one of: {}", valid.join(", ")))
        })?,
    };

    let previous = found.status();
    found.set_status(status, Utc::now(), form.cancel_reason);
    let updated = order::update_order(pool, &found).await?;
    tracing::info!(order = updated.ident(), from = %previous, to = %status, "order status changed");

    if let Some(customer) = customer_of(pool, &updated).await? {
        notify(mailer, notification::order_status_update(&customer, &updated));
    }

    Ok(Message::with(
        "Order status updated successfully",
        "order",
        order_view(pool, &updated).await?,
    ))
}

pub async fn accept_order<TS>(
    pool: &PgPool,
    token_service: &TS,
    mailer: &dyn Mailer,
    token: &str,
    id: i64,
) -> Result<Message<OrderResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, &[Role::Producer]).await?;
    let mut found = kitchen_order(pool, &caller, id).await?;
    found
        .accept()
        .map_err(|err| ApplicationError::operation(err.to_string()))?;

    let updated = order::update_order(pool, &found).await?;
    if let Some(customer) = customer_of(pool, &updated).await? {
        notify(mailer, notification::order_status_update(&customer, &updated));
    }

    Ok(Message::with(
        "Order accepted successfully",
        "order",
        order_view(pool, &updated).await?,
    ))
}

pub async fn reject_order<TS>(
    pool: &PgPool,
    token_service: &TS,
    mailer: &dyn Mailer,
    token: &str,
    id: i64,
    form: RejectOrder,
) -> Result<Message<OrderResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, &[Role::Producer]).await?;
    let mut found = kitchen_order(pool, &caller, id).await?;
    let reason = form
        .reason
        .filter(|reason| !reason.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REJECT_REASON.to_string());
    found
        .reject(Utc::now(), reason.clone())
        .map_err(|err| ApplicationError::operation(err.to_string()))?;

    let updated = order::update_order(pool, &found).await?;
    tracing::info!(order = updated.ident(), "order rejected by kitchen");
    if let Some(customer) = customer_of(pool, &updated).await? {
        notify(mailer, notification::order_rejection(&customer, &updated, &reason));
    }

    Ok(Message::with(
        "Order rejected successfully",
        "order",
        order_view(pool, &updated).await?,
    ))
}
