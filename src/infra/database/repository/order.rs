use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use futures::TryStreamExt;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use super::{decode, decode_all, decode_optional, Paged, PgQuery};
use crate::{
    base::Pagination,
    domain::{
        datatype::status::{OrderStatus, PaymentStatus},
        entity::{order::OrderState, Entity, Order, OrderItem},
        pricing::QuoteLine,
    },
    error::persistence::PersistenceError,
    infra::database::sql,
};

const COLUMNS: &str = "order_number, customer_id, producer_id, status, payment_status, \
    payment_intent_id, subtotal, delivery_charge, tax, total_amount, delivery_address, \
    delivery_latitude, delivery_longitude, delivery_instructions, estimated_preparation_time, \
    estimated_delivery_time, prepared_at, dispatched_at, delivered_at, canceled_at, cancel_reason, \
    tracking_url";

fn bind_state<'q>(query: PgQuery<'q>, state: &'q OrderState) -> PgQuery<'q> {
    query
        .bind(&state.order_number)
        .bind(state.customer_id)
        .bind(state.producer_id)
        .bind(state.status.as_str())
        .bind(state.payment_status.as_str())
        .bind(&state.payment_intent_id)
        .bind(state.subtotal)
        .bind(state.delivery_charge)
        .bind(state.tax)
        .bind(state.total_amount)
        .bind(&state.delivery_address)
        .bind(state.delivery_latitude)
        .bind(state.delivery_longitude)
        .bind(&state.delivery_instructions)
        .bind(state.estimated_preparation_time)
        .bind(state.estimated_delivery_time)
        .bind(state.prepared_at)
        .bind(state.dispatched_at)
        .bind(state.delivered_at)
        .bind(state.canceled_at)
        .bind(&state.cancel_reason)
        .bind(&state.tracking_url)
}

lazy_static::lazy_static! {
    static ref INSERT_ORDER: String = format!(
        "INSERT INTO orders ({COLUMNS}) VALUES \
        ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22) \
        RETURNING *"
    );
    static ref UPDATE_ORDER: String = format!(
        "UPDATE orders SET ({COLUMNS}, updated_at) = \
        ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, now()) \
        WHERE id = $23 RETURNING *"
    );
}

/// Persist a confirmed checkout.
///
/// In one transaction: the order and its item snapshots are inserted,
/// the ordered dishes count the new orders, and the customer cart is
/// emptied.
pub async fn place_order(
    pool: &PgPool,
    state: &OrderState,
    lines: &[QuoteLine],
    today: NaiveDate,
) -> Result<(Order, Vec<OrderItem>), PersistenceError> {
    let mut trx = pool.begin().await?;

    let row = bind_state(sqlx::query(&INSERT_ORDER), state)
        .fetch_one(&mut trx)
        .await?;
    let order: Order = decode(&row)?;

    let mut qb = QueryBuilder::<Postgres>::new(
        "INSERT INTO order_items (order_id, dish_id, dish_name, dish_price, quantity, subtotal) ",
    );
    qb.push_values(lines, |mut qb, line| {
        qb.push_bind(order.ident())
            .push_bind(line.dish_id)
            .push_bind(&line.dish_name)
            .push_bind(line.price)
            .push_bind(line.quantity)
            .push_bind(line.subtotal);
    });
    qb.push(" RETURNING *");
    let rows = qb.build().fetch_all(&mut trx).await?;
    let items = decode_all(rows)?;

    for line in lines {
        sqlx::query(
            "UPDATE dishes SET order_count = order_count + $2, \
            current_day_orders = CASE WHEN last_reset_date = $3 THEN current_day_orders ELSE 0 END + $2, \
            last_reset_date = $3, updated_at = now() WHERE id = $1",
        )
        .bind(line.dish_id)
        .bind(line.quantity)
        .bind(today)
        .execute(&mut trx)
        .await?;
    }

    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(state.customer_id)
        .execute(&mut trx)
        .await?;

    trx.commit().await?;
    Ok((order, items))
}

pub async fn update_order(pool: &PgPool, order: &Order) -> Result<Order, PersistenceError> {
    let row = bind_state(sqlx::query(&UPDATE_ORDER), &order.state)
        .bind(order.ident())
        .fetch_one(pool)
        .await?;
    decode(&row)
}

pub async fn find_order(pool: &PgPool, id: i64) -> Result<Option<Order>, PersistenceError> {
    let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    decode_optional(row)
}

pub async fn order_items(pool: &PgPool, order_id: i64) -> Result<Vec<OrderItem>, PersistenceError> {
    let rows = sqlx::query("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    decode_all(rows)
}

/// Items of several orders, keyed by order id.
pub async fn items_of_orders<I>(
    pool: &PgPool,
    order_ids: I,
) -> Result<HashMap<i64, Vec<OrderItem>>, PersistenceError>
where
    I: IntoIterator<Item = i64>,
{
    let ids: Vec<i64> = order_ids.into_iter().collect();
    let mut grouped: HashMap<i64, Vec<OrderItem>> = HashMap::new();
    if ids.is_empty() {
        return Ok(grouped);
    }

    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM order_items WHERE order_id IN ");
    sql::push_list(&mut qb, ids);
    qb.push(" ORDER BY id");

    let mut rows = qb.build().fetch(pool);
    while let Some(row) = rows.try_next().await? {
        let item: OrderItem = decode(&row)?;
        grouped.entry(item.state.order_id).or_default().push(item);
    }
    Ok(grouped)
}

pub async fn order_contains_dish(
    pool: &PgPool,
    order_id: i64,
    dish_id: i64,
) -> Result<bool, PersistenceError> {
    let row = sqlx::query(
        "SELECT EXISTS (SELECT 1 FROM order_items WHERE order_id = $1 AND dish_id = $2)",
    )
    .bind(order_id)
    .bind(dish_id)
    .fetch_one(pool)
    .await?;
    Ok(row.try_get(0)?)
}

const PAID_HISTORY: &str = "SELECT o.producer_id, i.dish_id FROM orders o \
    JOIN order_items i ON i.order_id = o.id \
    WHERE o.customer_id = $1 AND o.payment_status = 'paid'";

/// Dishes and kitchens of a customer's paid orders.
pub async fn ordered_by_customer(
    pool: &PgPool,
    customer_id: i64,
) -> Result<(HashSet<i64>, HashSet<i64>), PersistenceError> {
    let mut rows = sqlx::query(PAID_HISTORY).bind(customer_id).fetch(pool);

    let mut dishes = HashSet::new();
    let mut producers = HashSet::new();
    while let Some(row) = rows.try_next().await? {
        producers.insert(row.try_get::<i64, _>(0)?);
        if let Some(dish_id) = row.try_get::<Option<i64>, _>(1)? {
            dishes.insert(dish_id);
        }
    }
    Ok((dishes, producers))
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub customer_id: Option<i64>,
    pub producer_id: Option<i64>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

fn push_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a OrderFilter) {
    qb.push(" WHERE TRUE");
    if let Some(customer_id) = filter.customer_id {
        qb.push(" AND customer_id = ").push_bind(customer_id);
    }
    if let Some(producer_id) = filter.producer_id {
        qb.push(" AND producer_id = ").push_bind(producer_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(payment_status) = filter.payment_status {
        qb.push(" AND payment_status = ").push_bind(payment_status.as_str());
    }
}

/// Orders newest first.
pub async fn list_orders(
    pool: &PgPool,
    filter: &OrderFilter,
    page: Pagination,
) -> Result<Paged<Order>, PersistenceError> {
    let mut qb = QueryBuilder::new("SELECT count(*) FROM orders");
    push_filter(&mut qb, filter);
    let total: i64 = qb.build().fetch_one(pool).await?.try_get(0)?;

    let mut qb = QueryBuilder::new("SELECT * FROM orders");
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(page.per_page)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb.build().fetch_all(pool).await?;

    Ok(Paged {
        items: decode_all(rows)?,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_counts_paid_orders_only() {
        assert!(PAID_HISTORY.contains("o.customer_id = $1"));
        assert!(PAID_HISTORY.contains("o.payment_status = 'paid'"));
    }
}
