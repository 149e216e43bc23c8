use chrono::{DateTime, Duration, Utc};
use futures::TryStreamExt;
use serde::Serialize;
use sqlx::{PgPool, Row};

use crate::{
    domain::{
        datatype::status::{OrderStatus, PaymentStatus, ProducerStatus, Role},
        report::{DateRange, DeliveryTiming},
    },
    error::persistence::PersistenceError,
};

const IN_RANGE: &str = "($1::TIMESTAMPTZ IS NULL OR created_at >= $1) AND ($2::TIMESTAMPTZ IS NULL OR created_at <= $2)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStatistics {
    pub total_users: i64,
    pub total_producers: i64,
    pub total_dishes: i64,
    pub total_orders: i64,
    pub pending_producers: i64,
    pub recent_orders: i64,
    pub recent_sales: f64,
    pub active_orders: i64,
}

pub async fn dashboard(pool: &PgPool, now: DateTime<Utc>) -> Result<DashboardStatistics, PersistenceError> {
    let active: Vec<&str> = OrderStatus::ACTIVE.iter().map(OrderStatus::as_str).collect();

    let row = sqlx::query(
        "SELECT \
        (SELECT count(*) FROM users WHERE role = $1), \
        (SELECT count(*) FROM producers), \
        (SELECT count(*) FROM dishes), \
        (SELECT count(*) FROM orders), \
        (SELECT count(*) FROM producers WHERE status = $2), \
        (SELECT count(*) FROM orders WHERE created_at >= $3), \
        (SELECT COALESCE(SUM(total_amount), 0)::DOUBLE PRECISION FROM orders WHERE created_at >= $4 AND payment_status = $5), \
        (SELECT count(*) FROM orders WHERE status = ANY($6))",
    )
    .bind(Role::Customer.as_str())
    .bind(ProducerStatus::Pending.as_str())
    .bind(now - Duration::days(7))
    .bind(now - Duration::days(30))
    .bind(PaymentStatus::Paid.as_str())
    .bind(&active)
    .fetch_one(pool)
    .await?;

    Ok(DashboardStatistics {
        total_users: row.try_get(0)?,
        total_producers: row.try_get(1)?,
        total_dishes: row.try_get(2)?,
        total_orders: row.try_get(3)?,
        pending_producers: row.try_get(4)?,
        recent_orders: row.try_get(5)?,
        recent_sales: row.try_get(6)?,
        active_orders: row.try_get(7)?,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesLine {
    #[serde(skip)]
    pub key: String,
    pub count: i64,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer_name: Option<String>,
}

/// Paid sales in the period: total amount and count.
pub async fn paid_sales(pool: &PgPool, range: &DateRange) -> Result<(f64, i64), PersistenceError> {
    let row = sqlx::query(&format!(
        "SELECT COALESCE(SUM(total_amount), 0)::DOUBLE PRECISION, count(*) FROM orders \
        WHERE payment_status = $3 AND {IN_RANGE}"
    ))
    .bind(range.start)
    .bind(range.end)
    .bind(PaymentStatus::Paid.as_str())
    .fetch_one(pool)
    .await?;
    Ok((row.try_get(0)?, row.try_get(1)?))
}

pub async fn sales_by_producer(
    pool: &PgPool,
    range: &DateRange,
) -> Result<Vec<SalesLine>, PersistenceError> {
    let rows = sqlx::query(
        "SELECT o.producer_id, COALESCE(p.kitchen_name, 'Unknown'), count(*), \
        SUM(o.total_amount)::DOUBLE PRECISION FROM orders o \
        LEFT JOIN producers p ON p.id = o.producer_id \
        WHERE o.payment_status = $3 \
        AND ($1::TIMESTAMPTZ IS NULL OR o.created_at >= $1) AND ($2::TIMESTAMPTZ IS NULL OR o.created_at <= $2) \
        GROUP BY o.producer_id, p.kitchen_name ORDER BY o.producer_id",
    )
    .bind(range.start)
    .bind(range.end)
    .bind(PaymentStatus::Paid.as_str())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(SalesLine {
                key: row.try_get::<i64, _>(0)?.to_string(),
                producer_name: Some(row.try_get(1)?),
                count: row.try_get(2)?,
                amount: row.try_get(3)?,
            })
        })
        .collect()
}

/// Quantity and amount sold per dish category.
pub async fn sales_by_category(
    pool: &PgPool,
    range: &DateRange,
) -> Result<Vec<SalesLine>, PersistenceError> {
    let rows = sqlx::query(
        "SELECT d.category, SUM(i.quantity)::BIGINT, SUM(i.subtotal)::DOUBLE PRECISION \
        FROM order_items i JOIN orders o ON o.id = i.order_id JOIN dishes d ON d.id = i.dish_id \
        WHERE o.payment_status = $3 AND d.category IS NOT NULL AND d.category <> '' \
        AND ($1::TIMESTAMPTZ IS NULL OR o.created_at >= $1) AND ($2::TIMESTAMPTZ IS NULL OR o.created_at <= $2) \
        GROUP BY d.category ORDER BY d.category",
    )
    .bind(range.start)
    .bind(range.end)
    .bind(PaymentStatus::Paid.as_str())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(SalesLine {
                key: row.try_get(0)?,
                producer_name: None,
                count: row.try_get(1)?,
                amount: row.try_get(2)?,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registrations {
    pub total: i64,
    pub customers: i64,
    pub producers: i64,
}

pub async fn registrations(pool: &PgPool, range: &DateRange) -> Result<Registrations, PersistenceError> {
    let row = sqlx::query(&format!(
        "SELECT count(*), count(*) FILTER (WHERE role = $3), count(*) FILTER (WHERE role = $4) \
        FROM users WHERE {IN_RANGE}"
    ))
    .bind(range.start)
    .bind(range.end)
    .bind(Role::Customer.as_str())
    .bind(Role::Producer.as_str())
    .fetch_one(pool)
    .await?;

    Ok(Registrations {
        total: row.try_get(0)?,
        customers: row.try_get(1)?,
        producers: row.try_get(2)?,
    })
}

/// Active customers whose account changed since `since`.
pub async fn active_customers(pool: &PgPool, since: DateTime<Utc>) -> Result<i64, PersistenceError> {
    let row = sqlx::query("SELECT count(*) FROM users WHERE role = $1 AND is_active AND updated_at >= $2")
        .bind(Role::Customer.as_str())
        .bind(since)
        .fetch_one(pool)
        .await?;
    Ok(row.try_get(0)?)
}

/// Customers with more than one paid order.
pub async fn returning_customers(pool: &PgPool) -> Result<i64, PersistenceError> {
    let row = sqlx::query(
        "SELECT count(*) FROM (SELECT customer_id FROM orders WHERE payment_status = $1 \
        GROUP BY customer_id HAVING count(id) > 1) returning_customers",
    )
    .bind(PaymentStatus::Paid.as_str())
    .fetch_one(pool)
    .await?;
    Ok(row.try_get(0)?)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProducerOrders {
    pub total_orders: i64,
    pub completed_orders: i64,
    pub canceled_orders: i64,
    pub total_revenue: f64,
}

/// Paid orders of a kitchen in the period. Revenue counts delivered orders only.
pub async fn producer_orders(
    pool: &PgPool,
    producer_id: i64,
    range: &DateRange,
) -> Result<ProducerOrders, PersistenceError> {
    let row = sqlx::query(&format!(
        "SELECT count(*), count(*) FILTER (WHERE status = $5), count(*) FILTER (WHERE status = $6), \
        COALESCE(SUM(total_amount) FILTER (WHERE status = $5), 0)::DOUBLE PRECISION \
        FROM orders WHERE producer_id = $3 AND payment_status = $4 AND {IN_RANGE}"
    ))
    .bind(range.start)
    .bind(range.end)
    .bind(producer_id)
    .bind(PaymentStatus::Paid.as_str())
    .bind(OrderStatus::Delivered.as_str())
    .bind(OrderStatus::Canceled.as_str())
    .fetch_one(pool)
    .await?;

    Ok(ProducerOrders {
        total_orders: row.try_get(0)?,
        completed_orders: row.try_get(1)?,
        canceled_orders: row.try_get(2)?,
        total_revenue: row.try_get(3)?,
    })
}

/// Ratings of 2 or less among the 10 latest visible reviews of a kitchen.
pub async fn low_rated_recent_reviews(pool: &PgPool, producer_id: i64) -> Result<i64, PersistenceError> {
    let row = sqlx::query(
        "SELECT count(*) FROM (SELECT rating FROM reviews WHERE producer_id = $1 AND is_visible \
        ORDER BY created_at DESC, id DESC LIMIT 10) recent WHERE rating <= 2",
    )
    .bind(producer_id)
    .fetch_one(pool)
    .await?;
    Ok(row.try_get(0)?)
}

pub async fn delivered_timings(
    pool: &PgPool,
    range: &DateRange,
) -> Result<Vec<DeliveryTiming>, PersistenceError> {
    let sttm = format!(
        "SELECT created_at, delivered_at, estimated_delivery_time FROM orders \
        WHERE payment_status = $3 AND status = $4 AND {IN_RANGE}"
    );
    let mut rows = sqlx::query(&sttm)
        .bind(range.start)
        .bind(range.end)
        .bind(PaymentStatus::Paid.as_str())
        .bind(OrderStatus::Delivered.as_str())
        .fetch(pool);

    let mut timings = Vec::new();
    while let Some(row) = rows.try_next().await? {
        timings.push(DeliveryTiming {
            created: row.try_get(0)?,
            delivered: row.try_get(1)?,
            estimated: row.try_get(2)?,
        });
    }
    Ok(timings)
}

/// Paid orders in the period per status, every status included.
pub async fn status_distribution(
    pool: &PgPool,
    range: &DateRange,
) -> Result<Vec<(OrderStatus, i64)>, PersistenceError> {
    let rows = sqlx::query(&format!(
        "SELECT status, count(*) FROM orders WHERE payment_status = $3 AND {IN_RANGE} GROUP BY status"
    ))
    .bind(range.start)
    .bind(range.end)
    .bind(PaymentStatus::Paid.as_str())
    .fetch_all(pool)
    .await?;

    let mut counts: Vec<(OrderStatus, i64)> =
        OrderStatus::ALL.iter().map(|status| (*status, 0)).collect();
    for row in rows {
        let status: String = row.try_get(0)?;
        let count: i64 = row.try_get(1)?;
        if let Some(entry) = counts.iter_mut().find(|(known, _)| known.as_str() == status) {
            entry.1 = count;
        }
    }
    Ok(counts)
}
