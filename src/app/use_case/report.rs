//! Admin reports over a date range.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use super::{admin::ADMIN, authorize};
use crate::{
    app::resource::{
        admin::{
            rank_by_revenue, summary, ActiveUsers, DeliveryMetrics, Period, ProducerPerformance, ReportQuery,
            SalesReport, UserGrowth,
        },
        Keyed,
    },
    domain::{
        datatype::status::ProducerStatus,
        entity::Entity,
        report::{DateRange, DeliveryStats},
        service::TokenEncryptionService,
    },
    error::app::ApplicationError,
    infra::database::repository::{producer, report},
};

const ACTIVE_WINDOW_DAYS: i64 = 30;

fn date_range(query: &ReportQuery) -> Result<DateRange, ApplicationError> {
    DateRange::parse(
        query.start_date.as_deref().filter(|date| !date.is_empty()),
        query.end_date.as_deref().filter(|date| !date.is_empty()),
    )
    .map_err(|err| ApplicationError::operation(err.to_string()))
}

/// Paid sales in the period, per kitchen and per dish category.
pub async fn sales<TS>(pool: &PgPool, token_service: &TS, token: &str, query: ReportQuery) -> Result<Keyed<SalesReport>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    authorize(pool, token_service, token, ADMIN).await?;
    let range = date_range(&query)?;

    let (total_sales, total_orders) = report::paid_sales(pool, &range).await?;
    let producers = report::sales_by_producer(pool, &range).await?;
    let categories = report::sales_by_category(pool, &range).await?;

    Ok(Keyed(
        "report",
        SalesReport::new(Period::from(query), summary(total_sales, total_orders), producers, categories),
    ))
}

pub async fn user_growth<TS>(pool: &PgPool, token_service: &TS, token: &str, query: ReportQuery) -> Result<Keyed<UserGrowth>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    authorize(pool, token_service, token, ADMIN).await?;
    let range = date_range(&query)?;

    let new_registrations = report::registrations(pool, &range).await?;
    let active = report::active_customers(pool, Utc::now() - Duration::days(ACTIVE_WINDOW_DAYS)).await?;
    let returning_customers = report::returning_customers(pool).await?;

    Ok(Keyed(
        "user_growth",
        UserGrowth {
            period: Period::from(query),
            new_registrations,
            active_users: ActiveUsers {
                active_customers_last_30_days: active,
            },
            returning_customers,
        },
    ))
}

/// Trading kitchens ranked by delivered revenue.
pub async fn producer_performance<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    query: ReportQuery,
) -> Result<Keyed<Vec<ProducerPerformance>>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    authorize(pool, token_service, token, ADMIN).await?;
    let range = date_range(&query)?;

    let kitchens = producer::producers_with_status(pool, ProducerStatus::Approved).await?;
    let mut performance = Vec::with_capacity(kitchens.len());
    for kitchen in kitchens.iter().filter(|kitchen| kitchen.is_trading()) {
        let orders = report::producer_orders(pool, kitchen.ident(), &range).await?;
        let low_rated = report::low_rated_recent_reviews(pool, kitchen.ident()).await?;
        performance.push(ProducerPerformance::new(
            kitchen.ident(),
            kitchen.state.kitchen_name.clone(),
            kitchen.state.cuisine_specialty.clone(),
            (kitchen.state.average_rating, kitchen.state.total_reviews),
            orders,
            low_rated,
        ));
    }
    rank_by_revenue(&mut performance);

    Ok(Keyed("producer_performance", performance))
}

pub async fn delivery_metrics<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    query: ReportQuery,
) -> Result<Keyed<DeliveryMetrics>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    authorize(pool, token_service, token, ADMIN).await?;
    let range = date_range(&query)?;

    let timings = report::delivered_timings(pool, &range).await?;
    let distribution = report::status_distribution(pool, &range).await?;

    Ok(Keyed(
        "delivery_metrics",
        DeliveryMetrics::new(Period::from(query), DeliveryStats::measure(&timings), distribution),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_dates_are_open_ends() {
        let range = date_range(&ReportQuery {
            start_date: Some(String::new()),
            end_date: None,
        })
        .unwrap();
        assert_eq!(range, DateRange::default());
    }

    #[test]
    fn invalid_date_is_rejected() {
        let query = ReportQuery {
            start_date: Some("last tuesday".into()),
            end_date: None,
        };
        assert!(date_range(&query).is_err());
    }
}
