use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    base::{resource_id, round2},
    domain::report::{percentage, DeliveryStats, SalesSummary},
    infra::database::repository::report::{ProducerOrders, Registrations, SalesLine},
};

/// Optional reason of a moderation action.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Moderation {
    pub reason: Option<String>,
}

resource_id!(Moderation, "admin::Moderation");

#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub role: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewQuery {
    pub min_rating: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Requested period, echoed as sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Period {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl From<ReportQuery> for Period {
    fn from(query: ReportQuery) -> Self {
        Self {
            start_date: query.start_date,
            end_date: query.end_date,
        }
    }
}

fn keyed(lines: Vec<SalesLine>) -> BTreeMap<String, SalesLine> {
    lines.into_iter().map(|line| (line.key.clone(), line)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesReport {
    pub period: Period,
    pub summary: SalesSummary,
    pub producer_sales: BTreeMap<String, SalesLine>,
    pub category_performance: BTreeMap<String, SalesLine>,
}

impl SalesReport {
    pub fn new(
        period: Period,
        summary: SalesSummary,
        producers: Vec<SalesLine>,
        categories: Vec<SalesLine>,
    ) -> Self {
        Self {
            period,
            summary,
            producer_sales: keyed(producers),
            category_performance: keyed(categories),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveUsers {
    pub active_customers_last_30_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserGrowth {
    pub period: Period,
    pub new_registrations: Registrations,
    pub active_users: ActiveUsers,
    pub returning_customers: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProducerPerformance {
    pub producer_id: i64,
    pub kitchen_name: String,
    pub cuisine_specialty: Option<String>,
    pub total_orders: i64,
    pub completed_orders: i64,
    pub canceled_orders: i64,
    pub total_revenue: f64,
    pub average_rating: f64,
    pub total_reviews: i32,
    pub low_rated_recent_reviews: i64,
    pub completion_rate: f64,
    pub cancelation_rate: f64,
}

impl ProducerPerformance {
    pub fn new(
        producer_id: i64,
        kitchen_name: String,
        cuisine_specialty: Option<String>,
        (average_rating, total_reviews): (f64, i32),
        orders: ProducerOrders,
        low_rated_recent_reviews: i64,
    ) -> Self {
        Self {
            producer_id,
            kitchen_name,
            cuisine_specialty,
            total_orders: orders.total_orders,
            completed_orders: orders.completed_orders,
            canceled_orders: orders.canceled_orders,
            total_revenue: orders.total_revenue,
            average_rating,
            total_reviews,
            low_rated_recent_reviews,
            completion_rate: percentage(orders.completed_orders, orders.total_orders),
            cancelation_rate: percentage(orders.canceled_orders, orders.total_orders),
        }
    }
}

/// Highest revenue first.
pub fn rank_by_revenue(performance: &mut [ProducerPerformance]) {
    performance.sort_by(|a, b| b.total_revenue.total_cmp(&a.total_revenue));
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryMetrics {
    pub period: Period,
    #[serde(flatten)]
    pub stats: DeliveryStats,
    pub status_distribution: BTreeMap<&'static str, i64>,
}

impl DeliveryMetrics {
    pub fn new(
        period: Period,
        stats: DeliveryStats,
        distribution: Vec<(crate::domain::datatype::status::OrderStatus, i64)>,
    ) -> Self {
        Self {
            period,
            stats,
            status_distribution: distribution
                .into_iter()
                .map(|(status, count)| (status.as_str(), count))
                .collect(),
        }
    }
}

/// Sales summary with the amounts rounded for display.
pub fn summary(total_sales: f64, total_orders: i64) -> SalesSummary {
    let summary = SalesSummary::new(total_sales, total_orders);
    SalesSummary {
        total_sales: round2(summary.total_sales),
        avg_order_value: round2(summary.avg_order_value),
        ..summary
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::domain::datatype::status::OrderStatus;

    fn orders(total: i64, completed: i64, canceled: i64, revenue: f64) -> ProducerOrders {
        ProducerOrders {
            total_orders: total,
            completed_orders: completed,
            canceled_orders: canceled,
            total_revenue: revenue,
        }
    }

    #[test]
    fn performance_rates_and_rank() {
        let mut ranked = vec![
            ProducerPerformance::new(1, "Amma".into(), None, (4.5, 2), orders(4, 3, 1, 60.0), 0),
            ProducerPerformance::new(2, "Dosa Hut".into(), None, (0.0, 0), orders(0, 0, 0, 0.0), 0),
            ProducerPerformance::new(3, "Tandoor".into(), None, (3.0, 1), orders(2, 2, 0, 80.0), 1),
        ];
        rank_by_revenue(&mut ranked);

        let ids: Vec<i64> = ranked.iter().map(|p| p.producer_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(ranked[1].completion_rate, 75.0);
        assert_eq!(ranked[1].cancelation_rate, 25.0);
        assert_eq!(ranked[2].completion_rate, 0.0);
    }

    #[test]
    fn sales_report_body() {
        let report = SalesReport::new(
            Period {
                start_date: Some("2024-01-01".into()),
                end_date: None,
            },
            summary(100.0, 3),
            vec![SalesLine {
                key: "7".into(),
                count: 3,
                amount: 100.0,
                producer_name: Some("Amma".into()),
            }],
            vec![SalesLine {
                key: "Curry".into(),
                count: 5,
                amount: 60.0,
                producer_name: None,
            }],
        );

        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "period": { "start_date": "2024-01-01", "end_date": null },
                "summary": { "total_sales": 100.0, "total_orders": 3, "avg_order_value": 33.33 },
                "producer_sales": { "7": { "count": 3, "amount": 100.0, "producer_name": "Amma" } },
                "category_performance": { "Curry": { "count": 5, "amount": 60.0 } }
            })
        );
    }

    #[test]
    fn delivery_metrics_body() {
        let metrics = DeliveryMetrics::new(
            Period::default(),
            DeliveryStats::measure(&[]),
            vec![(OrderStatus::New, 2), (OrderStatus::Delivered, 0)],
        );
        let body = serde_json::to_value(&metrics).unwrap();

        assert_eq!(body["total_delivered_orders"], json!(0));
        assert_eq!(body["status_distribution"], json!({ "delivered": 0, "new": 2 }));
    }
}
