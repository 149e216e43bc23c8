//! Figures shared by the admin reports.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use derive_more::Display;
use serde::Serialize;

use crate::base::round2;

/// Delivered later than estimated by more than this is late.
pub const LATE_DELIVERY_BUFFER_MINUTES: f64 = 15.0;

#[derive(Debug, Display, Clone, PartialEq, Eq)]
#[display(fmt = "Invalid {field}: {value:?}, expected an ISO 8601 date")]
pub struct InvalidDate {
    pub field: &'static str,
    pub value: String,
}

impl std::error::Error for InvalidDate {}

/// Parse an ISO 8601 date or date time. Values without an offset are UTC.
pub fn parse_date(field: &'static str, value: &str) -> Result<DateTime<Utc>, InvalidDate> {
    let value = value.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&datetime));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| Utc.from_utc_datetime(&datetime))
        .ok_or_else(|| InvalidDate {
            field,
            value: value.into(),
        })
}

/// Reporting period, both ends inclusive and optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, InvalidDate> {
        Ok(Self {
            start: start.map(|value| parse_date("start_date", value)).transpose()?,
            end: end.map(|value| parse_date("end_date", value)).transpose()?,
        })
    }
}

/// Percentage of `part` in `total`, 0 for an empty total.
pub fn percentage(part: i64, total: i64) -> f64 {
    if total > 0 {
        part as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesSummary {
    pub total_sales: f64,
    pub total_orders: i64,
    pub avg_order_value: f64,
}

impl SalesSummary {
    pub fn new(total_sales: f64, total_orders: i64) -> Self {
        let avg_order_value = if total_orders > 0 {
            total_sales / total_orders as f64
        } else {
            0.0
        };
        Self {
            total_sales,
            total_orders,
            avg_order_value,
        }
    }
}

/// Timestamps of a delivered order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryTiming {
    pub created: DateTime<Utc>,
    pub delivered: Option<DateTime<Utc>>,
    pub estimated: Option<DateTime<Utc>>,
}

fn minutes_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 60_000.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryStats {
    pub average_delivery_time_minutes: f64,
    pub total_delivered_orders: usize,
    pub late_deliveries: usize,
    pub on_time_rate: f64,
}

impl DeliveryStats {
    pub fn measure(orders: &[DeliveryTiming]) -> Self {
        let mut durations = Vec::with_capacity(orders.len());
        let mut late = 0;

        for order in orders {
            let Some(delivered) = order.delivered else {
                continue;
            };
            let actual = minutes_between(order.created, delivered);
            durations.push(actual);

            if let Some(estimated) = order.estimated {
                let promised = minutes_between(order.created, estimated);
                if actual > promised + LATE_DELIVERY_BUFFER_MINUTES {
                    late += 1;
                }
            }
        }

        let average = if durations.is_empty() {
            0.0
        } else {
            durations.iter().sum::<f64>() / durations.len() as f64
        };

        Self {
            average_delivery_time_minutes: round2(average),
            total_delivered_orders: orders.len(),
            late_deliveries: late,
            on_time_rate: percentage(
                orders.len() as i64 - late as i64,
                orders.len() as i64,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_iso_dates() {
        let midnight = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date("start_date", "2024-03-01"), Ok(midnight));
        assert_eq!(
            parse_date("start_date", "2024-03-01T12:30:00"),
            Ok(midnight + Duration::minutes(750))
        );
        assert_eq!(
            parse_date("end_date", "2024-03-01T12:30:00+01:00"),
            Ok(midnight + Duration::minutes(690))
        );

        let err = DateRange::parse(Some("2024-03-01"), Some("yesterday")).unwrap_err();
        assert_eq!(err.field, "end_date");
        assert_eq!(DateRange::parse(None, None), Ok(DateRange::default()));
    }

    #[test]
    fn sales_average() {
        assert_eq!(SalesSummary::new(90.0, 3).avg_order_value, 30.0);
        assert_eq!(SalesSummary::new(0.0, 0).avg_order_value, 0.0);
    }

    #[test]
    fn late_deliveries() {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let timing = |actual: i64, estimated: Option<i64>| DeliveryTiming {
            created,
            delivered: Some(created + Duration::minutes(actual)),
            estimated: estimated.map(|minutes| created + Duration::minutes(minutes)),
        };

        let stats = DeliveryStats::measure(&[
            timing(40, Some(45)),
            timing(61, Some(45)),
            timing(60, Some(45)),
            timing(30, None),
        ]);

        assert_eq!(stats.total_delivered_orders, 4);
        assert_eq!(stats.late_deliveries, 1);
        assert_eq!(stats.average_delivery_time_minutes, 47.75);
        assert_eq!(stats.on_time_rate, 75.0);
    }

    #[test]
    fn empty_delivery_stats() {
        let stats = DeliveryStats::measure(&[]);
        assert_eq!(stats.average_delivery_time_minutes, 0.0);
        assert_eq!(stats.on_time_rate, 0.0);
    }
}
