//! Money rules of the marketplace.
//!
//! Kitchens historically entered prices in rupees while checkout charges
//! pounds. A price is treated as rupees when its currency says so, or
//! when no currency is set and the amount is above [`INR_THRESHOLD`].

use chrono::{DateTime, Duration, Utc};
use derive_more::Display;
use serde::Serialize;

use super::geo;
use crate::base::round2;

pub const INR: &str = "INR";
pub const GBP: &str = "GBP";
pub const INR_PER_GBP: f64 = 100.0;
pub const INR_THRESHOLD: f64 = 50.0;

pub const TAX_RATE: f64 = 0.20;
pub const DEFAULT_DELIVERY_CHARGE: f64 = 5.0;
pub const MIN_DELIVERY_CHARGE: f64 = 3.0;
pub const DELIVERY_CHARGE_PER_KM: f64 = 2.0;
/// Travel allowance when the distance is unknown.
pub const UNKNOWN_DISTANCE_MINUTES: i64 = 30;

pub fn is_rupees(price: f64, currency: Option<&str>) -> bool {
    match currency {
        Some(currency) => currency == INR,
        None => price > INR_THRESHOLD,
    }
}

/// Price charged at checkout, in pounds.
pub fn gbp_price(price: f64, currency: Option<&str>) -> f64 {
    if is_rupees(price, currency) {
        round2(price / INR_PER_GBP)
    } else {
        price
    }
}

/// Price and currency shown to clients.
pub fn display_price(price: f64, currency: Option<&str>) -> (f64, Option<String>) {
    if is_rupees(price, currency) {
        (round2(price / INR_PER_GBP), Some(GBP.into()))
    } else {
        (price, currency.map(String::from))
    }
}

/// Minimum order values above the threshold were entered in rupees.
pub fn display_minimum(value: f64) -> f64 {
    if value > INR_THRESHOLD {
        round2(value / INR_PER_GBP)
    } else {
        value
    }
}

pub fn delivery_charge(distance_km: Option<f64>) -> f64 {
    match distance_km {
        Some(distance) => MIN_DELIVERY_CHARGE.max(distance * DELIVERY_CHARGE_PER_KM),
        None => DEFAULT_DELIVERY_CHARGE,
    }
}

pub fn estimated_delivery(
    now: DateTime<Utc>,
    preparation_minutes: i32,
    distance_km: Option<f64>,
) -> DateTime<Utc> {
    let minutes = match distance_km {
        Some(distance) => geo::delivery_minutes(distance, preparation_minutes),
        None => preparation_minutes as i64 + UNKNOWN_DISTANCE_MINUTES,
    };
    now + Duration::minutes(minutes)
}

#[derive(Debug, Display, Clone, PartialEq)]
pub enum PricingError {
    #[display(fmt = "Minimum order value is £{_0:.2}")]
    BelowMinimum(f64),
    #[display(fmt = "Delivery address is outside service radius ({_0:?} km)")]
    OutsideRadius(f64),
}

impl std::error::Error for PricingError {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteLine {
    pub dish_id: i64,
    pub dish_name: String,
    pub quantity: i32,
    /// Unit price in pounds.
    pub price: f64,
    pub subtotal: f64,
}

impl QuoteLine {
    pub fn new(dish_id: i64, dish_name: String, quantity: i32, price: f64) -> Self {
        Self {
            dish_id,
            dish_name,
            quantity,
            price,
            subtotal: price * quantity as f64,
        }
    }
}

/// Totals of a single kitchen cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub subtotal: f64,
    pub delivery_charge: f64,
    pub tax: f64,
    pub total: f64,
    pub items: Vec<QuoteLine>,
    #[serde(skip)]
    pub distance_km: Option<f64>,
}

impl Quote {
    pub fn new(items: Vec<QuoteLine>, distance_km: Option<f64>) -> Self {
        let subtotal: f64 = items.iter().map(|line| line.subtotal).sum();
        let delivery_charge = delivery_charge(distance_km);
        let tax = subtotal * TAX_RATE;
        Self {
            subtotal,
            delivery_charge,
            tax,
            total: subtotal + delivery_charge + tax,
            items,
            distance_km,
        }
    }

    /// Amount in pence, truncated as payment providers expect integers.
    pub fn amount_pence(&self) -> i64 {
        (self.total * 100.0) as i64
    }

    /// `minimum` is the stored kitchen minimum, before display conversion.
    pub fn check_minimum(&self, minimum: f64) -> Result<(), PricingError> {
        let minimum = display_minimum(minimum);
        if self.subtotal < minimum {
            return Err(PricingError::BelowMinimum(minimum));
        }
        Ok(())
    }

    pub fn check_radius(&self, radius_km: f64) -> Result<(), PricingError> {
        match self.distance_km {
            Some(distance) if distance > radius_km => Err(PricingError::OutsideRadius(radius_km)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn rupee_detection() {
        assert!(is_rupees(20.0, Some("INR")));
        assert!(is_rupees(250.0, None));
        assert!(!is_rupees(12.5, None));
        assert!(!is_rupees(250.0, Some("GBP")));
    }

    #[test]
    fn displayed_prices() {
        assert_eq!(display_price(1299.0, Some("INR")), (12.99, Some("GBP".into())));
        assert_eq!(display_price(350.0, None), (3.5, Some("GBP".into())));
        assert_eq!(display_price(8.5, None), (8.5, None));
        assert_eq!(display_price(8.5, Some("GBP")), (8.5, Some("GBP".into())));
        assert_eq!(display_minimum(1500.0), 15.0);
        assert_eq!(display_minimum(10.0), 10.0);
    }

    #[test]
    fn delivery_charges() {
        assert_eq!(delivery_charge(None), 5.0);
        assert_eq!(delivery_charge(Some(1.0)), 3.0);
        assert_eq!(delivery_charge(Some(4.0)), 8.0);
    }

    #[test]
    fn quote_totals() {
        let quote = Quote::new(
            vec![
                QuoteLine::new(1, "Dal Makhani".into(), 2, 10.0),
                QuoteLine::new(2, "Naan".into(), 1, 5.0),
            ],
            None,
        );

        assert_eq!(quote.subtotal, 25.0);
        assert_eq!(quote.delivery_charge, 5.0);
        assert_eq!(quote.tax, 5.0);
        assert_eq!(quote.total, 35.0);
        assert_eq!(quote.amount_pence(), 3500);
        assert_eq!(quote.items[0].subtotal, 20.0);
    }

    #[test]
    fn minimum_and_radius() {
        let quote = Quote::new(vec![QuoteLine::new(1, "Idli".into(), 1, 4.0)], Some(6.0));

        assert_eq!(quote.check_minimum(300.0), Ok(()));
        assert_eq!(quote.check_minimum(4.0), Ok(()));
        let err = quote.check_minimum(1000.0).unwrap_err();
        assert_eq!(err.to_string(), "Minimum order value is £10.00");

        assert_eq!(quote.check_radius(10.0), Ok(()));
        let err = quote.check_radius(5.0).unwrap_err();
        assert_eq!(err.to_string(), "Delivery address is outside service radius (5.0 km)");
    }

    #[test]
    fn delivery_estimate() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        assert_eq!(
            estimated_delivery(now, 30, Some(2.5)),
            now + Duration::minutes(55)
        );
        assert_eq!(estimated_delivery(now, 30, None), now + Duration::minutes(60));
    }
}
