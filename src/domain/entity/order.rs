use chrono::{DateTime, Utc};
use derive_more::Display;
use rand_core::RngCore;
use serde_json::Value;

use crate::domain::datatype::status::{OrderStatus, PaymentStatus};

use super::{impl_entity, EntityData};

pub const ORDER_NUMBER_PREFIX: &str = "CP";
pub const DEFAULT_REJECT_REASON: &str = "Order rejected by producer";

#[derive(Debug, Clone, PartialEq)]
pub struct OrderState {
    pub order_number: String,
    pub customer_id: i64,
    pub producer_id: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_intent_id: Option<String>,
    pub subtotal: f64,
    pub delivery_charge: f64,
    pub tax: f64,
    pub total_amount: f64,
    pub delivery_address: Option<Value>,
    pub delivery_latitude: Option<f64>,
    pub delivery_longitude: Option<f64>,
    pub delivery_instructions: Option<String>,
    pub estimated_preparation_time: Option<i32>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub prepared_at: Option<DateTime<Utc>>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub tracking_url: Option<String>,
}

/// `CP` + UTC timestamp to the second + a random 4 digit suffix.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix = 1000 + rand_core::OsRng.next_u32() % 9000;
    format!("{ORDER_NUMBER_PREFIX}{}{suffix}", now.format("%Y%m%d%H%M%S"))
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[display(fmt = "Order is already {_0}")]
    AlreadyHandled(OrderStatus),
    #[display(fmt = "Cannot reject order with status {_0}")]
    NotRejectable(OrderStatus),
}

impl std::error::Error for TransitionError {}

#[derive(Debug, Clone)]
pub struct Order {
    pub(in crate::domain) data: EntityData,
    pub state: OrderState,
}

impl_entity!(Order, OrderState);

impl Order {
    pub fn customer_id(&self) -> i64 {
        self.state.customer_id
    }

    pub fn producer_id(&self) -> i64 {
        self.state.producer_id
    }

    pub fn status(&self) -> OrderStatus {
        self.state.status
    }

    /// Move to any status, stamping the matching milestone.
    pub fn set_status(&mut self, status: OrderStatus, now: DateTime<Utc>, cancel_reason: Option<String>) {
        self.state.status = status;
        match status {
            OrderStatus::Preparing => self.state.prepared_at = Some(now),
            OrderStatus::Ready => {
                self.state.prepared_at.get_or_insert(now);
            }
            OrderStatus::Dispatched => self.state.dispatched_at = Some(now),
            OrderStatus::Delivered => {
                self.state.delivered_at = Some(now);
                self.state.payment_status = PaymentStatus::Paid;
            }
            OrderStatus::Canceled => self.cancel(now, cancel_reason),
            OrderStatus::New | OrderStatus::Accepted => {}
        }
    }

    pub fn accept(&mut self) -> Result<(), TransitionError> {
        if self.state.status != OrderStatus::New {
            return Err(TransitionError::AlreadyHandled(self.state.status));
        }
        self.state.status = OrderStatus::Accepted;
        Ok(())
    }

    /// Kitchens may turn down orders they have not started cooking.
    pub fn reject(&mut self, now: DateTime<Utc>, reason: String) -> Result<(), TransitionError> {
        if !matches!(self.state.status, OrderStatus::New | OrderStatus::Accepted) {
            return Err(TransitionError::NotRejectable(self.state.status));
        }
        self.state.status = OrderStatus::Canceled;
        self.cancel(now, Some(reason));
        Ok(())
    }

    fn cancel(&mut self, now: DateTime<Utc>, reason: Option<String>) {
        self.state.canceled_at = Some(now);
        self.state.cancel_reason = reason;
        self.state.payment_status = PaymentStatus::Refunded;
    }

    /// Milestones in delivery order.
    ///
    /// `accepted` is approximated by the last update once the order left
    /// `new`, and `ready` by the preparation time.
    pub fn timeline(&self) -> [(OrderStatus, Option<DateTime<Utc>>); 6] {
        let state = &self.state;
        let past_new = state.status != OrderStatus::New;
        let past_ready = matches!(
            state.status,
            OrderStatus::Ready | OrderStatus::Dispatched | OrderStatus::Delivered
        );

        [
            (OrderStatus::New, Some(self.data.created)),
            (OrderStatus::Accepted, past_new.then_some(self.data.updated)),
            (OrderStatus::Preparing, state.prepared_at),
            (OrderStatus::Ready, state.prepared_at.filter(|_| past_ready)),
            (OrderStatus::Dispatched, state.dispatched_at),
            (OrderStatus::Delivered, state.delivered_at),
        ]
    }

    /// Whole minutes left until the estimated delivery, if still ahead.
    pub fn eta_minutes(&self, now: DateTime<Utc>) -> Option<i64> {
        self.state
            .estimated_delivery_time
            .filter(|eta| *eta > now)
            .map(|eta| (eta - now).num_seconds() / 60)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemState {
    pub order_id: i64,
    pub dish_id: Option<i64>,
    pub dish_name: String,
    pub dish_price: f64,
    pub quantity: i32,
    pub subtotal: f64,
}

#[derive(Debug, Clone)]
pub struct OrderItem {
    pub(in crate::domain) data: EntityData,
    pub state: OrderItemState,
}

impl_entity!(OrderItem, OrderItemState);

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    use super::*;

    fn order(status: OrderStatus) -> Order {
        Order::restore(
            EntityData::fixture(11),
            OrderState {
                order_number: "CP202405011200001234".into(),
                customer_id: 1,
                producer_id: 2,
                status,
                payment_status: PaymentStatus::Paid,
                payment_intent_id: Some("pi_demo_1".into()),
                subtotal: 20.0,
                delivery_charge: 5.0,
                tax: 4.0,
                total_amount: 29.0,
                delivery_address: None,
                delivery_latitude: None,
                delivery_longitude: None,
                delivery_instructions: None,
                estimated_preparation_time: Some(30),
                estimated_delivery_time: None,
                prepared_at: None,
                dispatched_at: None,
                delivered_at: None,
                canceled_at: None,
                cancel_reason: None,
                tracking_url: None,
            },
        )
    }

    #[test]
    fn order_number_format() {
        let now = chrono::TimeZone::with_ymd_and_hms(&Utc, 2024, 5, 1, 12, 30, 5).unwrap();
        let number = generate_order_number(now);

        assert_eq!(number.len(), 20);
        assert!(number.starts_with("CP20240501123005"));
        let suffix: u32 = number[16..].parse().unwrap();
        assert!((1000..=9999).contains(&suffix));
    }

    #[test]
    fn status_milestones() {
        let now = Utc::now();
        let mut order = order(OrderStatus::Accepted);

        order.set_status(OrderStatus::Ready, now, None);
        assert_eq!(order.state.prepared_at, Some(now));

        let later = now + Duration::minutes(5);
        order.set_status(OrderStatus::Ready, later, None);
        assert_eq!(order.state.prepared_at, Some(now));

        order.set_status(OrderStatus::Delivered, later, None);
        assert_eq!(order.state.delivered_at, Some(later));
        assert_eq!(order.state.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn cancel_refunds() {
        let now = Utc::now();
        let mut order = order(OrderStatus::Preparing);

        order.set_status(OrderStatus::Canceled, now, Some("Out of stock".into()));

        assert_eq!(order.state.payment_status, PaymentStatus::Refunded);
        assert_eq!(order.state.canceled_at, Some(now));
        assert_eq!(order.state.cancel_reason.as_deref(), Some("Out of stock"));
    }

    #[test]
    fn accept_only_new_orders() {
        let mut order = order(OrderStatus::New);
        assert_eq!(order.accept(), Ok(()));
        assert_eq!(order.status(), OrderStatus::Accepted);

        let err = order.accept().unwrap_err();
        assert_eq!(err.to_string(), "Order is already accepted");
    }

    #[test]
    fn reject_before_cooking() {
        let now = Utc::now();
        let mut accepted = order(OrderStatus::Accepted);
        assert_eq!(accepted.reject(now, DEFAULT_REJECT_REASON.into()), Ok(()));
        assert_eq!(accepted.status(), OrderStatus::Canceled);
        assert_eq!(accepted.state.payment_status, PaymentStatus::Refunded);

        let mut cooking = order(OrderStatus::Preparing);
        let err = cooking.reject(now, "late".into()).unwrap_err();
        assert_eq!(err.to_string(), "Cannot reject order with status preparing");
    }

    #[test]
    fn timeline_and_eta() {
        let now = Utc::now();
        let mut order = order(OrderStatus::New);
        assert_eq!(order.timeline()[1], (OrderStatus::Accepted, None));

        order.set_status(OrderStatus::Preparing, now, None);
        let timeline = order.timeline();
        assert!(timeline[1].1.is_some());
        assert_eq!(timeline[2], (OrderStatus::Preparing, Some(now)));
        assert_eq!(timeline[3], (OrderStatus::Ready, None));

        order.state.estimated_delivery_time = Some(now + Duration::seconds(25 * 60 + 30));
        assert_eq!(order.eta_minutes(now), Some(25));
        assert_eq!(order.eta_minutes(now + Duration::hours(1)), None);
    }
}
