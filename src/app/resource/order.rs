use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{dish::DishResponse, producer::ProducerResponse};
use crate::{
    base::resource_id,
    domain::{
        datatype::status::{OrderStatus, PaymentStatus},
        entity::{Entity, Order, OrderItem},
    },
};

#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
    pub cancel_reason: Option<String>,
}

resource_id!(StatusUpdate, "order::Status");

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RejectOrder {
    pub reason: Option<String>,
}

resource_id!(RejectOrder, "order::Rejection");

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItemResponse {
    pub id: i64,
    pub order_id: i64,
    pub dish_id: Option<i64>,
    pub dish_name: String,
    pub dish_price: f64,
    pub quantity: i32,
    pub subtotal: f64,
    pub dish: Option<DishResponse>,
}

impl OrderItemResponse {
    pub fn new(item: &OrderItem, dish: Option<DishResponse>) -> Self {
        let state = &item.state;
        Self {
            id: item.ident(),
            order_id: state.order_id,
            dish_id: state.dish_id,
            dish_name: state.dish_name.clone(),
            dish_price: state.dish_price,
            quantity: state.quantity,
            subtotal: state.subtotal,
            dish,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Milestone {
    pub status: OrderStatus,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tracking {
    pub status: OrderStatus,
    pub status_history: Vec<Milestone>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub tracking_url: Option<String>,
}

impl From<&Order> for Tracking {
    fn from(order: &Order) -> Self {
        Self {
            status: order.status(),
            status_history: order
                .timeline()
                .into_iter()
                .map(|(status, timestamp)| Milestone { status, timestamp })
                .collect(),
            estimated_delivery_time: order.state.estimated_delivery_time,
            tracking_url: order.state.tracking_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderResponse {
    pub id: i64,
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
    pub delivery_instructions: Option<String>,
    pub estimated_preparation_time: Option<i32>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub prepared_at: Option<DateTime<Utc>>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub tracking_url: Option<String>,
    pub items: Vec<OrderItemResponse>,
    pub producer: Option<ProducerResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking: Option<Tracking>,
}

resource_id!(OrderResponse, "order::Order");

impl OrderResponse {
    pub fn new(
        order: &Order,
        items: Vec<OrderItemResponse>,
        producer: Option<ProducerResponse>,
    ) -> Self {
        let state = &order.state;
        Self {
            id: order.ident(),
            order_number: state.order_number.clone(),
            customer_id: state.customer_id,
            producer_id: state.producer_id,
            status: state.status,
            payment_status: state.payment_status,
            payment_intent_id: state.payment_intent_id.clone(),
            subtotal: state.subtotal,
            delivery_charge: state.delivery_charge,
            tax: state.tax,
            total_amount: state.total_amount,
            delivery_address: state.delivery_address.clone(),
            delivery_instructions: state.delivery_instructions.clone(),
            estimated_preparation_time: state.estimated_preparation_time,
            estimated_delivery_time: state.estimated_delivery_time,
            prepared_at: state.prepared_at,
            dispatched_at: state.dispatched_at,
            delivered_at: state.delivered_at,
            canceled_at: state.canceled_at,
            cancel_reason: state.cancel_reason.clone(),
            tracking_url: state.tracking_url.clone(),
            items,
            producer,
            created_at: order.created(),
            updated_at: order.updated(),
            tracking: None,
        }
    }

    pub fn with_tracking(mut self, order: &Order) -> Self {
        self.tracking = Some(Tracking::from(order));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusTimeline {
    pub created: Option<DateTime<Utc>>,
    pub accepted: Option<DateTime<Utc>>,
    pub preparing: Option<DateTime<Utc>>,
    pub ready: Option<DateTime<Utc>>,
    pub dispatched: Option<DateTime<Utc>>,
    pub delivered: Option<DateTime<Utc>>,
}

/// Live view of an order on its way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackResponse {
    pub order_number: String,
    pub current_status: OrderStatus,
    pub status_timeline: StatusTimeline,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub eta_minutes: Option<i64>,
    pub delivery_address: Option<Value>,
    pub tracking_url: Option<String>,
    pub producer: Option<ProducerResponse>,
}

impl TrackResponse {
    pub fn new(order: &Order, producer: Option<ProducerResponse>, now: DateTime<Utc>) -> Self {
        let [created, accepted, preparing, ready, dispatched, delivered] =
            order.timeline().map(|(_, at)| at);
        Self {
            order_number: order.state.order_number.clone(),
            current_status: order.status(),
            status_timeline: StatusTimeline {
                created,
                accepted,
                preparing,
                ready,
                dispatched,
                delivered,
            },
            estimated_delivery_time: order.state.estimated_delivery_time,
            eta_minutes: order.eta_minutes(now),
            delivery_address: order.state.delivery_address.clone(),
            tracking_url: order.state.tracking_url.clone(),
            producer,
        }
    }
}
