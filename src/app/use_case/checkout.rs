use std::collections::HashMap;

use chrono::Utc;
use sqlx::PgPool;

use super::{authorize, cart::refresh_window, notify, order_view, ANY_ROLE};
use crate::{
    app::resource::{
        checkout::{ConfirmOrder, DeliveryAddress, PaymentIntentRequest, PaymentIntentResponse},
        order::OrderResponse,
        Message,
    },
    domain::{
        datatype::status::{OrderStatus, PaymentStatus},
        entity::{
            order::{generate_order_number, OrderState},
            Dish, Entity, Producer, User,
        },
        notification,
        pricing::{self, Quote, QuoteLine},
        service::{Mailer, PaymentGateway, PaymentRequest, TokenEncryptionService},
    },
    error::app::ApplicationError,
    infra::database::repository::{cart, dish, order, producer, user},
};

pub const CURRENCY: &str = "gbp";

/// Price the caller's cart for delivery to `address`.
async fn quote_cart(
    pool: &PgPool,
    customer: &User,
    address: &DeliveryAddress,
) -> Result<(Producer, Quote), ApplicationError> {
    let items = cart::user_cart(pool, customer.ident()).await?;
    if items.is_empty() {
        return Err(ApplicationError::operation("Cart is empty"));
    }

    let mut dishes: HashMap<i64, Dish> = dish::find_dishes(pool, items.iter().map(|item| item.dish_id()))
        .await?
        .into_iter()
        .map(|found| (found.ident(), found))
        .collect();

    let mut producer_id = None;
    let mut lines = Vec::with_capacity(items.len());
    for item in &items {
        let found = match dishes.get_mut(&item.dish_id()) {
            Some(found) if found.state.is_available => found,
            _ => {
                return Err(ApplicationError::operation(format!(
                    "Dish {} is not available",
                    item.dish_id()
                )))
            }
        };
        refresh_window(pool, found).await?;
        if !found.can_order(item.quantity()) {
            return Err(ApplicationError::operation(format!(
                "Dish {} cannot be ordered (daily limit reached)",
                found.name()
            )));
        }

        match producer_id {
            None => producer_id = Some(found.producer_id()),
            Some(id) if id != found.producer_id() => {
                return Err(ApplicationError::operation("All items must be from the same producer"))
            }
            Some(_) => {}
        }
        lines.push(QuoteLine::new(
            found.ident(),
            found.name().to_string(),
            item.quantity(),
            found.gbp_price(),
        ));
    }

    let kitchen = match producer_id {
        Some(id) => producer::find_producer(pool, id).await?,
        None => None,
    }
    .filter(Producer::is_trading)
    .ok_or_else(|| ApplicationError::operation("Producer is not available"))?;

    let distance = match (address.coordinates(), kitchen.coordinates()) {
        (Some(destination), Some(origin)) => Some(origin.distance_km(&destination)),
        _ => None,
    };
    let quote = Quote::new(lines, distance);
    quote
        .check_minimum(kitchen.state.minimum_order_value)
        .map_err(|err| ApplicationError::operation(err.to_string()))?;

    Ok((kitchen, quote))
}

/// Open a payment for the caller's cart.
pub async fn create_payment_intent<TS>(
    pool: &PgPool,
    token_service: &TS,
    gateway: &dyn PaymentGateway,
    token: &str,
    form: PaymentIntentRequest,
) -> Result<PaymentIntentResponse, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, ANY_ROLE).await?;
    let (kitchen, quote) = quote_cart(pool, &caller, &form.delivery_address).await?;
    quote
        .check_radius(kitchen.state.delivery_radius_km)
        .map_err(|err| ApplicationError::operation(err.to_string()))?;

    let intent = gateway
        .create_intent(PaymentRequest {
            amount: quote.amount_pence(),
            currency: CURRENCY,
            metadata: vec![
                ("user_id", caller.ident().to_string()),
                ("producer_id", kitchen.ident().to_string()),
                ("order_subtotal", quote.subtotal.to_string()),
                ("delivery_charge", quote.delivery_charge.to_string()),
                ("tax", quote.tax.to_string()),
            ],
        })
        .await?;
    tracing::info!(user = caller.ident(), intent = %intent.id, amount = intent.amount, "payment intent created");

    Ok(PaymentIntentResponse {
        payment_intent_id: intent.id,
        client_secret: intent.client_secret,
        amount: intent.amount,
        currency: intent.currency,
        order_summary: quote,
    })
}

/// Turn the paid cart into an order.
pub async fn confirm_order<TS>(
    pool: &PgPool,
    token_service: &TS,
    gateway: &dyn PaymentGateway,
    mailer: &dyn Mailer,
    token: &str,
    form: ConfirmOrder,
) -> Result<Message<OrderResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, ANY_ROLE).await?;
    let payment_intent_id = form
        .payment_intent_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApplicationError::operation("payment_intent_id is required"))?;

    let (kitchen, quote) = quote_cart(pool, &caller, &form.delivery_address).await?;

    let payment_status = match gateway.retrieve_intent(&payment_intent_id).await {
        Ok(intent) if intent.succeeded() => PaymentStatus::Paid,
        Ok(intent) => {
            tracing::info!(intent = %intent.id, status = %intent.status, "payment not completed");
            PaymentStatus::Failed
        }
        Err(err) => {
            tracing::warn!(intent = %payment_intent_id, "payment verification failed, accepting order: {err}");
            PaymentStatus::Paid
        }
    };

    let now = Utc::now();
    let preparation = kitchen.state.preparation_time_minutes;
    let state = OrderState {
        order_number: generate_order_number(now),
        customer_id: caller.ident(),
        producer_id: kitchen.ident(),
        status: OrderStatus::New,
        payment_status,
        payment_intent_id: Some(payment_intent_id),
        subtotal: quote.subtotal,
        delivery_charge: quote.delivery_charge,
        tax: quote.tax,
        total_amount: quote.total,
        delivery_address: form.delivery_address.as_json(),
        delivery_latitude: form.delivery_address.latitude(),
        delivery_longitude: form.delivery_address.longitude(),
        delivery_instructions: form.delivery_instructions,
        estimated_preparation_time: Some(preparation),
        estimated_delivery_time: Some(pricing::estimated_delivery(now, preparation, quote.distance_km)),
        prepared_at: None,
        dispatched_at: None,
        delivered_at: None,
        canceled_at: None,
        cancel_reason: None,
        tracking_url: None,
    };

    let (placed, items) = order::place_order(pool, &state, &quote.items, now.date_naive()).await?;
    tracing::info!(
        order = placed.ident(),
        number = %placed.state.order_number,
        payment = %placed.state.payment_status,
        "order placed"
    );

    notify(mailer, notification::order_confirmation(&caller, &placed));
    match user::find_user(pool, kitchen.user_id()).await? {
        Some(owner) => notify(mailer, notification::new_order_for_producer(&owner, &placed, items.len())),
        None => tracing::warn!(producer = kitchen.ident(), "kitchen owner not found, skipping new order mail"),
    }

    Ok(Message::with(
        "Order confirmed successfully",
        "order",
        order_view(pool, &placed).await?,
    ))
}
