use std::str::FromStr;

use sqlx::{postgres::PgRow, Row};

use super::entity::{
    cart::{CartItem, CartItemState},
    dish::{Dish, DishState},
    order::{Order, OrderItem, OrderItemState, OrderState},
    producer::{Producer, ProducerState},
    review::{Review, ReviewState},
    user::{Preferences, User, UserState},
    Address, EntityData,
};

type DecodeResult<T> = Result<T, sqlx::Error>;

/// Decode a TEXT column through `FromStr`.
fn parse_column<T>(row: &PgRow, column: &str) -> DecodeResult<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.try_get(column)?;
    text.parse().map_err(|err: T::Err| sqlx::Error::ColumnDecode {
        index: column.into(),
        source: Box::new(err),
    })
}

fn parse_optional<T>(row: &PgRow, column: &str) -> DecodeResult<Option<T>>
where
    T: FromStr,
{
    let text: Option<String> = row.try_get(column)?;
    Ok(text.and_then(|text| text.parse().ok()))
}

impl TryFrom<&PgRow> for EntityData {
    type Error = sqlx::Error;

    fn try_from(row: &PgRow) -> DecodeResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            created: row.try_get("created_at")?,
            updated: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<&PgRow> for Address {
    type Error = sqlx::Error;

    fn try_from(row: &PgRow) -> DecodeResult<Self> {
        Ok(Self {
            address_line1: row.try_get("address_line1")?,
            address_line2: row.try_get("address_line2")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            pincode: row.try_get("pincode")?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
        })
    }
}

impl TryFrom<&PgRow> for UserState {
    type Error = sqlx::Error;

    fn try_from(row: &PgRow) -> DecodeResult<Self> {
        Ok(Self {
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            password_hash: parse_column(row, "password_hash")?,
            role: parse_column(row, "role")?,
            is_active: row.try_get("is_active")?,
            preferences: Preferences {
                dietary_preferences: parse_optional(row, "dietary_preferences")?,
                dietary_restrictions: row.try_get("dietary_restrictions")?,
                allergens: row.try_get("allergens")?,
                spice_level: parse_optional(row, "spice_level")?,
                preferred_cuisines: row.try_get("preferred_cuisines")?,
                budget_preference: parse_optional(row, "budget_preference")?,
                meal_preferences: row.try_get("meal_preferences")?,
                delivery_time_windows: row.try_get("delivery_time_windows")?,
            },
            address: row.try_into()?,
        })
    }
}

impl TryFrom<&PgRow> for ProducerState {
    type Error = sqlx::Error;

    fn try_from(row: &PgRow) -> DecodeResult<Self> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            kitchen_name: row.try_get("kitchen_name")?,
            cuisine_specialty: row.try_get("cuisine_specialty")?,
            bio: row.try_get("bio")?,
            profile_photo_url: row.try_get("profile_photo_url")?,
            banner_url: row.try_get("banner_url")?,
            address: row.try_into()?,
            delivery_radius_km: row.try_get("delivery_radius_km")?,
            minimum_order_value: row.try_get("minimum_order_value")?,
            preparation_time_minutes: row.try_get("preparation_time_minutes")?,
            operating_hours: row.try_get("operating_hours")?,
            status: parse_column(row, "status")?,
            is_active: row.try_get("is_active")?,
            admin_notes: row.try_get("admin_notes")?,
            average_rating: row.try_get("average_rating")?,
            total_reviews: row.try_get("total_reviews")?,
            approved_at: row.try_get("approved_at")?,
        })
    }
}

impl TryFrom<&PgRow> for DishState {
    type Error = sqlx::Error;

    fn try_from(row: &PgRow) -> DecodeResult<Self> {
        Ok(Self {
            producer_id: row.try_get("producer_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            image_url: row.try_get("image_url")?,
            price: row.try_get("price")?,
            currency: row.try_get("currency")?,
            category: row.try_get("category")?,
            dietary_type: parse_optional(row, "dietary_type")?,
            spice_level: parse_optional(row, "spice_level")?,
            allergens: row.try_get("allergens")?,
            ingredients: row.try_get("ingredients")?,
            is_available: row.try_get("is_available")?,
            max_orders_per_day: row.try_get("max_orders_per_day")?,
            current_day_orders: row.try_get("current_day_orders")?,
            last_reset_date: row.try_get("last_reset_date")?,
            average_rating: row.try_get("average_rating")?,
            total_reviews: row.try_get("total_reviews")?,
            view_count: row.try_get("view_count")?,
            order_count: row.try_get("order_count")?,
            display_order: row.try_get("display_order")?,
        })
    }
}

impl TryFrom<&PgRow> for OrderState {
    type Error = sqlx::Error;

    fn try_from(row: &PgRow) -> DecodeResult<Self> {
        Ok(Self {
            order_number: row.try_get("order_number")?,
            customer_id: row.try_get("customer_id")?,
            producer_id: row.try_get("producer_id")?,
            status: parse_column(row, "status")?,
            payment_status: parse_column(row, "payment_status")?,
            payment_intent_id: row.try_get("payment_intent_id")?,
            subtotal: row.try_get("subtotal")?,
            delivery_charge: row.try_get("delivery_charge")?,
            tax: row.try_get("tax")?,
            total_amount: row.try_get("total_amount")?,
            delivery_address: row.try_get("delivery_address")?,
            delivery_latitude: row.try_get("delivery_latitude")?,
            delivery_longitude: row.try_get("delivery_longitude")?,
            delivery_instructions: row.try_get("delivery_instructions")?,
            estimated_preparation_time: row.try_get("estimated_preparation_time")?,
            estimated_delivery_time: row.try_get("estimated_delivery_time")?,
            prepared_at: row.try_get("prepared_at")?,
            dispatched_at: row.try_get("dispatched_at")?,
            delivered_at: row.try_get("delivered_at")?,
            canceled_at: row.try_get("canceled_at")?,
            cancel_reason: row.try_get("cancel_reason")?,
            tracking_url: row.try_get("tracking_url")?,
        })
    }
}

impl TryFrom<&PgRow> for OrderItemState {
    type Error = sqlx::Error;

    fn try_from(row: &PgRow) -> DecodeResult<Self> {
        Ok(Self {
            order_id: row.try_get("order_id")?,
            dish_id: row.try_get("dish_id")?,
            dish_name: row.try_get("dish_name")?,
            dish_price: row.try_get("dish_price")?,
            quantity: row.try_get("quantity")?,
            subtotal: row.try_get("subtotal")?,
        })
    }
}

impl TryFrom<&PgRow> for ReviewState {
    type Error = sqlx::Error;

    fn try_from(row: &PgRow) -> DecodeResult<Self> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            dish_id: row.try_get("dish_id")?,
            producer_id: row.try_get("producer_id")?,
            order_id: row.try_get("order_id")?,
            rating: row.try_get("rating")?,
            comment: row.try_get("comment")?,
            tags: row.try_get("tags")?,
            is_verified: row.try_get("is_verified")?,
            is_visible: row.try_get("is_visible")?,
            producer_response: row.try_get("producer_response")?,
            producer_response_at: row.try_get("producer_response_at")?,
        })
    }
}

impl TryFrom<&PgRow> for CartItemState {
    type Error = sqlx::Error;

    fn try_from(row: &PgRow) -> DecodeResult<Self> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            dish_id: row.try_get("dish_id")?,
            quantity: row.try_get("quantity")?,
        })
    }
}

macro_rules! restore_from_row {
    ($($entity:ident($state:ident)),+ $(,)?) => {
        $(
            impl TryFrom<&PgRow> for $entity {
                type Error = sqlx::Error;

                fn try_from(row: &PgRow) -> DecodeResult<Self> {
                    Ok(Self::restore(row.try_into()?, $state::try_from(row)?))
                }
            }
        )+
    };
}

restore_from_row! {
    User(UserState),
    Producer(ProducerState),
    Dish(DishState),
    Order(OrderState),
    OrderItem(OrderItemState),
    Review(ReviewState),
    CartItem(CartItemState),
}
