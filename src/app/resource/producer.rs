use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{present, user::UserResponse};
use crate::{
    base::{resource_id, round2},
    domain::{
        datatype::status::ProducerStatus,
        entity::{Entity, Producer, User},
        pricing,
    },
};

/// Kitchen profile edit. `status` is only honoured for admins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProducerPatch {
    pub kitchen_name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub cuisine_specialty: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub profile_photo_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub banner_url: Option<Option<String>>,
    pub delivery_radius_km: Option<f64>,
    pub minimum_order_value: Option<f64>,
    pub preparation_time_minutes: Option<i32>,
    #[serde(default, deserialize_with = "present")]
    pub operating_hours: Option<Value>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub address_line1: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub address_line2: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub pincode: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub latitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub longitude: Option<Option<f64>>,
}

resource_id!(ProducerPatch, "producer::Producer");

#[derive(Debug, Clone, Default)]
pub struct ProducerQuery {
    pub status: Option<String>,
    pub city: Option<String>,
    pub cuisine_specialty: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct NearbyQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProducerResponse {
    pub id: i64,
    pub user_id: i64,
    pub kitchen_name: String,
    pub cuisine_specialty: Option<String>,
    pub bio: Option<String>,
    pub profile_photo_url: Option<String>,
    pub banner_url: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub delivery_radius_km: f64,
    pub minimum_order_value: f64,
    pub preparation_time_minutes: i32,
    pub operating_hours: Value,
    pub status: ProducerStatus,
    pub is_active: bool,
    pub average_rating: f64,
    pub total_reviews: i32,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub user: Option<UserResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

resource_id!(ProducerResponse, "producer::Producer");

impl ProducerResponse {
    pub fn new(producer: &Producer, owner: Option<&User>) -> Self {
        let state = &producer.state;
        Self {
            id: producer.ident(),
            user_id: state.user_id,
            kitchen_name: state.kitchen_name.clone(),
            cuisine_specialty: state.cuisine_specialty.clone(),
            bio: state.bio.clone(),
            profile_photo_url: state.profile_photo_url.clone(),
            banner_url: state.banner_url.clone(),
            address_line1: state.address.address_line1.clone(),
            address_line2: state.address.address_line2.clone(),
            city: state.address.city.clone(),
            state: state.address.state.clone(),
            pincode: state.address.pincode.clone(),
            latitude: state.address.latitude,
            longitude: state.address.longitude,
            delivery_radius_km: state.delivery_radius_km,
            minimum_order_value: pricing::display_minimum(state.minimum_order_value),
            preparation_time_minutes: state.preparation_time_minutes,
            operating_hours: state
                .operating_hours
                .clone()
                .unwrap_or_else(|| Value::Object(Default::default())),
            status: state.status,
            is_active: state.is_active,
            average_rating: state.average_rating,
            total_reviews: state.total_reviews,
            created_at: producer.created(),
            approved_at: state.approved_at,
            user: owner.map(UserResponse::from),
            distance_km: None,
        }
    }

    pub fn at_distance(mut self, distance_km: f64) -> Self {
        self.distance_km = Some(round2(distance_km));
        self
    }
}
