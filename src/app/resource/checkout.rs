use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    base::resource_id,
    domain::{geo::Coordinates, pricing::Quote},
};

/// Delivery address as sent by the client, kept verbatim on the order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeliveryAddress(pub Option<Value>);

impl DeliveryAddress {
    fn number(&self, key: &str) -> Option<f64> {
        let value = self.0.as_ref()?.get(key)?;
        value
            .as_f64()
            .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
    }

    /// A zero or missing part means the position is unknown.
    pub fn coordinates(&self) -> Option<Coordinates> {
        let latitude = self.number("latitude").filter(|value| *value != 0.0);
        let longitude = self.number("longitude").filter(|value| *value != 0.0);
        Coordinates::from_parts(latitude, longitude)
    }

    pub fn latitude(&self) -> Option<f64> {
        self.number("latitude")
    }

    pub fn longitude(&self) -> Option<f64> {
        self.number("longitude")
    }

    pub fn as_json(&self) -> Option<Value> {
        self.0.clone().filter(|value| !value.is_null())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentIntentRequest {
    #[serde(default)]
    pub delivery_address: DeliveryAddress,
}

resource_id!(PaymentIntentRequest, "checkout::PaymentIntent");

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmOrder {
    pub payment_intent_id: Option<String>,
    #[serde(default)]
    pub delivery_address: DeliveryAddress,
    pub delivery_instructions: Option<String>,
}

resource_id!(ConfirmOrder, "checkout::ConfirmOrder");

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentIntentResponse {
    pub payment_intent_id: String,
    pub client_secret: Option<String>,
    /// In pence.
    pub amount: i64,
    pub currency: String,
    pub order_summary: Quote,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn delivery_coordinates() {
        let request: PaymentIntentRequest = serde_json::from_value(json!({
            "delivery_address": { "line1": "1 High St", "latitude": 51.5, "longitude": "-0.12" }
        }))
        .unwrap();
        assert_eq!(
            request.delivery_address.coordinates(),
            Some(Coordinates::new(51.5, -0.12))
        );

        let missing: PaymentIntentRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(missing.delivery_address.coordinates(), None);
        assert_eq!(missing.delivery_address.as_json(), None);

        let zero = DeliveryAddress(Some(json!({ "latitude": 0, "longitude": 0.5 })));
        assert_eq!(zero.coordinates(), None);
        assert_eq!(zero.latitude(), Some(0.0));
    }
}
