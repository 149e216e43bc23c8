pub mod cart;
pub mod dish;
pub mod order;
pub mod producer;
pub mod review;
pub mod user;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use cart::CartItem;
pub use dish::Dish;
pub use order::{Order, OrderItem};
pub use producer::Producer;
pub use review::Review;
pub use user::User;

pub trait Entity {
    fn ident(&self) -> i64;
    fn created(&self) -> DateTime<Utc>;
    fn updated(&self) -> DateTime<Utc>;
}

/// Data used to restore a entity
#[derive(Debug, Clone, PartialEq)]
pub struct EntityData {
    pub(in crate::domain) id: i64,
    pub(in crate::domain) created: DateTime<Utc>,
    pub(in crate::domain) updated: DateTime<Utc>,
}

impl EntityData {
    #[cfg(test)]
    pub(crate) fn fixture(id: i64) -> Self {
        let now = Utc::now();
        Self {
            id,
            created: now,
            updated: now,
        }
    }
}

macro_rules! impl_entity {
    ($entity:ident, $state:ident) => {
        impl super::Entity for $entity {
            fn ident(&self) -> i64 {
                self.data.id
            }

            fn created(&self) -> chrono::DateTime<chrono::Utc> {
                self.data.created
            }

            fn updated(&self) -> chrono::DateTime<chrono::Utc> {
                self.data.updated
            }
        }

        impl $entity {
            pub fn restore(data: super::EntityData, state: $state) -> Self {
                Self { data, state }
            }
        }
    };
}

pub(self) use impl_entity;

/// Postal address and position shared by users and kitchens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Address {
    pub fn coordinates(&self) -> Option<crate::domain::geo::Coordinates> {
        crate::domain::geo::Coordinates::from_parts(self.latitude, self.longitude)
    }
}
