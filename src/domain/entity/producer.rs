use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::{datatype::status::ProducerStatus, geo::Coordinates};

use super::{impl_entity, Address, EntityData};

pub const DEFAULT_DELIVERY_RADIUS_KM: f64 = 5.0;
pub const DEFAULT_PREPARATION_MINUTES: i32 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct ProducerState {
    pub user_id: i64,
    pub kitchen_name: String,
    pub cuisine_specialty: Option<String>,
    pub bio: Option<String>,
    pub profile_photo_url: Option<String>,
    pub banner_url: Option<String>,
    pub address: Address,
    pub delivery_radius_km: f64,
    pub minimum_order_value: f64,
    pub preparation_time_minutes: i32,
    pub operating_hours: Option<Value>,
    pub status: ProducerStatus,
    pub is_active: bool,
    pub admin_notes: Option<String>,
    pub average_rating: f64,
    pub total_reviews: i32,
    pub approved_at: Option<DateTime<Utc>>,
}

impl ProducerState {
    /// Kitchen profile created at sign up, pending review.
    pub fn pending(user_id: i64, kitchen_name: String, cuisine_specialty: Option<String>) -> Self {
        Self {
            user_id,
            kitchen_name,
            cuisine_specialty,
            bio: None,
            profile_photo_url: None,
            banner_url: None,
            address: Address::default(),
            delivery_radius_km: DEFAULT_DELIVERY_RADIUS_KM,
            minimum_order_value: 0.0,
            preparation_time_minutes: DEFAULT_PREPARATION_MINUTES,
            operating_hours: None,
            status: ProducerStatus::Pending,
            is_active: true,
            admin_notes: None,
            average_rating: 0.0,
            total_reviews: 0,
            approved_at: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Producer {
    pub(in crate::domain) data: EntityData,
    pub state: ProducerState,
}

impl_entity!(Producer, ProducerState);

impl Producer {
    pub fn user_id(&self) -> i64 {
        self.state.user_id
    }

    pub fn status(&self) -> ProducerStatus {
        self.state.status
    }

    /// Approved and active kitchens take orders and new dishes.
    pub fn is_trading(&self) -> bool {
        self.state.status == ProducerStatus::Approved && self.state.is_active
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.state.address.coordinates()
    }

    pub fn approve(&mut self, now: DateTime<Utc>) {
        self.state.status = ProducerStatus::Approved;
        self.state.is_active = true;
        self.state.approved_at = Some(now);
    }

    pub fn reject(&mut self, reason: String) {
        self.close(ProducerStatus::Rejected, reason);
    }

    pub fn suspend(&mut self, reason: String) {
        self.close(ProducerStatus::Suspended, reason);
    }

    fn close(&mut self, status: ProducerStatus, reason: String) {
        self.state.status = status;
        self.state.is_active = false;
        self.state.admin_notes = Some(reason);
    }

    /// Status forced by an admin edit.
    pub fn set_status(&mut self, status: ProducerStatus, now: DateTime<Utc>) {
        if status == ProducerStatus::Approved {
            self.approve(now);
        } else {
            self.state.status = status;
            self.state.is_active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn producer() -> Producer {
        Producer::restore(
            EntityData::fixture(3),
            ProducerState::pending(9, "Amma's Kitchen".into(), Some("South Indian".into())),
        )
    }

    #[test]
    fn pending_profile_defaults() {
        let producer = producer();

        assert_eq!(producer.status(), ProducerStatus::Pending);
        assert_eq!(producer.state.delivery_radius_km, 5.0);
        assert_eq!(producer.state.preparation_time_minutes, 30);
        assert!(!producer.is_trading());
    }

    #[test]
    fn approval_lifecycle() {
        let mut producer = producer();
        let now = Utc::now();

        producer.approve(now);
        assert!(producer.is_trading());
        assert_eq!(producer.state.approved_at, Some(now));

        producer.suspend("Hygiene complaint".into());
        assert_eq!(producer.status(), ProducerStatus::Suspended);
        assert!(!producer.is_trading());
        assert_eq!(producer.state.admin_notes.as_deref(), Some("Hygiene complaint"));
    }

    #[test]
    fn admin_status_edit() {
        let mut producer = producer();
        let now = Utc::now();

        producer.set_status(ProducerStatus::Approved, now);
        assert!(producer.is_trading());

        producer.set_status(ProducerStatus::Pending, now);
        assert_eq!(producer.status(), ProducerStatus::Pending);
        assert!(!producer.state.is_active);
    }
}
