use sqlx::PgPool;

use super::{authorize, kitchen_of, producer_view, producer_views};
use crate::{
    app::resource::{
        producer::{NearbyQuery, ProducerPatch, ProducerQuery, ProducerResponse},
        Keyed, Message, Page,
    },
    base::Pagination,
    domain::{
        datatype::status::{ProducerStatus, Role},
        entity::Producer,
        geo::{self, Coordinates},
        service::TokenEncryptionService,
    },
    error::app::ApplicationError,
    infra::database::repository::producer::{self, ProducerFilter},
};

pub const NEARBY_RADIUS_KM: f64 = 10.0;

/// Copy the sent profile fields onto the kitchen. `status` is left to the caller.
pub(crate) fn apply_patch(kitchen: &mut Producer, patch: ProducerPatch) {
    let state = &mut kitchen.state;
    if let Some(name) = patch.kitchen_name.filter(|name| !name.trim().is_empty()) {
        state.kitchen_name = name;
    }

    let texts = [
        (patch.cuisine_specialty, &mut state.cuisine_specialty),
        (patch.bio, &mut state.bio),
        (patch.profile_photo_url, &mut state.profile_photo_url),
        (patch.banner_url, &mut state.banner_url),
        (patch.address_line1, &mut state.address.address_line1),
        (patch.address_line2, &mut state.address.address_line2),
        (patch.city, &mut state.address.city),
        (patch.state, &mut state.address.state),
        (patch.pincode, &mut state.address.pincode),
    ];
    for (value, column) in texts {
        if let Some(value) = value {
            *column = value;
        }
    }

    if let Some(radius) = patch.delivery_radius_km {
        state.delivery_radius_km = radius;
    }
    if let Some(minimum) = patch.minimum_order_value {
        state.minimum_order_value = minimum;
    }
    if let Some(minutes) = patch.preparation_time_minutes {
        state.preparation_time_minutes = minutes;
    }
    if let Some(hours) = patch.operating_hours {
        state.operating_hours = (!hours.is_null()).then_some(hours);
    }
    if let Some(latitude) = patch.latitude {
        state.address.latitude = latitude;
    }
    if let Some(longitude) = patch.longitude {
        state.address.longitude = longitude;
    }
}

/// Public kitchen directory.
pub async fn list_producers(pool: &PgPool, query: ProducerQuery) -> Result<Page<ProducerResponse>, ApplicationError> {
    let pagination = Pagination::new(query.page, query.per_page, Pagination::PER_PAGE);
    let status = match query.status.as_deref() {
        None => ProducerStatus::Approved,
        Some(text) => match text.parse() {
            Ok(status) => status,
            Err(_) => return Ok(Page::empty("producers", pagination)),
        },
    };

    let filter = ProducerFilter {
        status,
        city: query.city.filter(|city| !city.is_empty()),
        cuisine_specialty: query.cuisine_specialty.filter(|cuisine| !cuisine.is_empty()),
    };
    let page = producer::list_producers(pool, &filter, pagination).await?;
    let items = producer_views(pool, &page.items).await?;

    Ok(Page::new("producers", items, page.total, pagination))
}

pub async fn get_producer(pool: &PgPool, id: i64) -> Result<ProducerResponse, ApplicationError> {
    let kitchen = producer::find_producer(pool, id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Producer"))?;
    Ok(producer_view(pool, &kitchen).await?)
}

pub async fn get_own_profile<TS>(pool: &PgPool, token_service: &TS, token: &str) -> Result<ProducerResponse, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, &[Role::Producer]).await?;
    let kitchen = kitchen_of(pool, &caller).await?;
    Ok(producer_view(pool, &kitchen).await?)
}

pub async fn update_own_profile<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    patch: ProducerPatch,
) -> Result<Message<ProducerResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, &[Role::Producer]).await?;
    let mut kitchen = kitchen_of(pool, &caller).await?;
    apply_patch(&mut kitchen, patch);

    let updated = producer::update_producer(pool, &kitchen).await?;
    Ok(Message::with(
        "Profile updated successfully",
        "producer",
        producer_view(pool, &updated).await?,
    ))
}

/// Trading kitchens around a position, closest first.
pub async fn nearby_producers(
    pool: &PgPool,
    query: NearbyQuery,
) -> Result<Keyed<Vec<ProducerResponse>>, ApplicationError> {
    let origin = match (query.lat, query.lon) {
        (Some(lat), Some(lon)) if lat != 0.0 && lon != 0.0 => Coordinates::new(lat, lon),
        _ => return Err(ApplicationError::operation("Latitude and longitude are required")),
    };
    let radius = query.radius.unwrap_or(NEARBY_RADIUS_KM);

    let nearby = geo::within_radius(
        &origin,
        radius,
        producer::trading_producers(pool).await?,
        Producer::coordinates,
    );
    let (kitchens, distances): (Vec<Producer>, Vec<f64>) = nearby.into_iter().unzip();
    let views = producer_views(pool, &kitchens).await?;

    Ok(Keyed(
        "producers",
        views
            .into_iter()
            .zip(distances)
            .map(|(view, distance)| view.at_distance(distance))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::domain::entity::{producer::ProducerState, EntityData};

    fn kitchen() -> Producer {
        let mut state = ProducerState::pending(4, "Amma's Kitchen".into(), Some("South Indian".into()));
        state.bio = Some("Family recipes".into());
        Producer::restore(EntityData::fixture(1), state)
    }

    #[test]
    fn patch_keeps_unsent_fields() {
        let mut kitchen = kitchen();
        let patch: ProducerPatch = serde_json::from_value(json!({
            "kitchen_name": "Amma's Tiffin",
            "bio": null,
            "delivery_radius_km": 8.5,
            "latitude": 51.5,
            "operating_hours": { "mon": "10-20" },
            "status": "approved"
        }))
        .unwrap();
        apply_patch(&mut kitchen, patch);

        assert_eq!(kitchen.state.kitchen_name, "Amma's Tiffin");
        assert_eq!(kitchen.state.bio, None);
        assert_eq!(kitchen.state.cuisine_specialty.as_deref(), Some("South Indian"));
        assert_eq!(kitchen.state.delivery_radius_km, 8.5);
        assert_eq!(kitchen.state.address.latitude, Some(51.5));
        assert_eq!(kitchen.state.operating_hours, Some(json!({ "mon": "10-20" })));
        assert_eq!(kitchen.status(), ProducerStatus::Pending);
    }

    #[test]
    fn blank_kitchen_name_is_ignored() {
        let mut kitchen = kitchen();
        apply_patch(
            &mut kitchen,
            serde_json::from_value(json!({ "kitchen_name": "  " })).unwrap(),
        );
        assert_eq!(kitchen.state.kitchen_name, "Amma's Kitchen");
    }
}
