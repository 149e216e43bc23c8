use std::str::FromStr;

use chrono::Utc;
use sqlx::PgPool;

use super::{authorize, dish_view, dish_views, kitchen_of, review_views, trading_kitchen_of};
use crate::{
    app::resource::{
        dish::{DishPatch, DishQuery, DishResponse, NewDish},
        Keyed, Message, Page,
    },
    base::{Pagination, ResourceID},
    domain::{
        datatype::{
            list::store_list,
            status::{DietaryType, Role, SpiceLevel},
        },
        entity::{dish::DishState, Dish, Entity, Producer},
        geo::{self, Coordinates},
        service::TokenEncryptionService,
    },
    error::{
        app::ApplicationError,
        resource::{ValidationError, ValidationErrorKind, ValidationFieldError},
        security::ForbiddenError,
    },
    infra::database::repository::{
        dish::{self, DishFilter, DishSort},
        producer, review,
    },
};

pub const NEARBY_RADIUS_KM: f64 = 10.0;
pub const DISH_PAGE_REVIEWS: i64 = 10;

/// Parse an enumeration sent in a dish body.
fn variant<T, R>(path: &str, value: &str) -> Result<T, ValidationError>
where
    T: FromStr,
    R: ResourceID,
{
    value.parse().map_err(|_| {
        ValidationError::single::<R>(ValidationFieldError::new(
            path,
            value,
            vec![ValidationErrorKind::UnknownVariant],
            format!("Invalid {path}"),
        ))
    })
}

/// Copy the sent fields onto the dish.
pub(crate) fn apply_patch(dish: &mut Dish, patch: DishPatch) -> Result<(), ValidationError> {
    let dietary_type = patch
        .dietary_type
        .as_deref()
        .map(|text| variant::<DietaryType, DishPatch>("dietary_type", text))
        .transpose()?;
    let spice_level = patch
        .spice_level
        .as_deref()
        .map(|text| variant::<SpiceLevel, DishPatch>("spice_level", text))
        .transpose()?;

    let state = &mut dish.state;
    if let Some(name) = patch.name {
        state.name = name;
    }
    if let Some(price) = patch.price {
        state.price = price;
    }
    let texts = [
        (patch.description, &mut state.description),
        (patch.image_url, &mut state.image_url),
        (patch.category, &mut state.category),
        (patch.ingredients, &mut state.ingredients),
    ];
    for (value, column) in texts {
        if let Some(value) = value {
            *column = value;
        }
    }
    if dietary_type.is_some() {
        state.dietary_type = dietary_type;
    }
    if spice_level.is_some() {
        state.spice_level = spice_level;
    }
    if let Some(allergens) = patch.allergens {
        state.allergens = store_list(&allergens);
    }
    if let Some(available) = patch.is_available {
        state.is_available = available;
    }
    if let Some(max) = patch.max_orders_per_day {
        state.max_orders_per_day = max;
    }
    if let Some(position) = patch.display_order {
        state.display_order = position;
    }
    Ok(())
}

/// Optional enumeration filter. `Err` means nothing can match.
fn filter_variant<T: FromStr>(value: Option<String>) -> Result<Option<T>, ()> {
    match value.filter(|text| !text.is_empty()) {
        None => Ok(None),
        Some(text) => text.parse().map(Some).map_err(|_| ()),
    }
}

/// Ids of trading kitchens within `radius_km`.
pub(crate) async fn nearby_kitchen_ids(
    pool: &PgPool,
    origin: &Coordinates,
    radius_km: f64,
) -> Result<Vec<i64>, ApplicationError> {
    let kitchens = producer::trading_producers(pool).await?;
    Ok(geo::within_radius(origin, radius_km, kitchens, Producer::coordinates)
        .into_iter()
        .map(|(kitchen, _)| kitchen.ident())
        .collect())
}

/// Available dishes of the catalogue.
pub async fn list_dishes(pool: &PgPool, query: DishQuery) -> Result<Page<DishResponse>, ApplicationError> {
    let pagination = Pagination::new(query.page, query.per_page, Pagination::PER_PAGE);

    let producer_ids = match (query.producer_id, query.lat, query.lon) {
        (Some(id), _, _) => Some(vec![id]),
        (None, Some(lat), Some(lon)) if lat != 0.0 && lon != 0.0 => {
            let radius = query.radius.unwrap_or(NEARBY_RADIUS_KM);
            let ids = nearby_kitchen_ids(pool, &Coordinates::new(lat, lon), radius).await?;
            if ids.is_empty() {
                return Ok(Page::empty("dishes", pagination));
            }
            Some(ids)
        }
        _ => None,
    };

    let (dietary_type, spice_level) = match (
        filter_variant::<DietaryType>(query.dietary_type),
        filter_variant::<SpiceLevel>(query.spice_level),
    ) {
        (Ok(dietary_type), Ok(spice_level)) => (dietary_type, spice_level),
        _ => return Ok(Page::empty("dishes", pagination)),
    };

    let filter = DishFilter {
        producer_ids,
        available: Some(true),
        category: query.category.filter(|category| !category.is_empty()),
        dietary_type,
        spice_level,
        min_price: query.min_price,
        max_price: query.max_price,
        search: query.search.filter(|search| !search.trim().is_empty()),
        sort: DishSort::parse(query.sort_by.as_deref()),
    };
    let page = dish::list_dishes(pool, &filter, pagination).await?;
    let items = dish_views(pool, &page.items).await?;

    Ok(Page::new("dishes", items, page.total, pagination))
}

/// Dish page: counts the view and embeds the latest visible reviews.
pub async fn get_dish(pool: &PgPool, id: i64) -> Result<DishResponse, ApplicationError> {
    let viewed = dish::view_dish(pool, id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Dish"))?;
    let reviews = review::recent_dish_reviews(pool, id, DISH_PAGE_REVIEWS).await?;

    Ok(dish_view(pool, &viewed)
        .await?
        .with_reviews(review_views(pool, &reviews).await?))
}

pub async fn create_dish<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    form: NewDish,
) -> Result<Message<DishResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, &[Role::Producer]).await?;
    let kitchen = trading_kitchen_of(pool, &caller).await?;

    let name = form
        .name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ValidationError::single::<NewDish>(ValidationFieldError::required("name", "name is required")))?;
    let price = form
        .price
        .ok_or_else(|| ValidationError::single::<NewDish>(ValidationFieldError::required("price", "price is required")))?;
    if price < 0.0 {
        return Err(ValidationError::single::<NewDish>(ValidationFieldError::new(
            "price",
            price.to_string(),
            vec![ValidationErrorKind::Positive],
            "Price must be positive",
        ))
        .into());
    }

    let mut state = DishState::new(kitchen.ident(), name, price, Utc::now().date_naive());
    if let Some(text) = form.dietary_type.as_deref() {
        state.dietary_type = Some(variant::<DietaryType, NewDish>("dietary_type", text)?);
    }
    if let Some(text) = form.spice_level.as_deref() {
        state.spice_level = Some(variant::<SpiceLevel, NewDish>("spice_level", text)?);
    }
    state.description = form.description;
    state.image_url = form.image_url;
    state.category = form.category;
    state.allergens = form.allergens.as_ref().and_then(store_list);
    state.ingredients = form.ingredients;
    if let Some(max) = form.max_orders_per_day {
        state.max_orders_per_day = max;
    }
    if let Some(available) = form.is_available {
        state.is_available = available;
    }

    let created = dish::insert_dish(pool, &state).await?;
    tracing::info!(dish = created.ident(), producer = kitchen.ident(), "dish created");

    Ok(Message::with(
        "Dish created successfully",
        "dish",
        DishResponse::new(&created, Some(&kitchen)),
    ))
}

/// Load a dish the caller may edit: admins any, producers their own.
async fn editable_dish<TS>(pool: &PgPool, token_service: &TS, token: &str, id: i64) -> Result<Dish, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, &[Role::Producer, Role::Admin]).await?;
    let found = dish::find_dish(pool, id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Dish"))?;

    if caller.role() == Role::Producer {
        let owns = producer::find_producer_by_user(pool, caller.ident())
            .await?
            .map_or(false, |kitchen| kitchen.ident() == found.producer_id());
        if !owns {
            return Err(ForbiddenError::AccessDenied.into());
        }
    }
    Ok(found)
}

pub async fn update_dish<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    id: i64,
    patch: DishPatch,
) -> Result<Message<DishResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let mut found = editable_dish(pool, token_service, token, id).await?;
    apply_patch(&mut found, patch)?;

    let updated = dish::update_dish(pool, &found).await?;
    Ok(Message::with(
        "Dish updated successfully",
        "dish",
        dish_view(pool, &updated).await?,
    ))
}

pub async fn delete_dish<TS>(pool: &PgPool, token_service: &TS, token: &str, id: i64) -> Result<Message, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let found = editable_dish(pool, token_service, token, id).await?;
    dish::delete_dish(pool, found.ident()).await?;
    tracing::info!(dish = found.ident(), "dish deleted");
    Ok(Message::new("Dish deleted successfully"))
}

/// Every dish of the caller's kitchen, newest first.
pub async fn my_dishes<TS>(pool: &PgPool, token_service: &TS, token: &str) -> Result<Keyed<Vec<DishResponse>>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, &[Role::Producer]).await?;
    let kitchen = kitchen_of(pool, &caller).await?;
    let dishes = dish::producer_dishes(pool, kitchen.ident()).await?;

    Ok(Keyed(
        "dishes",
        dishes
            .iter()
            .map(|item| DishResponse::new(item, Some(&kitchen)))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::domain::entity::EntityData;

    fn dish() -> Dish {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut state = DishState::new(2, "Chicken Biryani".into(), 350.0, today);
        state.description = Some("Dum cooked".into());
        Dish::restore(EntityData::fixture(1), state)
    }

    #[test]
    fn patch_updates_sent_fields() {
        let mut dish = dish();
        let patch: DishPatch = serde_json::from_value(json!({
            "price": 399.0,
            "description": null,
            "spice_level": "hot",
            "allergens": ["nuts"],
            "is_available": false
        }))
        .unwrap();
        apply_patch(&mut dish, patch).unwrap();

        assert_eq!(dish.state.price, 399.0);
        assert_eq!(dish.state.description, None);
        assert_eq!(dish.state.spice_level, Some(SpiceLevel::Hot));
        assert_eq!(dish.state.dietary_type, Some(DietaryType::Veg));
        assert_eq!(dish.allergens(), vec!["nuts"]);
        assert!(!dish.state.is_available);
        assert_eq!(dish.name(), "Chicken Biryani");
    }

    #[test]
    fn patch_rejects_unknown_spice_level() {
        let mut dish = dish();
        let patch: DishPatch = serde_json::from_value(json!({ "spice_level": "volcanic", "price": 1.0 })).unwrap();
        let err = apply_patch(&mut dish, patch).unwrap_err();

        assert_eq!(err.to_string(), "Invalid spice_level");
        assert_eq!(dish.state.price, 350.0);
    }

    #[test]
    fn enumeration_filters() {
        assert_eq!(filter_variant::<SpiceLevel>(None), Ok(None));
        assert_eq!(filter_variant::<SpiceLevel>(Some(String::new())), Ok(None));
        assert_eq!(filter_variant::<SpiceLevel>(Some("mild".into())), Ok(Some(SpiceLevel::Mild)));
        assert_eq!(filter_variant::<SpiceLevel>(Some("volcanic".into())), Err(()));
    }
}
