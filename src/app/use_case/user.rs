use sqlx::PgPool;

use super::{authorize, producer_view, ANY_ROLE};
use crate::{
    app::resource::{
        user::{PreferencesPatch, ProfilePatch, ProfileResponse, UserResponse},
        Message,
    },
    domain::{
        datatype::{list::store_list, status::Role},
        entity::{user::Preferences, Entity},
        service::TokenEncryptionService,
        validation,
    },
    error::{app::ApplicationError, resource::ValidationError},
    infra::database::repository::{producer, user},
};

/// Apply the known preference values of a patch.
///
/// Unknown enumeration values leave the current value untouched.
pub(crate) fn apply_preferences(preferences: &mut Preferences, patch: PreferencesPatch) {
    if let Some(dietary) = patch.dietary_preferences.and_then(|text| text.parse().ok()) {
        preferences.dietary_preferences = Some(dietary);
    }
    if let Some(spice) = patch.spice_level.and_then(|text| text.parse().ok()) {
        preferences.spice_level = Some(spice);
    }
    if let Some(budget) = patch.budget_preference.and_then(|text| text.parse().ok()) {
        preferences.budget_preference = Some(budget);
    }

    let lists = [
        (patch.dietary_restrictions, &mut preferences.dietary_restrictions),
        (patch.allergens, &mut preferences.allergens),
        (patch.preferred_cuisines, &mut preferences.preferred_cuisines),
        (patch.meal_preferences, &mut preferences.meal_preferences),
        (patch.delivery_time_windows, &mut preferences.delivery_time_windows),
    ];
    for (value, column) in lists {
        if let Some(value) = value {
            *column = store_list(&value);
        }
    }
}

pub async fn get_profile<TS>(pool: &PgPool, token_service: &TS, token: &str) -> Result<ProfileResponse, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, ANY_ROLE).await?;

    let kitchen = match caller.role() {
        Role::Producer => match producer::find_producer_by_user(pool, caller.ident()).await? {
            Some(kitchen) => Some(producer_view(pool, &kitchen).await?),
            None => None,
        },
        _ => None,
    };

    Ok(ProfileResponse {
        user: UserResponse::from(&caller),
        producer: kitchen,
    })
}

pub async fn update_profile<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    patch: ProfilePatch,
) -> Result<Message<UserResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let mut caller = authorize(pool, token_service, token, ANY_ROLE).await?;

    let mut errors = Vec::new();
    if let Some(name) = &patch.name {
        if let Err(err) = validation::name(name) {
            errors.push(err);
        }
    }
    if let Some(phone) = &patch.phone {
        if let Err(err) = validation::phone(phone) {
            errors.push(err);
        }
    }
    if !errors.is_empty() {
        return Err(ValidationError::from_resource::<ProfilePatch>(errors).into());
    }

    let state = &mut caller.state;
    if let Some(name) = patch.name {
        state.name = name.trim().to_string();
    }
    if let Some(phone) = patch.phone {
        state.phone = Some(phone);
    }

    let address = &mut state.address;
    let texts = [
        (patch.address_line1, &mut address.address_line1),
        (patch.address_line2, &mut address.address_line2),
        (patch.city, &mut address.city),
        (patch.state, &mut address.state),
        (patch.pincode, &mut address.pincode),
    ];
    for (value, column) in texts {
        if let Some(value) = value {
            *column = value;
        }
    }
    if let Some(latitude) = patch.latitude {
        address.latitude = latitude;
    }
    if let Some(longitude) = patch.longitude {
        address.longitude = longitude;
    }

    apply_preferences(&mut state.preferences, patch.preferences);

    let updated = user::update_user(pool, &caller).await?;
    Ok(Message::with(
        "Profile updated successfully",
        "user",
        UserResponse::from(&updated),
    ))
}

pub async fn update_preferences<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    patch: PreferencesPatch,
) -> Result<Message<UserResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let mut caller = authorize(pool, token_service, token, ANY_ROLE).await?;
    apply_preferences(&mut caller.state.preferences, patch);

    let updated = user::update_user(pool, &caller).await?;
    Ok(Message::with(
        "Preferences updated successfully",
        "user",
        UserResponse::from(&updated),
    ))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::domain::datatype::status::{BudgetPreference, DietaryType, SpiceLevel};

    fn patch(body: serde_json::Value) -> PreferencesPatch {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn known_values_are_applied() {
        let mut preferences = Preferences::customer_defaults();
        apply_preferences(
            &mut preferences,
            patch(json!({
                "dietary_preferences": "vegan",
                "spice_level": "extreme",
                "budget_preference": "low",
                "preferred_cuisines": ["Bengali", "Gujarati"],
                "allergens": "peanuts, dairy"
            })),
        );

        assert_eq!(preferences.dietary_preferences, Some(DietaryType::Vegan));
        assert_eq!(preferences.spice_level, Some(SpiceLevel::Medium));
        assert_eq!(preferences.budget_preference, Some(BudgetPreference::Low));
        assert_eq!(preferences.preferred_cuisines(), vec!["Bengali", "Gujarati"]);
        assert_eq!(preferences.allergens(), vec!["peanuts", "dairy"]);
    }

    #[test]
    fn lists_are_cleared_only_when_sent() {
        let mut preferences = Preferences {
            meal_preferences: Some(r#"["lunch"]"#.into()),
            allergens: Some("nuts".into()),
            ..Preferences::default()
        };
        apply_preferences(&mut preferences, patch(json!({ "allergens": null })));

        assert_eq!(preferences.allergens, None);
        assert_eq!(preferences.meal_preferences(), vec!["lunch"]);
    }
}
