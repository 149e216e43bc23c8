use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{present, producer::ProducerResponse};
use crate::{
    base::resource_id,
    domain::{
        datatype::status::{BudgetPreference, DietaryType, Role, SpiceLevel},
        entity::{Entity, User},
    },
};

/// Preference fields of a profile update.
///
/// Enumerations are kept as text and unknown values are ignored. Lists
/// take an array or a raw string, `null` or an empty value clears them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesPatch {
    pub dietary_preferences: Option<String>,
    pub spice_level: Option<String>,
    pub budget_preference: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub dietary_restrictions: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub allergens: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub preferred_cuisines: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub meal_preferences: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub delivery_time_windows: Option<Value>,
}

resource_id!(PreferencesPatch, "user::Preferences");

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub phone: Option<String>,
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
    #[serde(flatten)]
    pub preferences: PreferencesPatch,
}

resource_id!(ProfilePatch, "user::Profile");

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub dietary_preferences: Option<DietaryType>,
    pub dietary_restrictions: Vec<String>,
    pub allergens: Vec<String>,
    pub spice_level: Option<SpiceLevel>,
    pub preferred_cuisines: Vec<String>,
    pub budget_preference: Option<BudgetPreference>,
    pub meal_preferences: Vec<String>,
    pub delivery_time_windows: Vec<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub created_at: DateTime<Utc>,
}

resource_id!(UserResponse, "user::User");

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        let state = &user.state;
        let preferences = &state.preferences;
        Self {
            id: user.ident(),
            name: state.name.clone(),
            email: state.email.clone(),
            phone: state.phone.clone(),
            role: state.role,
            is_active: state.is_active,
            dietary_preferences: preferences.dietary_preferences,
            dietary_restrictions: preferences.dietary_restrictions(),
            allergens: preferences.allergens(),
            spice_level: preferences.spice_level,
            preferred_cuisines: preferences.preferred_cuisines(),
            budget_preference: preferences.budget_preference,
            meal_preferences: preferences.meal_preferences(),
            delivery_time_windows: preferences.delivery_time_windows(),
            address_line1: state.address.address_line1.clone(),
            address_line2: state.address.address_line2.clone(),
            city: state.address.city.clone(),
            state: state.address.state.clone(),
            pincode: state.address.pincode.clone(),
            created_at: user.created(),
        }
    }
}

/// The signed in user, with the kitchen profile of producers.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer: Option<ProducerResponse>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn profile_patch_keeps_preferences() {
        let patch: ProfilePatch = serde_json::from_value(json!({
            "name": "Asha",
            "city": null,
            "latitude": 51.5,
            "spice_level": "hot",
            "allergens": ["peanuts"],
            "meal_preferences": null,
        }))
        .unwrap();

        assert_eq!(patch.name.as_deref(), Some("Asha"));
        assert_eq!(patch.city, Some(None));
        assert_eq!(patch.address_line1, None);
        assert_eq!(patch.latitude, Some(Some(51.5)));
        assert_eq!(patch.preferences.spice_level.as_deref(), Some("hot"));
        assert_eq!(patch.preferences.allergens, Some(json!(["peanuts"])));
        assert_eq!(patch.preferences.meal_preferences, Some(Value::Null));
        assert_eq!(patch.preferences.preferred_cuisines, None);
    }
}
