use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::user::UserResponse;
use crate::base::resource_id;

/// Registration form. Preference fields only matter for customers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub dietary_preferences: Option<String>,
    pub spice_level: Option<String>,
    pub budget_preference: Option<String>,
    pub dietary_restrictions: Option<Value>,
    pub allergens: Option<Value>,
    pub preferred_cuisines: Option<Value>,
    pub meal_preferences: Option<Value>,
    pub delivery_time_windows: Option<Value>,
    pub kitchen_name: Option<String>,
    pub cuisine_specialty: Option<String>,
    pub delivery_radius_km: Option<f64>,
    pub minimum_order_value: Option<f64>,
}

resource_id!(RegisterUser, "auth::Registration");

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

resource_id!(Credentials, "auth::Credentials");

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetPassword {
    pub email: Option<String>,
    pub new_password: Option<String>,
}

resource_id!(ResetPassword, "auth::PasswordReset");

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub message: &'static str,
}
