use crate::domain::datatype::{
    list::parse_list,
    security::PasswordHash,
    status::{BudgetPreference, DietaryType, Role, SpiceLevel},
};

use super::{impl_entity, Address, EntityData};

/// Food preferences, used to filter and rank recommendations.
///
/// List fields keep the stored text and are parsed on read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preferences {
    pub dietary_preferences: Option<DietaryType>,
    pub dietary_restrictions: Option<String>,
    pub allergens: Option<String>,
    pub spice_level: Option<SpiceLevel>,
    pub preferred_cuisines: Option<String>,
    pub budget_preference: Option<BudgetPreference>,
    pub meal_preferences: Option<String>,
    pub delivery_time_windows: Option<String>,
}

impl Preferences {
    /// Starting point of a new customer.
    pub fn customer_defaults() -> Self {
        Self {
            dietary_preferences: Some(DietaryType::NonVeg),
            spice_level: Some(SpiceLevel::Medium),
            budget_preference: Some(BudgetPreference::Medium),
            ..Self::default()
        }
    }

    pub fn dietary_restrictions(&self) -> Vec<String> {
        parse_list(self.dietary_restrictions.as_deref())
    }

    pub fn allergens(&self) -> Vec<String> {
        parse_list(self.allergens.as_deref())
    }

    pub fn preferred_cuisines(&self) -> Vec<String> {
        parse_list(self.preferred_cuisines.as_deref())
    }

    pub fn meal_preferences(&self) -> Vec<String> {
        parse_list(self.meal_preferences.as_deref())
    }

    pub fn delivery_time_windows(&self) -> Vec<String> {
        parse_list(self.delivery_time_windows.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserState {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: PasswordHash,
    pub role: Role,
    pub is_active: bool,
    pub preferences: Preferences,
    pub address: Address,
}

impl UserState {
    /// Customers can order right away, other roles wait for an admin.
    pub fn new(name: String, email: String, password_hash: PasswordHash, role: Role) -> Self {
        let is_customer = role == Role::Customer;
        Self {
            name,
            email,
            phone: None,
            password_hash,
            role,
            is_active: is_customer,
            preferences: if is_customer {
                Preferences::customer_defaults()
            } else {
                Preferences::default()
            },
            address: Address::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub(in crate::domain) data: EntityData,
    pub state: UserState,
}

impl_entity!(User, UserState);

impl User {
    pub fn role(&self) -> Role {
        self.state.role
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.state.role)
    }

    pub fn preferences(&self) -> &Preferences {
        &self.state.preferences
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn hash() -> PasswordHash {
        "$argon2id$v=19$m=4096,t=3,p=1$c2FsdHNhbHRzYWx0$Zm9vYmFyYmF6cXV4Zm9vYmFyYmF6cXV4Zm9vYmFyYg"
            .parse()
            .unwrap()
    }

    #[test]
    fn customers_start_active_with_defaults() {
        let state = UserState::new("Asha".into(), "asha@test.com".into(), hash(), Role::Customer);

        assert!(state.is_active);
        assert_eq!(state.preferences.dietary_preferences, Some(DietaryType::NonVeg));
        assert_eq!(state.preferences.spice_level, Some(SpiceLevel::Medium));
        assert_eq!(state.preferences.budget_preference, Some(BudgetPreference::Medium));
    }

    #[test]
    fn producers_wait_for_approval() {
        let state = UserState::new("Ravi".into(), "ravi@test.com".into(), hash(), Role::Producer);
        let user = User::restore(EntityData::fixture(7), state);

        assert!(!user.is_active());
        assert_eq!(user.preferences(), &Preferences::default());
        assert!(user.has_role(&[Role::Producer, Role::Admin]));
        assert!(!user.has_role(&[Role::Customer]));
    }

    #[test]
    fn preference_lists() {
        let preferences = Preferences {
            preferred_cuisines: Some(r#"["South Indian", " Bengali "]"#.into()),
            allergens: Some("peanuts,dairy".into()),
            ..Preferences::default()
        };

        assert_eq!(preferences.preferred_cuisines(), vec!["South Indian", "Bengali"]);
        assert_eq!(preferences.allergens(), vec!["peanuts", "dairy"]);
        assert!(preferences.meal_preferences().is_empty());
    }
}
