use chrono::NaiveDate;

use crate::domain::{
    datatype::{
        list::parse_list,
        status::{DietaryType, SpiceLevel},
    },
    pricing,
};

use super::{impl_entity, EntityData};

pub const DEFAULT_MAX_ORDERS_PER_DAY: i32 = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct DishState {
    pub producer_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: f64,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub dietary_type: Option<DietaryType>,
    pub spice_level: Option<SpiceLevel>,
    pub allergens: Option<String>,
    pub ingredients: Option<String>,
    pub is_available: bool,
    pub max_orders_per_day: i32,
    pub current_day_orders: i32,
    pub last_reset_date: Option<NaiveDate>,
    pub average_rating: f64,
    pub total_reviews: i32,
    pub view_count: i32,
    pub order_count: i32,
    pub display_order: i32,
}

impl DishState {
    pub fn new(producer_id: i64, name: String, price: f64, today: NaiveDate) -> Self {
        Self {
            producer_id,
            name,
            description: None,
            image_url: None,
            price,
            currency: Some(pricing::INR.into()),
            category: None,
            dietary_type: Some(DietaryType::Veg),
            spice_level: Some(SpiceLevel::Medium),
            allergens: None,
            ingredients: None,
            is_available: true,
            max_orders_per_day: DEFAULT_MAX_ORDERS_PER_DAY,
            current_day_orders: 0,
            last_reset_date: Some(today),
            average_rating: 0.0,
            total_reviews: 0,
            view_count: 0,
            order_count: 0,
            display_order: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dish {
    pub(in crate::domain) data: EntityData,
    pub state: DishState,
}

impl_entity!(Dish, DishState);

impl Dish {
    pub fn producer_id(&self) -> i64 {
        self.state.producer_id
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn allergens(&self) -> Vec<String> {
        parse_list(self.state.allergens.as_deref())
    }

    /// Unit price charged at checkout, in pounds.
    pub fn gbp_price(&self) -> f64 {
        pricing::gbp_price(self.state.price, self.state.currency.as_deref())
    }

    /// Start a new daily order window when the last one is from another day.
    ///
    /// Returns whether the counters changed and must be persisted.
    pub fn refresh_daily_window(&mut self, today: NaiveDate) -> bool {
        if self.state.last_reset_date == Some(today) {
            return false;
        }
        self.state.current_day_orders = 0;
        self.state.last_reset_date = Some(today);
        true
    }

    /// Whether `quantity` more portions fit in today's window.
    pub fn can_order(&self, quantity: i32) -> bool {
        self.state.is_available
            && self
                .state
                .current_day_orders
                .checked_add(quantity)
                .map_or(false, |total| total <= self.state.max_orders_per_day)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn dish(today: NaiveDate) -> Dish {
        Dish::restore(
            EntityData::fixture(1),
            DishState::new(2, "Masala Dosa".into(), 450.0, today),
        )
    }

    #[test]
    fn new_dish_defaults() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let dish = dish(today);

        assert_eq!(dish.state.currency.as_deref(), Some("INR"));
        assert_eq!(dish.state.dietary_type, Some(DietaryType::Veg));
        assert_eq!(dish.state.max_orders_per_day, 50);
        assert_eq!(dish.gbp_price(), 4.5);
    }

    #[test]
    fn daily_limit() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut dish = dish(today);
        dish.state.max_orders_per_day = 10;
        dish.state.current_day_orders = 8;

        assert!(dish.can_order(2));
        assert!(!dish.can_order(3));

        dish.state.is_available = false;
        assert!(!dish.can_order(1));
    }

    #[test]
    fn huge_quantity_is_over_the_limit() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut dish = dish(today);
        dish.state.current_day_orders = 1;

        assert!(!dish.can_order(i32::MAX));
        assert!(!dish.can_order(1i32.saturating_add(i32::MAX)));
    }

    #[test]
    fn window_resets_on_a_new_day() {
        let yesterday = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let mut dish = dish(yesterday);
        dish.state.current_day_orders = 50;

        assert!(!dish.refresh_daily_window(yesterday));
        assert!(!dish.can_order(1));

        assert!(dish.refresh_daily_window(today));
        assert_eq!(dish.state.current_day_orders, 0);
        assert_eq!(dish.state.last_reset_date, Some(today));
        assert!(dish.can_order(1));
    }
}
