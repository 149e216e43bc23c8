//! Accounts and catalogue created at startup or by the `seed` command.

use chrono::Utc;
use sqlx::PgPool;

use crate::{
    domain::{
        datatype::status::{DietaryType, ProducerStatus, Role, SpiceLevel},
        entity::{dish::DishState, producer::ProducerState, user::UserState, Address, Entity, Producer, User},
        service::PasswordHashService,
    },
    error::app::ApplicationError,
    infra::database::repository::{dish, producer, user},
};

const CUSTOMER_EMAIL: &str = "customer@test.com";
const CUSTOMER_PASSWORD: &str = "customer123";
const CHEF_PASSWORD: &str = "chef123";

fn hashed<HS: PasswordHashService>(
    hash_service: &HS,
    password: &str,
) -> Result<crate::domain::datatype::security::PasswordHash, ApplicationError> {
    hash_service
        .hash_password(password)
        .map_err(ApplicationError::unknown)
}

/// Create the admin account unless an admin with `email` exists.
pub async fn ensure_admin<HS>(
    pool: &PgPool,
    hash_service: &HS,
    email: &str,
    password: &str,
) -> Result<User, ApplicationError>
where
    HS: PasswordHashService,
{
    if let Some(admin) = user::find_admin_by_email(pool, email).await? {
        return Ok(admin);
    }

    let mut state = UserState::new(
        "Admin User".into(),
        email.into(),
        hashed(hash_service, password)?,
        Role::Admin,
    );
    state.is_active = true;
    let admin = user::insert_user(pool, &state).await?;
    tracing::info!(email, "default admin created");
    Ok(admin)
}

struct SampleDish {
    name: &'static str,
    description: &'static str,
    price: f64,
    category: &'static str,
    dietary_type: DietaryType,
    spice_level: SpiceLevel,
    ingredients: &'static str,
    max_orders_per_day: i32,
}

struct SampleKitchen {
    owner: &'static str,
    email: &'static str,
    phone: &'static str,
    kitchen_name: &'static str,
    cuisine: &'static str,
    bio: &'static str,
    radius_km: f64,
    minimum_order: f64,
    prep_minutes: i32,
    street: &'static str,
    pincode: &'static str,
    coordinates: (f64, f64),
    dishes: &'static [SampleDish],
}

macro_rules! dish {
    ($name:literal, $description:literal, $price:literal, $category:literal, $dietary:ident, $spice:ident, $ingredients:literal, $max:literal) => {
        SampleDish {
            name: $name,
            description: $description,
            price: $price,
            category: $category,
            dietary_type: DietaryType::$dietary,
            spice_level: SpiceLevel::$spice,
            ingredients: $ingredients,
            max_orders_per_day: $max,
        }
    };
}

const NORTH_INDIAN: &[SampleDish] = &[
    dish!("Butter Chicken", "Creamy tomato-based curry with tender chicken pieces. A classic North Indian favorite.", 280.0, "Dinner", NonVeg, Medium, "Chicken, Tomatoes, Cream, Butter, Spices", 25),
    dish!("Dal Makhani", "Rich and creamy black lentils cooked with butter and cream. Perfect comfort food.", 180.0, "Lunch", Veg, Mild, "Black Lentils, Kidney Beans, Cream, Butter, Spices", 40),
    dish!("Paneer Tikka Masala", "Grilled paneer cubes in a rich, creamy tomato-based curry. Vegetarian delight!", 220.0, "Dinner", Veg, Medium, "Paneer, Tomatoes, Cream, Capsicum, Spices", 30),
    dish!("Biryani (Chicken)", "Fragrant basmati rice cooked with marinated chicken and aromatic spices. Served with raita.", 320.0, "Lunch", NonVeg, Hot, "Basmati Rice, Chicken, Yogurt, Spices, Herbs", 20),
    dish!("Chole Bhature", "Spicy chickpea curry served with fluffy fried bread. Classic North Indian breakfast/lunch.", 160.0, "Lunch", Veg, Medium, "Chickpeas, Flour, Spices, Onions, Tomatoes", 35),
    dish!("Palak Paneer", "Creamy spinach curry with soft paneer cubes. Healthy and delicious!", 200.0, "Lunch", Veg, Mild, "Spinach, Paneer, Cream, Spices, Garlic", 30),
];

const SOUTH_INDIAN: &[SampleDish] = &[
    dish!("Dosa with Sambar", "Crispy fermented rice crepe served with lentil stew and coconut chutney. Classic South Indian breakfast.", 120.0, "Breakfast", Veg, Mild, "Rice, Urad Dal, Coconut, Toor Dal, Vegetables", 50),
    dish!("Idli with Chutney", "Soft steamed rice cakes served with coconut chutney and sambar. Healthy and light.", 100.0, "Breakfast", Veg, Mild, "Rice, Urad Dal, Coconut, Curry Leaves", 60),
    dish!("Pongal", "Creamy rice and lentil porridge tempered with spices. Comforting and flavorful.", 90.0, "Breakfast", Veg, Mild, "Rice, Moong Dal, Ghee, Black Pepper, Cumin", 40),
    dish!("Sambar Rice", "Tangy lentil stew mixed with rice, tempered with spices. Complete meal in itself.", 130.0, "Lunch", Veg, Medium, "Toor Dal, Rice, Tamarind, Vegetables, Spices", 45),
    dish!("Rasam Rice", "Spicy and tangy tomato-based soup mixed with rice. Great for digestion!", 110.0, "Lunch", Veg, Medium, "Tomatoes, Tamarind, Toor Dal, Spices, Coriander", 40),
    dish!("Vegetable Biryani", "Fragrant basmati rice cooked with mixed vegetables and aromatic spices. Served with raita.", 250.0, "Lunch", Veg, Medium, "Basmati Rice, Mixed Vegetables, Yogurt, Spices, Herbs", 25),
    dish!("Coconut Rice", "Aromatic rice cooked with fresh coconut, curry leaves, and mild spices. Simple yet delicious.", 140.0, "Lunch", Veg, Mild, "Rice, Fresh Coconut, Curry Leaves, Mustard Seeds, Cashews", 35),
];

const KITCHENS: &[SampleKitchen] = &[
    SampleKitchen {
        owner: "Ravi Sharma",
        email: "chef@test.com",
        phone: "+1234567891",
        kitchen_name: "Ravi's Home Kitchen",
        cuisine: "North Indian",
        bio: "Authentic North Indian home-cooked meals. 20 years of experience in traditional cooking.",
        radius_km: 7.0,
        minimum_order: 200.0,
        prep_minutes: 40,
        street: "456 Chef Street",
        pincode: "400002",
        coordinates: (19.0820, 72.8780),
        dishes: NORTH_INDIAN,
    },
    SampleKitchen {
        owner: "Priya Menon",
        email: "chef2@test.com",
        phone: "+1234567892",
        kitchen_name: "Priya's South Indian Delights",
        cuisine: "South Indian",
        bio: "Traditional South Indian vegetarian meals. Specializing in Kerala and Tamil Nadu cuisine.",
        radius_km: 5.0,
        minimum_order: 150.0,
        prep_minutes: 35,
        street: "789 Spice Road",
        pincode: "400003",
        coordinates: (19.0740, 72.8800),
        dishes: SOUTH_INDIAN,
    },
];

fn mumbai(street: &str, pincode: &str, (latitude, longitude): (f64, f64)) -> Address {
    Address {
        address_line1: Some(street.into()),
        address_line2: None,
        city: Some("Mumbai".into()),
        state: Some("Maharashtra".into()),
        pincode: Some(pincode.into()),
        latitude: Some(latitude),
        longitude: Some(longitude),
    }
}

/// What a seed run created.
#[derive(Debug, Default)]
pub struct SeedReport {
    pub users: usize,
    pub kitchens: usize,
    pub dishes: usize,
}

async fn seed_customer<HS: PasswordHashService>(
    pool: &PgPool,
    hash_service: &HS,
    report: &mut SeedReport,
) -> Result<(), ApplicationError> {
    if user::find_user_by_email(pool, CUSTOMER_EMAIL).await?.is_some() {
        return Ok(());
    }

    let mut state = UserState::new(
        "John Customer".into(),
        CUSTOMER_EMAIL.into(),
        hashed(hash_service, CUSTOMER_PASSWORD)?,
        Role::Customer,
    );
    state.phone = Some("+1234567890".into());
    state.preferences.dietary_preferences = Some(DietaryType::NonVeg);
    state.preferences.spice_level = Some(SpiceLevel::Medium);
    state.preferences.preferred_cuisines = Some("North Indian, South Indian".into());
    state.address = mumbai("123 Main Street", "400001", (19.0760, 72.8777));

    user::insert_user(pool, &state).await?;
    report.users += 1;
    Ok(())
}

fn approved_kitchen(sample: &SampleKitchen, user_id: i64) -> ProducerState {
    let mut state = ProducerState::pending(user_id, sample.kitchen_name.into(), Some(sample.cuisine.into()));
    state.bio = Some(sample.bio.into());
    state.delivery_radius_km = sample.radius_km;
    state.minimum_order_value = sample.minimum_order;
    state.preparation_time_minutes = sample.prep_minutes;
    state.address = mumbai(sample.street, sample.pincode, sample.coordinates);
    state.status = ProducerStatus::Approved;
    state.is_active = true;
    state.approved_at = Some(Utc::now());
    state
}

async fn seed_kitchen<HS: PasswordHashService>(
    pool: &PgPool,
    hash_service: &HS,
    sample: &SampleKitchen,
    report: &mut SeedReport,
) -> Result<Producer, ApplicationError> {
    let owner = match user::find_user_by_email(pool, sample.email).await? {
        Some(owner) => owner,
        None => {
            let mut state = UserState::new(
                sample.owner.into(),
                sample.email.into(),
                hashed(hash_service, CHEF_PASSWORD)?,
                Role::Producer,
            );
            state.phone = Some(sample.phone.into());
            state.is_active = true;

            let (owner, kitchen) =
                user::insert_producer_user(pool, &state, |user_id| approved_kitchen(sample, user_id)).await?;
            report.users += 1;
            report.kitchens += 1;
            tracing::info!(kitchen = %kitchen.state.kitchen_name, "sample kitchen created");
            return Ok(kitchen);
        }
    };

    match producer::find_producer_by_user(pool, owner.ident()).await? {
        Some(kitchen) => Ok(kitchen),
        None => {
            let kitchen = producer::insert_producer(pool, &approved_kitchen(sample, owner.ident())).await?;
            report.kitchens += 1;
            Ok(kitchen)
        }
    }
}

async fn seed_dishes(
    pool: &PgPool,
    kitchen: &Producer,
    dishes: &[SampleDish],
    report: &mut SeedReport,
) -> Result<(), ApplicationError> {
    let existing = dish::producer_dishes(pool, kitchen.ident()).await?;
    let today = Utc::now().date_naive();

    for sample in dishes {
        if existing.iter().any(|known| known.name() == sample.name) {
            continue;
        }
        let mut state = DishState::new(kitchen.ident(), sample.name.into(), sample.price, today);
        state.description = Some(sample.description.into());
        state.category = Some(sample.category.into());
        state.dietary_type = Some(sample.dietary_type);
        state.spice_level = Some(sample.spice_level);
        state.ingredients = Some(sample.ingredients.into());
        state.max_orders_per_day = sample.max_orders_per_day;

        dish::insert_dish(pool, &state).await?;
        report.dishes += 1;
    }
    Ok(())
}

/// Sample customer, two approved kitchens and their dishes. Existing
/// rows are kept.
pub async fn sample_data<HS>(pool: &PgPool, hash_service: &HS) -> Result<SeedReport, ApplicationError>
where
    HS: PasswordHashService,
{
    let mut report = SeedReport::default();
    seed_customer(pool, hash_service, &mut report).await?;

    for sample in KITCHENS {
        let kitchen = seed_kitchen(pool, hash_service, sample, &mut report).await?;
        seed_dishes(pool, &kitchen, sample.dishes, &mut report).await?;
    }

    tracing::info!(
        users = report.users,
        kitchens = report.kitchens,
        dishes = report.dishes,
        "sample data ready"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn sample_kitchens_are_trading() {
        let state = approved_kitchen(&KITCHENS[0], 7);
        assert_eq!(state.user_id, 7);
        assert_eq!(state.status, ProducerStatus::Approved);
        assert!(state.is_active);
        assert!(state.address.coordinates().is_some());
    }

    #[test]
    fn sample_menus() {
        assert_eq!(NORTH_INDIAN.len(), 6);
        assert_eq!(SOUTH_INDIAN.len(), 7);
        assert!(SOUTH_INDIAN.iter().all(|dish| dish.dietary_type == DietaryType::Veg));
    }
}
