use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use super::{decode, decode_all, decode_optional, producer, Paged, PgQuery};
use crate::infra::database::sql;
use crate::{
    base::Pagination,
    domain::{
        datatype::status::Role,
        entity::{producer::ProducerState, user::UserState, Entity, Producer, User},
    },
    error::persistence::PersistenceError,
};

const COLUMNS: &str = "name, email, phone, password_hash, role, is_active, \
    dietary_preferences, dietary_restrictions, allergens, spice_level, preferred_cuisines, \
    budget_preference, meal_preferences, delivery_time_windows, \
    address_line1, address_line2, city, state, pincode, latitude, longitude";

fn bind_state<'q>(query: PgQuery<'q>, state: &'q UserState) -> PgQuery<'q> {
    let preferences = &state.preferences;
    let address = &state.address;
    query
        .bind(&state.name)
        .bind(&state.email)
        .bind(&state.phone)
        .bind(state.password_hash.as_str())
        .bind(state.role.as_str())
        .bind(state.is_active)
        .bind(preferences.dietary_preferences.map(|value| value.as_str()))
        .bind(&preferences.dietary_restrictions)
        .bind(&preferences.allergens)
        .bind(preferences.spice_level.map(|value| value.as_str()))
        .bind(&preferences.preferred_cuisines)
        .bind(preferences.budget_preference.map(|value| value.as_str()))
        .bind(&preferences.meal_preferences)
        .bind(&preferences.delivery_time_windows)
        .bind(&address.address_line1)
        .bind(&address.address_line2)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.pincode)
        .bind(address.latitude)
        .bind(address.longitude)
}

lazy_static::lazy_static! {
    static ref INSERT_USER: String = format!(
        "INSERT INTO users ({COLUMNS}) VALUES \
        ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21) \
        RETURNING *"
    );
    static ref UPDATE_USER: String = format!(
        "UPDATE users SET ({COLUMNS}, updated_at) = \
        ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, now()) \
        WHERE id = $22 RETURNING *"
    );
}

pub async fn insert_user(pool: &PgPool, state: &UserState) -> Result<User, PersistenceError> {
    let row = bind_state(sqlx::query(&INSERT_USER), state)
        .fetch_one(pool)
        .await?;
    decode(&row)
}

/// Insert a producer user together with its kitchen profile.
pub async fn insert_producer_user<F>(
    pool: &PgPool,
    state: &UserState,
    kitchen: F,
) -> Result<(User, Producer), PersistenceError>
where
    F: FnOnce(i64) -> ProducerState,
{
    let mut trx = pool.begin().await?;

    let row = bind_state(sqlx::query(&INSERT_USER), state)
        .fetch_one(&mut trx)
        .await?;
    let user: User = decode(&row)?;

    let producer_state = kitchen(user.ident());
    let row = producer::bind_state(sqlx::query(&producer::INSERT_PRODUCER), &producer_state)
        .fetch_one(&mut trx)
        .await?;
    let producer: Producer = decode(&row)?;

    trx.commit().await?;
    Ok((user, producer))
}

pub async fn update_user(pool: &PgPool, user: &User) -> Result<User, PersistenceError> {
    let row = bind_state(sqlx::query(&UPDATE_USER), &user.state)
        .bind(user.ident())
        .fetch_one(pool)
        .await?;
    decode(&row)
}

pub async fn find_user(pool: &PgPool, id: i64) -> Result<Option<User>, PersistenceError> {
    let row = sqlx::query("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    decode_optional(row)
}

pub async fn find_users<I>(pool: &PgPool, ids: I) -> Result<Vec<User>, PersistenceError>
where
    I: IntoIterator<Item = i64>,
{
    let ids: Vec<i64> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM users WHERE id IN ");
    sql::push_list(&mut qb, ids);
    let rows = qb.build().fetch_all(pool).await?;
    decode_all(rows)
}

pub async fn find_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<User>, PersistenceError> {
    let row = sqlx::query("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    decode_optional(row)
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, PersistenceError> {
    let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(pool)
        .await?;
    Ok(row.try_get(0)?)
}

pub async fn find_admin_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<User>, PersistenceError> {
    let row = sqlx::query("SELECT * FROM users WHERE email = $1 AND role = $2")
        .bind(email)
        .bind(Role::Admin.as_str())
        .fetch_optional(pool)
        .await?;
    decode_optional(row)
}

/// Users newest first, optionally of a single role.
pub async fn list_users(
    pool: &PgPool,
    role: Option<Role>,
    page: Pagination,
) -> Result<Paged<User>, PersistenceError> {
    let role = role.map(|role| role.as_str());

    let total: i64 = sqlx::query("SELECT count(*) FROM users WHERE ($1::TEXT IS NULL OR role = $1)")
        .bind(role)
        .fetch_one(pool)
        .await?
        .try_get(0)?;

    let rows = sqlx::query(
        "SELECT * FROM users WHERE ($1::TEXT IS NULL OR role = $1) \
        ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
    )
    .bind(role)
    .bind(page.per_page)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok(Paged {
        items: decode_all(rows)?,
        total,
    })
}
