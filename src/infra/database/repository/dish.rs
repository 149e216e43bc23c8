use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use super::{decode, decode_all, decode_optional, Paged, PgQuery};
use crate::{
    base::Pagination,
    domain::{
        datatype::status::{DietaryType, SpiceLevel},
        entity::{dish::DishState, Dish, Entity},
    },
    error::persistence::PersistenceError,
    infra::database::sql,
};

const COLUMNS: &str = "producer_id, name, description, image_url, price, currency, category, \
    dietary_type, spice_level, allergens, ingredients, is_available, max_orders_per_day, \
    current_day_orders, last_reset_date, average_rating, total_reviews, view_count, order_count, \
    display_order";

fn bind_state<'q>(query: PgQuery<'q>, state: &'q DishState) -> PgQuery<'q> {
    query
        .bind(state.producer_id)
        .bind(&state.name)
        .bind(&state.description)
        .bind(&state.image_url)
        .bind(state.price)
        .bind(&state.currency)
        .bind(&state.category)
        .bind(state.dietary_type.map(|value| value.as_str()))
        .bind(state.spice_level.map(|value| value.as_str()))
        .bind(&state.allergens)
        .bind(&state.ingredients)
        .bind(state.is_available)
        .bind(state.max_orders_per_day)
        .bind(state.current_day_orders)
        .bind(state.last_reset_date)
        .bind(state.average_rating)
        .bind(state.total_reviews)
        .bind(state.view_count)
        .bind(state.order_count)
        .bind(state.display_order)
}

lazy_static::lazy_static! {
    static ref INSERT_DISH: String = format!(
        "INSERT INTO dishes ({COLUMNS}) VALUES \
        ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20) \
        RETURNING *"
    );
    static ref UPDATE_DISH: String = format!(
        "UPDATE dishes SET ({COLUMNS}, updated_at) = \
        ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, now()) \
        WHERE id = $21 RETURNING *"
    );
}

pub async fn insert_dish(pool: &PgPool, state: &DishState) -> Result<Dish, PersistenceError> {
    let row = bind_state(sqlx::query(&INSERT_DISH), state)
        .fetch_one(pool)
        .await?;
    decode(&row)
}

pub async fn update_dish(pool: &PgPool, dish: &Dish) -> Result<Dish, PersistenceError> {
    let row = bind_state(sqlx::query(&UPDATE_DISH), &dish.state)
        .bind(dish.ident())
        .fetch_one(pool)
        .await?;
    decode(&row)
}

pub async fn delete_dish(pool: &PgPool, id: i64) -> Result<(), PersistenceError> {
    sqlx::query("DELETE FROM dishes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_dish(pool: &PgPool, id: i64) -> Result<Option<Dish>, PersistenceError> {
    let row = sqlx::query("SELECT * FROM dishes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    decode_optional(row)
}

pub async fn find_dishes<I>(pool: &PgPool, ids: I) -> Result<Vec<Dish>, PersistenceError>
where
    I: IntoIterator<Item = i64>,
{
    let ids: Vec<i64> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM dishes WHERE id IN ");
    sql::push_list(&mut qb, ids);
    let rows = qb.build().fetch_all(pool).await?;
    decode_all(rows)
}

/// Bump the view counter and return the dish as stored afterwards.
pub async fn view_dish(pool: &PgPool, id: i64) -> Result<Option<Dish>, PersistenceError> {
    let row = sqlx::query(
        "UPDATE dishes SET view_count = view_count + 1 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    decode_optional(row)
}

/// Store a refreshed daily order window.
pub async fn reset_daily_window(
    pool: &PgPool,
    id: i64,
    today: NaiveDate,
) -> Result<(), PersistenceError> {
    sqlx::query("UPDATE dishes SET current_day_orders = 0, last_reset_date = $2 WHERE id = $1")
        .bind(id)
        .bind(today)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn producer_dishes(pool: &PgPool, producer_id: i64) -> Result<Vec<Dish>, PersistenceError> {
    let rows = sqlx::query("SELECT * FROM dishes WHERE producer_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(producer_id)
        .fetch_all(pool)
        .await?;
    decode_all(rows)
}

pub async fn available_dishes(pool: &PgPool) -> Result<Vec<Dish>, PersistenceError> {
    let rows = sqlx::query("SELECT * FROM dishes WHERE is_available ORDER BY id")
        .fetch_all(pool)
        .await?;
    decode_all(rows)
}

/// Available dishes ranked by rating, then orders, then views.
pub async fn popular_dishes(
    pool: &PgPool,
    producer_ids: Option<&[i64]>,
    limit: i64,
) -> Result<Vec<Dish>, PersistenceError> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM dishes WHERE is_available");
    if let Some(ids) = producer_ids {
        qb.push(" AND producer_id IN ");
        sql::push_list(&mut qb, ids.iter().copied());
    }
    qb.push(" ORDER BY average_rating DESC, order_count DESC, view_count DESC, id LIMIT ")
        .push_bind(limit);
    let rows = qb.build().fetch_all(pool).await?;
    decode_all(rows)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DishSort {
    #[default]
    Popularity,
    PriceAsc,
    PriceDesc,
    Rating,
    Newest,
}

impl DishSort {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("price_asc") => Self::PriceAsc,
            Some("price_desc") => Self::PriceDesc,
            Some("rating") => Self::Rating,
            _ => Self::Popularity,
        }
    }

    fn order_by(&self) -> &'static str {
        match self {
            DishSort::Popularity => " ORDER BY order_count DESC, view_count DESC, id",
            DishSort::PriceAsc => " ORDER BY price ASC, id",
            DishSort::PriceDesc => " ORDER BY price DESC, id",
            DishSort::Rating => " ORDER BY average_rating DESC, id",
            DishSort::Newest => " ORDER BY created_at DESC, id DESC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DishFilter {
    /// `None` keeps every dish, an empty list keeps none.
    pub producer_ids: Option<Vec<i64>>,
    pub available: Option<bool>,
    pub category: Option<String>,
    pub dietary_type: Option<DietaryType>,
    pub spice_level: Option<SpiceLevel>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub sort: DishSort,
}

fn push_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a DishFilter) {
    qb.push(" WHERE TRUE");
    if let Some(ids) = &filter.producer_ids {
        if ids.is_empty() {
            qb.push(" AND FALSE");
        } else {
            qb.push(" AND producer_id IN ");
            sql::push_list(qb, ids.iter().copied());
        }
    }
    if let Some(available) = filter.available {
        qb.push(" AND is_available = ").push_bind(available);
    }
    if let Some(category) = &filter.category {
        qb.push(" AND category = ").push_bind(category);
    }
    if let Some(dietary_type) = filter.dietary_type {
        qb.push(" AND dietary_type = ").push_bind(dietary_type.as_str());
    }
    if let Some(spice_level) = filter.spice_level {
        qb.push(" AND spice_level = ").push_bind(spice_level.as_str());
    }
    if let Some(min_price) = filter.min_price {
        qb.push(" AND price >= ").push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        qb.push(" AND price <= ").push_bind(max_price);
    }
    if let Some(search) = &filter.search {
        let pattern = sql::contains_pattern(search);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub async fn list_dishes(
    pool: &PgPool,
    filter: &DishFilter,
    page: Pagination,
) -> Result<Paged<Dish>, PersistenceError> {
    let mut qb = QueryBuilder::new("SELECT count(*) FROM dishes");
    push_filter(&mut qb, filter);
    let total: i64 = qb.build().fetch_one(pool).await?.try_get(0)?;

    let mut qb = QueryBuilder::new("SELECT * FROM dishes");
    push_filter(&mut qb, filter);
    qb.push(filter.sort.order_by())
        .push(" LIMIT ")
        .push_bind(page.per_page)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb.build().fetch_all(pool).await?;

    Ok(Paged {
        items: decode_all(rows)?,
        total,
    })
}
