use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use super::{decode, decode_all, decode_optional, Paged, PgQuery};
use crate::{
    base::Pagination,
    domain::{
        datatype::status::ProducerStatus,
        entity::{producer::ProducerState, Entity, Producer},
    },
    error::persistence::PersistenceError,
    infra::database::sql,
};

const COLUMNS: &str = "user_id, kitchen_name, cuisine_specialty, bio, profile_photo_url, banner_url, \
    address_line1, address_line2, city, state, pincode, latitude, longitude, \
    delivery_radius_km, minimum_order_value, preparation_time_minutes, operating_hours, \
    status, is_active, admin_notes, average_rating, total_reviews, approved_at";

pub(super) fn bind_state<'q>(query: PgQuery<'q>, state: &'q ProducerState) -> PgQuery<'q> {
    let address = &state.address;
    query
        .bind(state.user_id)
        .bind(&state.kitchen_name)
        .bind(&state.cuisine_specialty)
        .bind(&state.bio)
        .bind(&state.profile_photo_url)
        .bind(&state.banner_url)
        .bind(&address.address_line1)
        .bind(&address.address_line2)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.pincode)
        .bind(address.latitude)
        .bind(address.longitude)
        .bind(state.delivery_radius_km)
        .bind(state.minimum_order_value)
        .bind(state.preparation_time_minutes)
        .bind(&state.operating_hours)
        .bind(state.status.as_str())
        .bind(state.is_active)
        .bind(&state.admin_notes)
        .bind(state.average_rating)
        .bind(state.total_reviews)
        .bind(state.approved_at)
}

lazy_static::lazy_static! {
    pub(super) static ref INSERT_PRODUCER: String = format!(
        "INSERT INTO producers ({COLUMNS}) VALUES \
        ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23) \
        RETURNING *"
    );
    static ref UPDATE_PRODUCER: String = format!(
        "UPDATE producers SET ({COLUMNS}, updated_at) = \
        ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, now()) \
        WHERE id = $24 RETURNING *"
    );
}

pub async fn insert_producer(
    pool: &PgPool,
    state: &ProducerState,
) -> Result<Producer, PersistenceError> {
    let row = bind_state(sqlx::query(&INSERT_PRODUCER), state)
        .fetch_one(pool)
        .await?;
    decode(&row)
}

pub async fn update_producer(pool: &PgPool, producer: &Producer) -> Result<Producer, PersistenceError> {
    let row = bind_state(sqlx::query(&UPDATE_PRODUCER), &producer.state)
        .bind(producer.ident())
        .fetch_one(pool)
        .await?;
    decode(&row)
}

pub async fn find_producer(pool: &PgPool, id: i64) -> Result<Option<Producer>, PersistenceError> {
    let row = sqlx::query("SELECT * FROM producers WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    decode_optional(row)
}

pub async fn find_producer_by_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<Option<Producer>, PersistenceError> {
    let row = sqlx::query("SELECT * FROM producers WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    decode_optional(row)
}

pub async fn find_producers<I>(pool: &PgPool, ids: I) -> Result<Vec<Producer>, PersistenceError>
where
    I: IntoIterator<Item = i64>,
{
    let ids: Vec<i64> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM producers WHERE id IN ");
    sql::push_list(&mut qb, ids);
    let rows = qb.build().fetch_all(pool).await?;
    decode_all(rows)
}

/// Approved and active kitchens.
pub async fn trading_producers(pool: &PgPool) -> Result<Vec<Producer>, PersistenceError> {
    let rows = sqlx::query("SELECT * FROM producers WHERE status = $1 AND is_active ORDER BY id")
        .bind(ProducerStatus::Approved.as_str())
        .fetch_all(pool)
        .await?;
    decode_all(rows)
}

pub async fn all_producers(pool: &PgPool) -> Result<Vec<Producer>, PersistenceError> {
    let rows = sqlx::query("SELECT * FROM producers ORDER BY id")
        .fetch_all(pool)
        .await?;
    decode_all(rows)
}

pub async fn producers_with_status(
    pool: &PgPool,
    status: ProducerStatus,
) -> Result<Vec<Producer>, PersistenceError> {
    let rows = sqlx::query("SELECT * FROM producers WHERE status = $1 ORDER BY created_at DESC")
        .bind(status.as_str())
        .fetch_all(pool)
        .await?;
    decode_all(rows)
}

#[derive(Debug, Clone)]
pub struct ProducerFilter {
    pub status: ProducerStatus,
    pub city: Option<String>,
    pub cuisine_specialty: Option<String>,
}

fn push_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a ProducerFilter) {
    qb.push(" WHERE is_active AND status = ");
    qb.push_bind(filter.status.as_str());
    if let Some(city) = &filter.city {
        qb.push(" AND city = ").push_bind(city);
    }
    if let Some(cuisine) = &filter.cuisine_specialty {
        qb.push(" AND cuisine_specialty = ").push_bind(cuisine);
    }
}

/// Active kitchens of a status.
pub async fn list_producers(
    pool: &PgPool,
    filter: &ProducerFilter,
    page: Pagination,
) -> Result<Paged<Producer>, PersistenceError> {
    let mut qb = QueryBuilder::new("SELECT count(*) FROM producers");
    push_filter(&mut qb, filter);
    let total: i64 = qb.build().fetch_one(pool).await?.try_get(0)?;

    let mut qb = QueryBuilder::new("SELECT * FROM producers");
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY id LIMIT ")
        .push_bind(page.per_page)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb.build().fetch_all(pool).await?;

    Ok(Paged {
        items: decode_all(rows)?,
        total,
    })
}
