use std::collections::HashSet;

use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use super::{decode, decode_all, decode_optional, Paged, PgQuery};
use crate::{
    base::Pagination,
    domain::entity::{review::ReviewState, Entity, Review},
    error::persistence::PersistenceError,
};

const COLUMNS: &str = "user_id, dish_id, producer_id, order_id, rating, comment, tags, \
    is_verified, is_visible, producer_response, producer_response_at";

fn bind_state<'q>(query: PgQuery<'q>, state: &'q ReviewState) -> PgQuery<'q> {
    query
        .bind(state.user_id)
        .bind(state.dish_id)
        .bind(state.producer_id)
        .bind(state.order_id)
        .bind(state.rating)
        .bind(&state.comment)
        .bind(&state.tags)
        .bind(state.is_verified)
        .bind(state.is_visible)
        .bind(&state.producer_response)
        .bind(state.producer_response_at)
}

lazy_static::lazy_static! {
    static ref INSERT_REVIEW: String = format!(
        "INSERT INTO reviews ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *"
    );
    static ref UPDATE_REVIEW: String = format!(
        "UPDATE reviews SET ({COLUMNS}, updated_at) = \
        ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, now()) WHERE id = $12 RETURNING *"
    );
}

pub async fn insert_review(pool: &PgPool, state: &ReviewState) -> Result<Review, PersistenceError> {
    let row = bind_state(sqlx::query(&INSERT_REVIEW), state)
        .fetch_one(pool)
        .await?;
    decode(&row)
}

pub async fn update_review(pool: &PgPool, review: &Review) -> Result<Review, PersistenceError> {
    let row = bind_state(sqlx::query(&UPDATE_REVIEW), &review.state)
        .bind(review.ident())
        .fetch_one(pool)
        .await?;
    decode(&row)
}

pub async fn find_review(pool: &PgPool, id: i64) -> Result<Option<Review>, PersistenceError> {
    let row = sqlx::query("SELECT * FROM reviews WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    decode_optional(row)
}

pub async fn review_exists(pool: &PgPool, user_id: i64, dish_id: i64) -> Result<bool, PersistenceError> {
    let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM reviews WHERE user_id = $1 AND dish_id = $2)")
        .bind(user_id)
        .bind(dish_id)
        .fetch_one(pool)
        .await?;
    Ok(row.try_get(0)?)
}

/// Latest visible reviews of a dish.
pub async fn recent_dish_reviews(
    pool: &PgPool,
    dish_id: i64,
    limit: i64,
) -> Result<Vec<Review>, PersistenceError> {
    let rows = sqlx::query(
        "SELECT * FROM reviews WHERE dish_id = $1 AND is_visible \
        ORDER BY created_at DESC, id DESC LIMIT $2",
    )
    .bind(dish_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    decode_all(rows)
}

/// Dishes a user rated 4 or more.
const LIKED_DISHES: &str = "SELECT dish_id FROM reviews \
    WHERE user_id = $1 AND is_visible AND rating >= 4 AND dish_id IS NOT NULL";

pub async fn liked_dishes(pool: &PgPool, user_id: i64) -> Result<HashSet<i64>, PersistenceError> {
    let rows = sqlx::query(LIKED_DISHES)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    rows.iter()
        .map(|row| row.try_get(0).map_err(PersistenceError::from))
        .collect()
}

/// Recompute the rating aggregates of a dish and a kitchen over their
/// visible reviews.
pub async fn recompute_ratings(
    pool: &PgPool,
    dish_id: Option<i64>,
    producer_id: Option<i64>,
) -> Result<(), PersistenceError> {
    let mut trx = pool.begin().await?;

    if let Some(dish_id) = dish_id {
        sqlx::query(
            "UPDATE dishes SET (average_rating, total_reviews) = \
            (SELECT COALESCE(AVG(rating), 0)::DOUBLE PRECISION, count(*)::INTEGER \
            FROM reviews WHERE dish_id = $1 AND is_visible) WHERE id = $1",
        )
        .bind(dish_id)
        .execute(&mut trx)
        .await?;
    }

    if let Some(producer_id) = producer_id {
        sqlx::query(
            "UPDATE producers SET (average_rating, total_reviews) = \
            (SELECT COALESCE(AVG(rating), 0)::DOUBLE PRECISION, count(*)::INTEGER \
            FROM reviews WHERE producer_id = $1 AND is_visible) WHERE id = $1",
        )
        .bind(producer_id)
        .execute(&mut trx)
        .await?;
    }

    trx.commit().await?;
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub dish_id: Option<i64>,
    pub producer_id: Option<i64>,
    pub visible_only: bool,
    /// Keeps ratings at or below the value.
    pub max_rating: Option<i32>,
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ReviewFilter) {
    qb.push(" WHERE TRUE");
    if let Some(dish_id) = filter.dish_id {
        qb.push(" AND dish_id = ").push_bind(dish_id);
    }
    if let Some(producer_id) = filter.producer_id {
        qb.push(" AND producer_id = ").push_bind(producer_id);
    }
    if filter.visible_only {
        qb.push(" AND is_visible");
    }
    if let Some(max_rating) = filter.max_rating {
        qb.push(" AND rating <= ").push_bind(max_rating);
    }
}

/// Reviews newest first.
pub async fn list_reviews(
    pool: &PgPool,
    filter: &ReviewFilter,
    page: Pagination,
) -> Result<Paged<Review>, PersistenceError> {
    let mut qb = QueryBuilder::new("SELECT count(*) FROM reviews");
    push_filter(&mut qb, filter);
    let total: i64 = qb.build().fetch_one(pool).await?.try_get(0)?;

    let mut qb = QueryBuilder::new("SELECT * FROM reviews");
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(page.per_page)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb.build().fetch_all(pool).await?;

    Ok(Paged {
        items: decode_all(rows)?,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_reviews_are_not_likes() {
        assert!(LIKED_DISHES.contains("is_visible"));
        assert!(LIKED_DISHES.contains("rating >= 4"));
    }
}
