use chrono::Utc;
use sqlx::PgPool;

use super::{authorize, kitchen_of, review_view, review_views, ANY_ROLE};
use crate::{
    app::resource::{
        review::{NewReview, ReviewReply, ReviewResponse},
        Message, Page,
    },
    base::Pagination,
    domain::{
        datatype::{list::store_list, status::{OrderStatus, Role}},
        entity::{
            review::{is_valid_rating, ReviewState},
            Entity,
        },
        service::TokenEncryptionService,
    },
    error::{
        app::ApplicationError,
        resource::{ConflictError, ValidationError, ValidationFieldError},
        security::ForbiddenError,
    },
    infra::database::repository::{
        dish, order,
        review::{self, ReviewFilter},
    },
};

pub const REVIEWS_PER_PAGE: i64 = 10;

const DUPLICATE_REVIEW: &str = "You have already reviewed this dish";

/// Whether `order_id` is a delivered order of the reviewer holding the dish.
async fn is_verified_purchase(
    pool: &PgPool,
    user_id: i64,
    dish_id: i64,
    order_id: Option<i64>,
) -> Result<bool, ApplicationError> {
    let found = match order_id {
        Some(id) => order::find_order(pool, id).await?,
        None => return Ok(false),
    };
    match found {
        Some(found) if found.customer_id() == user_id && found.status() == OrderStatus::Delivered => {
            Ok(order::order_contains_dish(pool, found.ident(), dish_id).await?)
        }
        _ => Ok(false),
    }
}

pub async fn create_review<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    form: NewReview,
) -> Result<Message<ReviewResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, ANY_ROLE).await?;

    let rating = form.rating.ok_or_else(|| {
        ValidationError::single::<NewReview>(ValidationFieldError::required("rating", "rating is required"))
    })?;
    let dish_id = form.dish_id.ok_or_else(|| {
        ValidationError::single::<NewReview>(ValidationFieldError::required("dish_id", "dish_id is required"))
    })?;
    if !is_valid_rating(rating) {
        return Err(ApplicationError::operation("Rating must be between 1 and 5"));
    }

    let reviewed = dish::find_dish(pool, dish_id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Dish"))?;

    let is_verified = is_verified_purchase(pool, caller.ident(), dish_id, form.order_id).await?;

    if review::review_exists(pool, caller.ident(), dish_id).await? {
        return Err(ConflictError::new::<NewReview>(DUPLICATE_REVIEW).into());
    }

    let state = ReviewState {
        user_id: caller.ident(),
        dish_id: Some(dish_id),
        producer_id: Some(reviewed.producer_id()),
        order_id: form.order_id,
        rating: rating as i32,
        comment: form.comment,
        tags: form.tags.as_ref().and_then(store_list),
        is_verified,
        is_visible: true,
        producer_response: None,
        producer_response_at: None,
    };
    let created = match review::insert_review(pool, &state).await {
        Ok(created) => created,
        Err(err) if err.is_unique_violation() => {
            return Err(ConflictError::new::<NewReview>(DUPLICATE_REVIEW).into())
        }
        Err(err) => return Err(err.into()),
    };
    review::recompute_ratings(pool, state.dish_id, state.producer_id).await?;
    tracing::info!(review = created.ident(), dish = dish_id, rating, verified = is_verified, "review created");

    Ok(Message::with(
        "Review created successfully",
        "review",
        review_view(pool, &created).await?,
    ))
}

pub async fn get_review(pool: &PgPool, id: i64) -> Result<ReviewResponse, ApplicationError> {
    let found = review::find_review(pool, id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Review"))?;
    Ok(review_view(pool, &found).await?)
}

async fn visible_reviews(
    pool: &PgPool,
    filter: ReviewFilter,
    pagination: Pagination,
) -> Result<Page<ReviewResponse>, ApplicationError> {
    let page = review::list_reviews(
        pool,
        &ReviewFilter {
            visible_only: true,
            ..filter
        },
        pagination,
    )
    .await?;
    let items = review_views(pool, &page.items).await?;
    Ok(Page::new("reviews", items, page.total, pagination))
}

pub async fn dish_reviews(pool: &PgPool, dish_id: i64, pagination: Pagination) -> Result<Page<ReviewResponse>, ApplicationError> {
    visible_reviews(
        pool,
        ReviewFilter {
            dish_id: Some(dish_id),
            ..ReviewFilter::default()
        },
        pagination,
    )
    .await
}

pub async fn producer_reviews(
    pool: &PgPool,
    producer_id: i64,
    pagination: Pagination,
) -> Result<Page<ReviewResponse>, ApplicationError> {
    visible_reviews(
        pool,
        ReviewFilter {
            producer_id: Some(producer_id),
            ..ReviewFilter::default()
        },
        pagination,
    )
    .await
}

/// Kitchen answer to a review of one of its dishes.
pub async fn respond<TS>(
    pool: &PgPool,
    token_service: &TS,
    token: &str,
    id: i64,
    form: ReviewReply,
) -> Result<Message<ReviewResponse>, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, &[Role::Producer]).await?;
    let mut found = review::find_review(pool, id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Review"))?;
    let kitchen = kitchen_of(pool, &caller)
        .await
        .map_err(|_| ApplicationError::from(ForbiddenError::AccessDenied))?;
    if found.state.producer_id != Some(kitchen.ident()) {
        return Err(ForbiddenError::AccessDenied.into());
    }

    let text = form
        .response
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ApplicationError::operation("Response text is required"))?;
    found.respond(text, Utc::now());

    let updated = review::update_review(pool, &found).await?;
    Ok(Message::with(
        "Response added successfully",
        "review",
        review_view(pool, &updated).await?,
    ))
}
