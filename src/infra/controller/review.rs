use salvo::http::StatusCode;

use super::{extract_id, extract_token, pagination, reply};
use crate::{
    app::{
        resource::review::{NewReview, ReviewReply},
        use_case::{self, review::REVIEWS_PER_PAGE},
    },
    error::http::BadRequest,
};

controller!(CreateReviewController, |ctx, req, res| {
    let form = map_res_err!(req.parse_body::<NewReview>().await.map_err(BadRequest::from), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::review::create_review(&ctx.pool, &ctx.token_service, token, form).await;
    reply(res, StatusCode::CREATED, map_res_err!(result, res));
});

controller!(GetReviewController, |ctx, req, res| {
    let id = map_res_err!(extract_id(req, "Review"), res);
    let result = use_case::review::get_review(&ctx.pool, id).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(DishReviewsController, |ctx, req, res| {
    let id = map_res_err!(extract_id(req, "Dish"), res);
    let result = use_case::review::dish_reviews(&ctx.pool, id, pagination(req, REVIEWS_PER_PAGE)).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(ProducerReviewsController, |ctx, req, res| {
    let id = map_res_err!(extract_id(req, "Producer"), res);
    let result = use_case::review::producer_reviews(&ctx.pool, id, pagination(req, REVIEWS_PER_PAGE)).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(
    /// Kitchen owner answer to a review.
    RespondReviewController,
    |ctx, req, res| {
        let form = map_res_err!(req.parse_body::<ReviewReply>().await.map_err(BadRequest::from), res);
        let id = map_res_err!(extract_id(req, "Review"), res);
        let token = map_res_err!(extract_token(req), res);

        let result = use_case::review::respond(&ctx.pool, &ctx.token_service, token, id, form).await;
        reply(res, StatusCode::OK, map_res_err!(result, res));
    }
);
