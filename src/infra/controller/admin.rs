//! Administration handlers. Authorization is enforced by the use cases.

use salvo::{http::StatusCode, Request};

use super::{extract_id, extract_token, order::order_query, query_value, reply};
use crate::{
    app::{
        resource::{
            admin::{Moderation, ReportQuery, ReviewQuery, UserQuery},
            dish::{DishAdminQuery, DishPatch},
            producer::ProducerPatch,
        },
        use_case,
    },
    error::http::BadRequest,
};

fn report_query(req: &Request) -> ReportQuery {
    ReportQuery {
        start_date: query_value(req, "start_date"),
        end_date: query_value(req, "end_date"),
    }
}

controller!(DashboardController, |ctx, req, res| {
    let token = map_res_err!(extract_token(req), res);
    let result = use_case::admin::dashboard(&ctx.pool, &ctx.token_service, token).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(PendingProducersController, |ctx, req, res| {
    let token = map_res_err!(extract_token(req), res);
    let result = use_case::admin::pending_producers(&ctx.pool, &ctx.token_service, token).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(ApproveProducerController, |ctx, req, res| {
    let id = map_res_err!(extract_id(req, "Producer"), res);
    let token = map_res_err!(extract_token(req), res);

    let result =
        use_case::admin::approve_producer(&ctx.pool, &ctx.token_service, ctx.mailer.as_ref(), token, id).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(RejectProducerController, |ctx, req, res| {
    let form = req.parse_body::<Moderation>().await.ok();
    let id = map_res_err!(extract_id(req, "Producer"), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::admin::reject_producer(&ctx.pool, &ctx.token_service, token, id, form).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(SuspendProducerController, |ctx, req, res| {
    let form = req.parse_body::<Moderation>().await.ok();
    let id = map_res_err!(extract_id(req, "Producer"), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::admin::suspend_producer(&ctx.pool, &ctx.token_service, token, id, form).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(UpdateProducerController, |ctx, req, res| {
    let patch = map_res_err!(req.parse_body::<ProducerPatch>().await.map_err(BadRequest::from), res);
    let id = map_res_err!(extract_id(req, "Producer"), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::admin::update_producer(&ctx.pool, &ctx.token_service, token, id, patch).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(ListUsersController, |ctx, req, res| {
    let query = UserQuery {
        role: query_value(req, "role"),
        page: query_value(req, "page"),
        per_page: query_value(req, "per_page"),
    };
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::admin::list_users(&ctx.pool, &ctx.token_service, token, query).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(SuspendUserController, |ctx, req, res| {
    let form = req.parse_body::<Moderation>().await.ok();
    let id = map_res_err!(extract_id(req, "User"), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::admin::suspend_user(&ctx.pool, &ctx.token_service, token, id, form).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(ListOrdersController, |ctx, req, res| {
    let query = order_query(req);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::admin::list_orders(&ctx.pool, &ctx.token_service, token, query).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(ListReviewsController, |ctx, req, res| {
    let query = ReviewQuery {
        min_rating: query_value(req, "min_rating"),
        page: query_value(req, "page"),
        per_page: query_value(req, "per_page"),
    };
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::admin::list_reviews(&ctx.pool, &ctx.token_service, token, query).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(HideReviewController, |ctx, req, res| {
    let id = map_res_err!(extract_id(req, "Review"), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::admin::hide_review(&ctx.pool, &ctx.token_service, token, id).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(SalesReportController, |ctx, req, res| {
    let query = report_query(req);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::report::sales(&ctx.pool, &ctx.token_service, token, query).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(UserGrowthReportController, |ctx, req, res| {
    let query = report_query(req);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::report::user_growth(&ctx.pool, &ctx.token_service, token, query).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(ProducerPerformanceReportController, |ctx, req, res| {
    let query = report_query(req);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::report::producer_performance(&ctx.pool, &ctx.token_service, token, query).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(DeliveryMetricsReportController, |ctx, req, res| {
    let query = report_query(req);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::report::delivery_metrics(&ctx.pool, &ctx.token_service, token, query).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(ListDishesController, |ctx, req, res| {
    let query = DishAdminQuery {
        status: query_value(req, "status"),
        producer_id: query_value(req, "producer_id"),
        page: query_value(req, "page"),
        per_page: query_value(req, "per_page"),
    };
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::admin::list_dishes(&ctx.pool, &ctx.token_service, token, query).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(UpdateDishController, |ctx, req, res| {
    let patch = map_res_err!(req.parse_body::<DishPatch>().await.map_err(BadRequest::from), res);
    let id = map_res_err!(extract_id(req, "Dish"), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::admin::update_dish(&ctx.pool, &ctx.token_service, token, id, patch).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(DeleteDishController, |ctx, req, res| {
    let id = map_res_err!(extract_id(req, "Dish"), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::admin::delete_dish(&ctx.pool, &ctx.token_service, token, id).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(ApproveDishController, |ctx, req, res| {
    let id = map_res_err!(extract_id(req, "Dish"), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::admin::approve_dish(&ctx.pool, &ctx.token_service, token, id).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(DisableDishController, |ctx, req, res| {
    let id = map_res_err!(extract_id(req, "Dish"), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::admin::disable_dish(&ctx.pool, &ctx.token_service, token, id).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});
