use salvo::{http::StatusCode, Request};

use super::{extract_id, extract_token, query_value, reply};
use crate::{
    app::{
        resource::order::{OrderQuery, RejectOrder, StatusUpdate},
        use_case,
    },
    error::http::BadRequest,
};

pub(crate) fn order_query(req: &Request) -> OrderQuery {
    OrderQuery {
        status: query_value(req, "status"),
        payment_status: query_value(req, "payment_status"),
        page: query_value(req, "page"),
        per_page: query_value(req, "per_page"),
    }
}

controller!(ListOrdersController, |ctx, req, res| {
    let query = order_query(req);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::order::list_orders(&ctx.pool, &ctx.token_service, token, query).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(GetOrderController, |ctx, req, res| {
    let id = map_res_err!(extract_id(req, "Order"), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::order::get_order(&ctx.pool, &ctx.token_service, token, id).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(TrackOrderController, |ctx, req, res| {
    let id = map_res_err!(extract_id(req, "Order"), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::order::track_order(&ctx.pool, &ctx.token_service, token, id).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(UpdateOrderStatusController, |ctx, req, res| {
    let form = map_res_err!(req.parse_body::<StatusUpdate>().await.map_err(BadRequest::from), res);
    let id = map_res_err!(extract_id(req, "Order"), res);
    let token = map_res_err!(extract_token(req), res);

    let result =
        use_case::order::update_status(&ctx.pool, &ctx.token_service, ctx.mailer.as_ref(), token, id, form).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(AcceptOrderController, |ctx, req, res| {
    let id = map_res_err!(extract_id(req, "Order"), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::order::accept_order(&ctx.pool, &ctx.token_service, ctx.mailer.as_ref(), token, id).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(
    /// Cancel a new or accepted order. The body and its reason are optional.
    RejectOrderController,
    |ctx, req, res| {
        let form = req.parse_body::<RejectOrder>().await.unwrap_or_default();
        let id = map_res_err!(extract_id(req, "Order"), res);
        let token = map_res_err!(extract_token(req), res);

        let result =
            use_case::order::reject_order(&ctx.pool, &ctx.token_service, ctx.mailer.as_ref(), token, id, form).await;
        reply(res, StatusCode::OK, map_res_err!(result, res));
    }
);
