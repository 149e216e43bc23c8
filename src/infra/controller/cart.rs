use salvo::http::StatusCode;

use super::{extract_id, extract_token, reply};
use crate::{
    app::{
        resource::cart::{AddCartItem, UpdateCartItem},
        use_case,
    },
    error::http::BadRequest,
};

controller!(GetCartController, |ctx, req, res| {
    let token = map_res_err!(extract_token(req), res);
    let result = use_case::cart::get_cart(&ctx.pool, &ctx.token_service, token).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(AddCartItemController, |ctx, req, res| {
    let form = map_res_err!(req.parse_body::<AddCartItem>().await.map_err(BadRequest::from), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::cart::add_item(&ctx.pool, &ctx.token_service, token, form).await;
    reply(res, StatusCode::CREATED, map_res_err!(result, res));
});

controller!(UpdateCartItemController, |ctx, req, res| {
    let form = map_res_err!(req.parse_body::<UpdateCartItem>().await.map_err(BadRequest::from), res);
    let id = map_res_err!(extract_id(req, "Cart item"), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::cart::update_item(&ctx.pool, &ctx.token_service, token, id, form).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(RemoveCartItemController, |ctx, req, res| {
    let id = map_res_err!(extract_id(req, "Cart item"), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::cart::remove_item(&ctx.pool, &ctx.token_service, token, id).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(ClearCartController, |ctx, req, res| {
    let token = map_res_err!(extract_token(req), res);
    let result = use_case::cart::clear(&ctx.pool, &ctx.token_service, token).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});
