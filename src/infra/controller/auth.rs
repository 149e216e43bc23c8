use salvo::http::StatusCode;

use super::{extract_token, reply};
use crate::{
    app::{
        resource::auth::{Credentials, RegisterUser, ResetPassword},
        use_case,
    },
    error::http::BadRequest,
};

controller!(HealthController, |_ctx, _req, res| {
    reply(res, StatusCode::OK, use_case::auth::health());
});

controller!(RegisterController, |ctx, req, res| {
    let form = map_res_err!(req.parse_body::<RegisterUser>().await.map_err(BadRequest::from), res);

    let result = use_case::auth::register(
        &ctx.pool,
        &ctx.hash_service,
        &ctx.token_service,
        ctx.token_lifetime,
        form,
    )
    .await;
    reply(res, StatusCode::CREATED, map_res_err!(result, res));
});

controller!(LoginController, |ctx, req, res| {
    let credentials = map_res_err!(req.parse_body::<Credentials>().await.map_err(BadRequest::from), res);

    let result = use_case::auth::login(
        &ctx.pool,
        &ctx.hash_service,
        &ctx.token_service,
        ctx.token_lifetime,
        credentials,
    )
    .await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(
    /// Trade a refresh token for a new access token.
    RefreshController,
    |ctx, req, res| {
        let token = map_res_err!(extract_token(req), res);
        let result = use_case::auth::refresh(&ctx.pool, &ctx.token_service, ctx.token_lifetime, token).await;
        reply(res, StatusCode::OK, map_res_err!(result, res));
    }
);

controller!(MeController, |ctx, req, res| {
    let token = map_res_err!(extract_token(req), res);
    let result = use_case::auth::me(&ctx.pool, &ctx.token_service, token).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(LogoutController, |ctx, req, res| {
    let token = map_res_err!(extract_token(req), res);
    let result = use_case::auth::logout(&ctx.token_service, token);
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(ResetPasswordController, |ctx, req, res| {
    let form = map_res_err!(req.parse_body::<ResetPassword>().await.map_err(BadRequest::from), res);
    let result = use_case::auth::reset_password(&ctx.pool, &ctx.hash_service, form).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});
