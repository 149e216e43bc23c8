use salvo::http::StatusCode;

use super::{extract_token, reply};
use crate::{
    app::{
        resource::user::{PreferencesPatch, ProfilePatch},
        use_case,
    },
    error::http::BadRequest,
};

controller!(GetProfileController, |ctx, req, res| {
    let token = map_res_err!(extract_token(req), res);
    let result = use_case::user::get_profile(&ctx.pool, &ctx.token_service, token).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(UpdateProfileController, |ctx, req, res| {
    let patch = map_res_err!(req.parse_body::<ProfilePatch>().await.map_err(BadRequest::from), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::user::update_profile(&ctx.pool, &ctx.token_service, token, patch).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(UpdatePreferencesController, |ctx, req, res| {
    let patch = map_res_err!(req.parse_body::<PreferencesPatch>().await.map_err(BadRequest::from), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::user::update_preferences(&ctx.pool, &ctx.token_service, token, patch).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});
