//! Kitchens, dishes and dish discovery.

use salvo::{http::StatusCode, Request};

use super::{extract_id, extract_token, query_value, reply};
use crate::{
    app::{
        resource::{
            dish::{DishPatch, DishQuery, LocalQuery, NewDish},
            producer::{NearbyQuery, ProducerPatch, ProducerQuery},
        },
        use_case,
    },
    error::http::BadRequest,
};

fn producer_query(req: &Request) -> ProducerQuery {
    ProducerQuery {
        status: query_value(req, "status"),
        city: query_value(req, "city"),
        cuisine_specialty: query_value(req, "cuisine_specialty"),
        page: query_value(req, "page"),
        per_page: query_value(req, "per_page"),
    }
}

fn dish_query(req: &Request) -> DishQuery {
    DishQuery {
        producer_id: query_value(req, "producer_id"),
        lat: query_value(req, "lat"),
        lon: query_value(req, "lon"),
        radius: query_value(req, "radius"),
        category: query_value(req, "category"),
        dietary_type: query_value(req, "dietary_type"),
        spice_level: query_value(req, "spice_level"),
        min_price: query_value(req, "min_price"),
        max_price: query_value(req, "max_price"),
        search: query_value(req, "search"),
        sort_by: query_value(req, "sort_by"),
        page: query_value(req, "page"),
        per_page: query_value(req, "per_page"),
    }
}

fn local_query(req: &Request) -> LocalQuery {
    LocalQuery {
        lat: query_value(req, "lat"),
        lon: query_value(req, "lon"),
        limit: query_value(req, "limit"),
    }
}

controller!(ListProducersController, |ctx, req, res| {
    let result = use_case::producer::list_producers(&ctx.pool, producer_query(req)).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(GetProducerController, |ctx, req, res| {
    let id = map_res_err!(extract_id(req, "Producer"), res);
    let result = use_case::producer::get_producer(&ctx.pool, id).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(NearbyProducersController, |ctx, req, res| {
    let query = NearbyQuery {
        lat: query_value(req, "lat"),
        lon: query_value(req, "lon"),
        radius: query_value(req, "radius"),
    };
    let result = use_case::producer::nearby_producers(&ctx.pool, query).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(GetKitchenProfileController, |ctx, req, res| {
    let token = map_res_err!(extract_token(req), res);
    let result = use_case::producer::get_own_profile(&ctx.pool, &ctx.token_service, token).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(UpdateKitchenProfileController, |ctx, req, res| {
    let patch = map_res_err!(req.parse_body::<ProducerPatch>().await.map_err(BadRequest::from), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::producer::update_own_profile(&ctx.pool, &ctx.token_service, token, patch).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(ListDishesController, |ctx, req, res| {
    let result = use_case::dish::list_dishes(&ctx.pool, dish_query(req)).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(GetDishController, |ctx, req, res| {
    let id = map_res_err!(extract_id(req, "Dish"), res);
    let result = use_case::dish::get_dish(&ctx.pool, id).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(CreateDishController, |ctx, req, res| {
    let form = map_res_err!(req.parse_body::<NewDish>().await.map_err(BadRequest::from), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::dish::create_dish(&ctx.pool, &ctx.token_service, token, form).await;
    reply(res, StatusCode::CREATED, map_res_err!(result, res));
});

controller!(UpdateDishController, |ctx, req, res| {
    let patch = map_res_err!(req.parse_body::<DishPatch>().await.map_err(BadRequest::from), res);
    let id = map_res_err!(extract_id(req, "Dish"), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::dish::update_dish(&ctx.pool, &ctx.token_service, token, id, patch).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(DeleteDishController, |ctx, req, res| {
    let id = map_res_err!(extract_id(req, "Dish"), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::dish::delete_dish(&ctx.pool, &ctx.token_service, token, id).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(MyDishesController, |ctx, req, res| {
    let token = map_res_err!(extract_token(req), res);
    let result = use_case::dish::my_dishes(&ctx.pool, &ctx.token_service, token).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(PopularDishesController, |ctx, req, res| {
    let result = use_case::recommendation::popular(&ctx.pool, local_query(req)).await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(
    /// Personal picks, from the recommendation service when it answers.
    RecommendationsController,
    |ctx, req, res| {
        let query = local_query(req);
        let token = map_res_err!(extract_token(req), res);

        let result = use_case::recommendation::recommend(
            &ctx.pool,
            &ctx.token_service,
            ctx.recommendation_service(),
            token,
            query,
        )
        .await;
        reply(res, StatusCode::OK, map_res_err!(result, res));
    }
);
