use std::collections::HashMap;

use serde_json::json;
use sqlx::PgPool;

use super::{authorize, dish::nearby_kitchen_ids, dish_views, ANY_ROLE};
use crate::{
    app::resource::{
        dish::{DishResponse, LocalQuery, Recommendations},
        Keyed,
    },
    domain::{
        entity::{Entity, Producer, User},
        recommendation::{History, Kitchen, Recommender},
        service::{RecommendationService, TokenEncryptionService},
    },
    error::app::ApplicationError,
    infra::database::repository::{dish, order, producer, review},
};

pub const POPULAR_RADIUS_KM: f64 = 10.0;
pub const RULE_BASED: &str = "rule-based";

/// Best rated available dishes, local ones when any kitchen is close.
pub async fn popular(pool: &PgPool, query: LocalQuery) -> Result<Keyed<Vec<DishResponse>>, ApplicationError> {
    let nearby = match query.origin() {
        Some(origin) => Some(nearby_kitchen_ids(pool, &origin, POPULAR_RADIUS_KM).await?),
        None => None,
    }
    .filter(|ids| !ids.is_empty());

    let dishes = dish::popular_dishes(pool, nearby.as_deref(), query.limit() as i64).await?;
    Ok(Keyed("dishes", dish_views(pool, &dishes).await?))
}

fn engine_request(caller: &User, query: &LocalQuery) -> serde_json::Value {
    let preferences = caller.preferences();
    json!({
        "user_id": caller.ident(),
        "lat": query.lat,
        "lon": query.lon,
        "limit": query.limit(),
        "preferences": {
            "dietary_preferences": preferences.dietary_preferences,
            "dietary_restrictions": preferences.dietary_restrictions(),
            "allergens": preferences.allergens(),
            "spice_level": preferences.spice_level,
            "preferred_cuisines": preferences.preferred_cuisines(),
            "budget_preference": preferences.budget_preference,
            "meal_preferences": preferences.meal_preferences(),
        }
    })
}

/// Personal recommendations, from the external engine when it answers.
pub async fn recommend<TS>(
    pool: &PgPool,
    token_service: &TS,
    engine: Option<&dyn RecommendationService>,
    token: &str,
    query: LocalQuery,
) -> Result<Recommendations, ApplicationError>
where
    TS: TokenEncryptionService,
{
    let caller = authorize(pool, token_service, token, ANY_ROLE).await?;

    if let Some(engine) = engine {
        match engine.recommend(&engine_request(&caller, &query)).await {
            Ok(Some(answer)) => return Ok(Recommendations::External(answer)),
            Ok(None) => tracing::debug!(user = caller.ident(), "recommendation engine declined, ranking locally"),
            Err(err) => tracing::warn!(user = caller.ident(), "recommendation engine unavailable, ranking locally: {err}"),
        }
    }

    let (ordered_dishes, ordered_producers) = order::ordered_by_customer(pool, caller.ident()).await?;
    let history = History {
        ordered_dishes,
        ordered_producers,
        liked_dishes: review::liked_dishes(pool, caller.ident()).await?,
    };
    let kitchens: HashMap<i64, Kitchen> = producer::all_producers(pool)
        .await?
        .iter()
        .map(|kitchen: &Producer| {
            (
                kitchen.ident(),
                Kitchen {
                    cuisine: kitchen.state.cuisine_specialty.clone(),
                    coordinates: kitchen.coordinates(),
                    trading: kitchen.is_trading(),
                },
            )
        })
        .collect();

    let available = dish::available_dishes(pool).await?;
    let ranked = Recommender::new(caller.preferences(), &history, &kitchens).recommend(
        available,
        query.origin(),
        query.limit(),
    );
    tracing::debug!(user = caller.ident(), count = ranked.len(), "rule based recommendations");

    Ok(Recommendations::RuleBased {
        recommendations: dish_views(pool, &ranked).await?,
        source: RULE_BASED,
    })
}
