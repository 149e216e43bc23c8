//! HTTP handlers.
//!
//! Every endpoint is a [`salvo::Handler`] holding the shared [`ApiContext`]. A
//! handler parses the request, calls the matching use case and renders
//! the resource or the error.

use std::str::FromStr;

use salvo::{http::StatusCode, writer::Json, Request, Response};
use serde::Serialize;
use sqlx::PgPool;

use crate::{
    app::use_case::auth::TokenLifetime,
    base::Pagination,
    domain::service::{Mailer, PaymentGateway, RecommendationService},
    error::{app::ApplicationError, security::UnauthorizedError},
    infra::service::security::{Argon2HashService, JWTEncryptionService},
};

/// Services shared by every handler.
pub struct ApiContext {
    pub pool: PgPool,
    pub hash_service: Argon2HashService,
    pub token_service: JWTEncryptionService,
    pub token_lifetime: TokenLifetime,
    pub payment_gateway: Box<dyn PaymentGateway>,
    pub mailer: Box<dyn Mailer>,
    pub recommendation_service: Option<Box<dyn RecommendationService>>,
}

impl ApiContext {
    pub fn recommendation_service(&self) -> Option<&dyn RecommendationService> {
        self.recommendation_service.as_deref()
    }
}

macro_rules! map_res_err {
    ($result:expr, $response:ident) => {
        match $result {
            Err(err) => {
                $response.render(err);
                return;
            }
            Ok(ok) => ok,
        }
    };
}

/// Declare a handler over the shared context.
macro_rules! controller {
    ($(#[$meta:meta])* $name:ident, |$ctx:ident, $req:ident, $res:ident| $body:block) => {
        $(#[$meta])*
        pub struct $name(std::sync::Arc<$crate::infra::controller::ApiContext>);

        impl $name {
            pub fn new(ctx: std::sync::Arc<$crate::infra::controller::ApiContext>) -> Self {
                Self(ctx)
            }
        }

        #[async_trait::async_trait]
        impl salvo::Handler for $name {
            async fn handle(
                &self,
                $req: &mut salvo::Request,
                _: &mut salvo::Depot,
                $res: &mut salvo::Response,
                _: &mut salvo::FlowCtrl,
            ) {
                let $ctx: &$crate::infra::controller::ApiContext = self.0.as_ref();
                $body
            }
        }
    };
}

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalogue;
pub mod checkout;
pub mod order;
pub mod review;
pub mod user;

/// Extract a authorization token from a request.
///
/// Token must be formated in the Bearer authentication scheme
/// described in [RFC 6750](https://datatracker.ietf.org/doc/html/rfc6750)
pub(crate) fn extract_token(req: &Request) -> Result<&str, ApplicationError> {
    let scheme: Option<&str> = req.header("authorization");
    let token = scheme
        .ok_or(UnauthorizedError::TokenNotPresent)?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(UnauthorizedError::MalformattedToken)?;
    Ok(token)
}

/// Numeric id of the routed resource.
pub(crate) fn extract_id(req: &Request, resource: &'static str) -> Result<i64, ApplicationError> {
    req.params()
        .get("id")
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| ApplicationError::not_found(resource))
}

/// Query string value; absent or unparsable values are `None`.
pub(crate) fn query_value<T: FromStr>(req: &Request, key: &str) -> Option<T> {
    req.queries()
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse().ok())
}

pub(crate) fn pagination(req: &Request, default_per_page: i64) -> Pagination {
    Pagination::new(
        query_value(req, "page"),
        query_value(req, "per_page"),
        default_per_page,
    )
}

pub(crate) fn reply<T>(res: &mut Response, status: StatusCode, body: T)
where
    T: Serialize + Send,
{
    res.render(Json(body));
    res.set_status_code(status);
}
