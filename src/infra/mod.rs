pub mod controller;
pub mod database;
pub mod middleware;
pub mod seed;
pub mod service;

pub mod router {
    use std::{sync::Arc, time::Duration};

    use salvo::{logging::Logger, routing::PathFilter, Router};

    use super::{
        controller::{admin, auth, cart, catalogue, checkout, order, review, user, ApiContext},
        middleware::{Cors, RateLimiter, Timeout},
    };

    fn auth(ctx: &Arc<ApiContext>) -> Router {
        Router::with_path("auth")
            .push(Router::with_path("health").get(auth::HealthController::new(ctx.clone())))
            .push(
                Router::with_path("register")
                    .hoop(RateLimiter::new(5, 15))
                    .post(auth::RegisterController::new(ctx.clone())),
            )
            .push(
                Router::with_path("login")
                    .hoop(RateLimiter::new(10, 15))
                    .post(auth::LoginController::new(ctx.clone())),
            )
            .push(Router::with_path("refresh").post(auth::RefreshController::new(ctx.clone())))
            .push(Router::with_path("me").get(auth::MeController::new(ctx.clone())))
            .push(Router::with_path("logout").post(auth::LogoutController::new(ctx.clone())))
            .push(
                Router::with_path("reset-password")
                    .hoop(RateLimiter::new(5, 15))
                    .post(auth::ResetPasswordController::new(ctx.clone())),
            )
    }

    fn users(ctx: &Arc<ApiContext>) -> Router {
        Router::with_path("users")
            .push(
                Router::with_path("profile")
                    .get(user::GetProfileController::new(ctx.clone()))
                    .put(user::UpdateProfileController::new(ctx.clone())),
            )
            .push(Router::with_path("preferences").put(user::UpdatePreferencesController::new(ctx.clone())))
    }

    fn producers(ctx: &Arc<ApiContext>) -> Router {
        Router::with_path("producers")
            .get(catalogue::ListProducersController::new(ctx.clone()))
            .push(
                Router::with_path("profile")
                    .get(catalogue::GetKitchenProfileController::new(ctx.clone()))
                    .put(catalogue::UpdateKitchenProfileController::new(ctx.clone())),
            )
            .push(Router::with_path("nearby").get(catalogue::NearbyProducersController::new(ctx.clone())))
            .push(Router::with_path("<id:digits>").get(catalogue::GetProducerController::new(ctx.clone())))
    }

    fn dishes(ctx: &Arc<ApiContext>) -> Router {
        Router::with_path("dishes")
            .get(catalogue::ListDishesController::new(ctx.clone()))
            .post(catalogue::CreateDishController::new(ctx.clone()))
            .push(Router::with_path("my-dishes").get(catalogue::MyDishesController::new(ctx.clone())))
            .push(
                Router::with_path("<id:digits>")
                    .get(catalogue::GetDishController::new(ctx.clone()))
                    .put(catalogue::UpdateDishController::new(ctx.clone()))
                    .delete(catalogue::DeleteDishController::new(ctx.clone())),
            )
    }

    fn orders(ctx: &Arc<ApiContext>) -> Router {
        Router::with_path("orders")
            .get(order::ListOrdersController::new(ctx.clone()))
            .push(
                Router::with_path("<id:digits>")
                    .get(order::GetOrderController::new(ctx.clone()))
                    .push(Router::with_path("track").get(order::TrackOrderController::new(ctx.clone())))
                    .push(Router::with_path("status").put(order::UpdateOrderStatusController::new(ctx.clone())))
                    .push(Router::with_path("accept").post(order::AcceptOrderController::new(ctx.clone())))
                    .push(Router::with_path("reject").post(order::RejectOrderController::new(ctx.clone()))),
            )
    }

    fn cart(ctx: &Arc<ApiContext>) -> Router {
        Router::with_path("cart")
            .get(cart::GetCartController::new(ctx.clone()))
            .post(cart::AddCartItemController::new(ctx.clone()))
            .delete(cart::ClearCartController::new(ctx.clone()))
            .push(
                Router::with_path("<id:digits>")
                    .put(cart::UpdateCartItemController::new(ctx.clone()))
                    .delete(cart::RemoveCartItemController::new(ctx.clone())),
            )
    }

    fn checkout(ctx: &Arc<ApiContext>) -> Router {
        Router::with_path("checkout")
            .push(
                Router::with_path("create-payment-intent")
                    .post(checkout::CreatePaymentIntentController::new(ctx.clone())),
            )
            .push(Router::with_path("confirm-order").post(checkout::ConfirmOrderController::new(ctx.clone())))
    }

    fn reviews(ctx: &Arc<ApiContext>) -> Router {
        Router::with_path("reviews")
            .post(review::CreateReviewController::new(ctx.clone()))
            .push(Router::with_path("dish/<id:digits>").get(review::DishReviewsController::new(ctx.clone())))
            .push(
                Router::with_path("producer/<id:digits>").get(review::ProducerReviewsController::new(ctx.clone())),
            )
            .push(
                Router::with_path("<id:digits>")
                    .get(review::GetReviewController::new(ctx.clone()))
                    .push(Router::with_path("response").post(review::RespondReviewController::new(ctx.clone()))),
            )
    }

    fn ai(ctx: &Arc<ApiContext>) -> Router {
        Router::with_path("ai")
            .push(Router::with_path("popular").get(catalogue::PopularDishesController::new(ctx.clone())))
            .push(Router::with_path("recommendations").get(catalogue::RecommendationsController::new(ctx.clone())))
    }

    fn admin(ctx: &Arc<ApiContext>) -> Router {
        let producers = Router::with_path("producers")
            .push(Router::with_path("pending").get(admin::PendingProducersController::new(ctx.clone())))
            .push(
                Router::with_path("<id:digits>")
                    .put(admin::UpdateProducerController::new(ctx.clone()))
                    .push(Router::with_path("approve").post(admin::ApproveProducerController::new(ctx.clone())))
                    .push(Router::with_path("reject").post(admin::RejectProducerController::new(ctx.clone())))
                    .push(Router::with_path("suspend").post(admin::SuspendProducerController::new(ctx.clone()))),
            );

        let users = Router::with_path("users")
            .get(admin::ListUsersController::new(ctx.clone()))
            .push(Router::with_path("<id:digits>/suspend").post(admin::SuspendUserController::new(ctx.clone())));

        let reviews = Router::with_path("reviews")
            .get(admin::ListReviewsController::new(ctx.clone()))
            .push(Router::with_path("<id:digits>/hide").post(admin::HideReviewController::new(ctx.clone())));

        let reports = Router::with_path("reports")
            .push(Router::with_path("sales").get(admin::SalesReportController::new(ctx.clone())))
            .push(Router::with_path("user-growth").get(admin::UserGrowthReportController::new(ctx.clone())))
            .push(
                Router::with_path("producer-performance")
                    .get(admin::ProducerPerformanceReportController::new(ctx.clone())),
            )
            .push(
                Router::with_path("delivery-metrics").get(admin::DeliveryMetricsReportController::new(ctx.clone())),
            );

        let dishes = Router::with_path("dishes")
            .get(admin::ListDishesController::new(ctx.clone()))
            .push(
                Router::with_path("<id:digits>")
                    .put(admin::UpdateDishController::new(ctx.clone()))
                    .delete(admin::DeleteDishController::new(ctx.clone()))
                    .push(Router::with_path("approve").post(admin::ApproveDishController::new(ctx.clone())))
                    .push(Router::with_path("disable").post(admin::DisableDishController::new(ctx.clone()))),
            );

        Router::with_path("admin")
            .push(Router::with_path("dashboard").get(admin::DashboardController::new(ctx.clone())))
            .push(producers)
            .push(users)
            .push(Router::with_path("orders").get(admin::ListOrdersController::new(ctx.clone())))
            .push(reviews)
            .push(reports)
            .push(dishes)
    }

    pub fn app(ctx: Arc<ApiContext>, timeout: Duration) -> Router {
        PathFilter::register_wisp_regex(
            "digits",
            regex::Regex::new("^[0-9]+$").expect("Expect a valid numeric id regex"),
        );

        Router::new()
            .hoop(Logger)
            .hoop(Cors)
            .hoop(Timeout(timeout))
            .push(Router::with_path("health").get(auth::HealthController::new(ctx.clone())))
            .push(
                Router::with_path("api")
                    .push(auth(&ctx))
                    .push(users(&ctx))
                    .push(producers(&ctx))
                    .push(dishes(&ctx))
                    .push(orders(&ctx))
                    .push(cart(&ctx))
                    .push(checkout(&ctx))
                    .push(reviews(&ctx))
                    .push(ai(&ctx))
                    .push(admin(&ctx)),
            )
            .push(Router::with_path("<**rest>").options(Cors))
    }
}
