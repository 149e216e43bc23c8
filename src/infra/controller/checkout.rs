use salvo::http::StatusCode;

use super::{extract_token, reply};
use crate::{
    app::{
        resource::checkout::{ConfirmOrder, PaymentIntentRequest},
        use_case,
    },
    error::http::BadRequest,
};

controller!(CreatePaymentIntentController, |ctx, req, res| {
    let form = map_res_err!(req.parse_body::<PaymentIntentRequest>().await.map_err(BadRequest::from), res);
    let token = map_res_err!(extract_token(req), res);

    let result = use_case::checkout::create_payment_intent(
        &ctx.pool,
        &ctx.token_service,
        ctx.payment_gateway.as_ref(),
        token,
        form,
    )
    .await;
    reply(res, StatusCode::OK, map_res_err!(result, res));
});

controller!(
    /// Verify the payment and turn the cart into an order.
    ConfirmOrderController,
    |ctx, req, res| {
        let form = map_res_err!(req.parse_body::<ConfirmOrder>().await.map_err(BadRequest::from), res);
        let token = map_res_err!(extract_token(req), res);

        let result = use_case::checkout::confirm_order(
            &ctx.pool,
            &ctx.token_service,
            ctx.payment_gateway.as_ref(),
            ctx.mailer.as_ref(),
            token,
            form,
        )
        .await;
        reply(res, StatusCode::CREATED, map_res_err!(result, res));
    }
);
