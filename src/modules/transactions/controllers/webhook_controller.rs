use std::sync::Arc;

use actix_web::{web, HttpResponse};

use crate::modules::transactions::models::PaymentCallback;
use crate::queue::{MessagePublisher, QueueMessage};

/// ToyyibPay payment callback
/// POST /webhooks/toyyibpay
///
/// Always answers `200 OK`: the callback is only a prompt to reconcile, and
/// the gateway is re-queried for the real outcome. Anything unparseable is
/// logged and dropped.
pub async fn toyyibpay_callback(
    publisher: web::Data<Arc<dyn MessagePublisher>>,
    body: web::Bytes,
) -> HttpResponse {
    match PaymentCallback::from_body(&body) {
        Some(callback) => {
            tracing::info!(
                order_id = ?callback.order_id,
                billcode = ?callback.billcode,
                status_id = ?callback.status_id,
                "Payment callback received"
            );

            if let Err(e) = publisher
                .publish(QueueMessage::PaymentCallback(callback))
                .await
            {
                tracing::error!(error = %e, "Failed to queue payment callback");
            }
        }
        None => {
            tracing::warn!(bytes = body.len(), "Unparseable payment callback ignored");
        }
    }

    ok()
}

fn ok() -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body("OK")
}

/// Configure webhook routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/webhooks").route("/toyyibpay", web::post().to(toyyibpay_callback)),
    );
}
