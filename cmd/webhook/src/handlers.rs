use crate::state::WebhookState;

use std::sync::atomic::{AtomicBool, Ordering};

use autodel_admission::mutate;
use autodel_admission::review::{AdmissionResponse, AdmissionReview};
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::Json;
use axum::routing::{Router, get, post};
use tracing::error;

pub static READYZ_READY: AtomicBool = AtomicBool::new(true);

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/livez", get(livez))
        .route("/readyz", get(readyz))
        .route("/mutate", post(mutate_resource))
        .fallback(root)
        .with_state(state)
}

/// Echo handler kept on the root path for liveness probes and manual
/// poking.
async fn root(uri: Uri) -> String {
    format!("hello {:?}", uri.path())
}

async fn livez() -> &'static str {
    "healthy"
}

async fn readyz() -> StatusCode {
    if READYZ_READY.load(Ordering::Relaxed) {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

pub async fn mutate_resource(
    State(state): State<WebhookState>,
    Json(review): Json<AdmissionReview>,
) -> Json<AdmissionReview> {
    let response = match review.request.as_ref() {
        Some(request) => mutate::mutate(request, &state.config),
        None => {
            error!("missing request in admission review");
            AdmissionResponse::deny(
                "unknown".to_string(),
                400,
                "invalid admission review: missing request",
            )
        }
    };
    Json(review.response(response))
}
