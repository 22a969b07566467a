//! Classification Routes

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::{counter, histogram};
use scene_classifier::{decode_image, ClassifierError, ErrorKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::AppState;

/// Header naming the failure kind on error responses
pub const ERROR_KIND_HEADER: &str = "x-classifier-error";

/// Query parameters for the classify endpoint
#[derive(Debug, Deserialize)]
pub struct ClassifyQuery {
    /// Only return the N most probable labels, highest first
    pub top: Option<usize>,
}

/// Body returned whenever classification fails
#[derive(Debug, Serialize)]
pub struct ErrorSentinel {
    pub error: f64,
}

impl Default for ErrorSentinel {
    fn default() -> Self {
        Self { error: 1.0 }
    }
}

/// Classify an uploaded image (raw encoded bytes as the request body)
pub async fn classify(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ClassifyQuery>,
    body: Bytes,
) -> Response {
    if body.is_empty() {
        return error_response(ClassifierError::missing_image());
    }

    debug!("Classifying upload of {} bytes", body.len());
    let start = Instant::now();
    let predictor = state.predictor.clone();

    let outcome = tokio::task::spawn_blocking(move || {
        let image = decode_image(&body)?;
        predictor.predict(&image)
    })
    .await
    .unwrap_or_else(|e| Err(ClassifierError::PredictionFailed(e.to_string())));

    histogram!("classifier_inference_seconds").record(start.elapsed().as_secs_f64());

    match outcome {
        Ok(prediction) => {
            counter!("classifier_requests_total", "outcome" => "success").increment(1);
            let prediction = match params.top {
                Some(n) => prediction.into_ranked(n),
                None => prediction,
            };
            Json(prediction).into_response()
        }
        Err(e) => error_response(e),
    }
}

fn error_response(err: ClassifierError) -> Response {
    let kind = err.kind();
    warn!("Classification failed ({}): {}", kind.as_str(), err);
    counter!("classifier_requests_total", "outcome" => kind.as_str()).increment(1);

    let status = match kind {
        ErrorKind::InvalidInput => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::PredictionFailure | ErrorKind::ModelLoadFailure => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        [(ERROR_KIND_HEADER, kind.as_str())],
        Json(ErrorSentinel::default()),
    )
        .into_response()
}
