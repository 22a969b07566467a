//! Label Routes

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Response for labels endpoint
#[derive(Debug, Serialize)]
pub struct LabelsResponse {
    pub model: String,
    pub labels: Vec<String>,
}

/// Get the model's label vocabulary, in output order
pub async fn get_labels(State(state): State<Arc<AppState>>) -> Json<LabelsResponse> {
    Json(LabelsResponse {
        model: state.predictor.model_name().to_string(),
        labels: state.predictor.labels().to_vec(),
    })
}
