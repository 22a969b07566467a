//! Nature Scene Classifier Web Server
//!
//! Upload page and JSON classification endpoint on top of a loaded predictor.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use scene_classifier::Predictor;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub mod page;
pub mod rate_limit;
pub mod routes;
pub mod settings;

use rate_limit::{create_governor_config, DefaultGovernorConfig};
use settings::{ServerConfig, Settings};

/// Application state shared across handlers.
///
/// Read-only after startup, so handlers share it without locking.
pub struct AppState {
    /// Loaded classifier
    pub predictor: Predictor,
    /// Classes shown in the ranked display
    pub top_classes: usize,
    /// Largest accepted upload
    pub max_upload_bytes: usize,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(predictor: Predictor, server: &ServerConfig) -> Self {
        Self {
            predictor,
            top_classes: server.top_classes,
            max_upload_bytes: server.max_upload_bytes,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for the `/metrics` route
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub model: String,
    pub label_count: usize,
}

/// Create the application router.
///
/// `rate_limit` is applied to the classify route only.
pub fn create_router(
    state: Arc<AppState>,
    rate_limit: Option<Arc<DefaultGovernorConfig>>,
) -> Router {
    let mut classify = post(routes::classify::classify);
    if let Some(config) = rate_limit {
        classify = classify.layer(GovernorLayer { config });
    }

    Router::new()
        .route("/", get(page::index))
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/labels", get(routes::labels::get_labels))
        .route("/api/v1/classify", classify)
        .route("/metrics", get(metrics_handler))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model: state.predictor.model_name().to_string(),
        label_count: state.predictor.labels().len(),
    })
}

/// Prometheus exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Initialize logging (`RUST_LOG` overrides the default level)
pub fn init_logging(verbose: bool) {
    let default = if verbose {
        "debug"
    } else {
        "info,tower_http=warn"
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Run the server until it is shut down
pub async fn run_server(settings: Settings, predictor: Predictor) -> anyhow::Result<()> {
    use anyhow::Context;

    let addr: SocketAddr = settings.bind_addr()?;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install metrics recorder")?;

    let governor = create_governor_config(&settings.server.rate_limit)
        .context("Invalid rate limit: replenish_seconds and burst_size must be non-zero")?;

    let state = Arc::new(AppState::new(predictor, &settings.server).with_metrics(handle));
    let app = create_router(state, Some(governor)).layer(TraceLayer::new_for_http());

    info!("Starting classifier UI on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use image::{DynamicImage, Rgb, RgbImage};
    use scene_classifier::HeuristicModel;
    use std::io::Cursor;
    use tower::ServiceExt;

    fn app() -> Router {
        let predictor = Predictor::from_model(HeuristicModel::new());
        let state = Arc::new(AppState::new(predictor, &ServerConfig::default()));
        create_router(state, None)
    }

    fn png(color: [u8; 3]) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(48, 48, Rgb(color)))
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn classify_request(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_classify_returns_every_label() {
        let response = app()
            .oneshot(classify_request("/api/v1/classify", png([30, 120, 40])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let scores = body.as_object().unwrap();
        assert_eq!(scores.len(), 4);
        for label in ["beach", "bird", "fish", "forest"] {
            let p = scores[label].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[tokio::test]
    async fn test_classify_ranked_top() {
        let response = app()
            .oneshot(classify_request("/api/v1/classify?top=2", png([30, 120, 40])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with(r#"{"forest":"#));

        let body: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(body.as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_upload_returns_sentinel() {
        let response = app()
            .oneshot(classify_request("/api/v1/classify", Vec::new()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.headers()[routes::classify::ERROR_KIND_HEADER],
            "invalid_input"
        );
        assert_eq!(json_body(response).await, serde_json::json!({ "error": 1.0 }));
    }

    #[tokio::test]
    async fn test_undecodable_upload_returns_sentinel() {
        let response = app()
            .oneshot(classify_request("/api/v1/classify", b"plain text".to_vec()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await, serde_json::json!({ "error": 1.0 }));
    }

    #[tokio::test]
    async fn test_labels_and_health() {
        let response = app()
            .oneshot(Request::get("/api/v1/labels").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["model"], "nature_scene_heuristic");
        assert_eq!(
            body["labels"],
            serde_json::json!(["beach", "bird", "fish", "forest"])
        );

        let response = app()
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["label_count"], 4);
    }

    #[tokio::test]
    async fn test_index_page() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("const TOP_CLASSES = 4;"));
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let response = app()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected() {
        let predictor = Predictor::from_model(HeuristicModel::new());
        let server = ServerConfig {
            max_upload_bytes: 16,
            ..ServerConfig::default()
        };
        let app = create_router(Arc::new(AppState::new(predictor, &server)), None);

        let response = app
            .oneshot(classify_request("/api/v1/classify", png([30, 120, 40])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
