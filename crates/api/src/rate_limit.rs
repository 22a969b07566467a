//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Limits classification requests per client IP using tower_governor.
//! The Generic Cell Rate Algorithm (GCRA) enforces the quota without
//! background processes.

use governor::middleware::StateInformationMiddleware;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

/// Governor config keyed by peer IP, emitting X-RateLimit-* headers
pub type DefaultGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Seconds needed to replenish one request
    pub replenish_seconds: u64,
    /// Burst size (max requests that can be made immediately)
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            replenish_seconds: 2,
            burst_size: 5,
        }
    }
}

/// Build the governor config for the classify route.
///
/// Returns `None` when the quota is degenerate (zero period or burst).
/// Peer IP extraction requires serving with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_governor_config(config: &RateLimitConfig) -> Option<Arc<DefaultGovernorConfig>> {
    GovernorConfigBuilder::default()
        .per_second(config.replenish_seconds)
        .burst_size(config.burst_size)
        .use_headers()
        .finish()
        .map(Arc::new)
}
