//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Limits the ingestion route per peer IP with tower_governor, so one
//! misbehaving transport cannot flood the pipeline.

use crate::settings::RateLimitSettings;
use governor::middleware::StateInformationMiddleware;
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

/// Governor config with X-RateLimit-* headers enabled
pub type IngestGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Build the governor config, `None` if disabled or the quota is zero.
///
/// Requires the service to be served with
/// `into_make_service_with_connect_info::<SocketAddr>()` for IP extraction.
pub fn create_governor_config(settings: &RateLimitSettings) -> Option<Arc<IngestGovernorConfig>> {
    if !settings.enabled {
        return None;
    }
    let config = GovernorConfigBuilder::default()
        .per_second(settings.per_second)
        .burst_size(settings.burst_size)
        .use_headers()
        .finish();
    if config.is_none() {
        tracing::warn!("Rate limiting disabled: invalid quota {:?}", settings);
    }
    config.map(Arc::new)
}
