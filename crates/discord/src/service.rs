use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use wuwabot_api::{CharacterCache, CharacterSource, LookupPipeline};
use wuwabot_core::config::{ApiConfig, LatencyConfig};
use wuwabot_core::{display_name, normalize_slug};

use crate::commands::{
    autocomplete_suggestions, CommandRouteError, LatencyTier, ResonatorService, Suggestion,
};
use crate::embeds::{self, InteractionReply};

/// Command handlers backed by the character API: roster from the cache,
/// build details through the retry pipeline, liveness from gateway
/// latency.
pub struct ApiResonatorService {
    cache: Arc<CharacterCache>,
    pipeline: LookupPipeline,
    source: Arc<dyn CharacterSource>,
    portrait_base_url: String,
    fallback_thumbnail_url: String,
    latency: LatencyConfig,
}

impl ApiResonatorService {
    pub fn new(
        cache: Arc<CharacterCache>,
        pipeline: LookupPipeline,
        source: Arc<dyn CharacterSource>,
        api: &ApiConfig,
        latency: LatencyConfig,
    ) -> Self {
        Self {
            cache,
            pipeline,
            source,
            portrait_base_url: api.portrait_base_url.trim_end_matches('/').to_string(),
            fallback_thumbnail_url: api.fallback_thumbnail_url.clone(),
            latency,
        }
    }

    /// Portrait paths from the API are site-relative. The full URL is
    /// probed before use; any failure degrades to the fixed fallback and
    /// never affects the command.
    async fn resolve_thumbnail(&self, portrait_path: Option<&str>) -> String {
        if let Some(path) = portrait_path.filter(|path| !path.is_empty()) {
            let url = format!("{}{path}", self.portrait_base_url);
            match self.source.probe_image(&url).await {
                Ok(()) => return url,
                Err(probe_error) => {
                    warn!(%url, error = %probe_error, "portrait probe failed; using fallback");
                }
            }
        }

        self.fallback_thumbnail_url.clone()
    }
}

#[async_trait]
impl ResonatorService for ApiResonatorService {
    async fn roster(&self) -> Result<InteractionReply, CommandRouteError> {
        let roster = self.cache.get_all().await;
        if roster.is_empty() {
            return Ok(embeds::roster_unavailable_reply());
        }

        Ok(InteractionReply::embed(embeds::roster_embed(&roster)))
    }

    async fn build(&self, name: &str) -> Result<InteractionReply, CommandRouteError> {
        info!(resonator = %name, "build lookup requested");

        let detail = match self.pipeline.character_detail(name).await {
            Ok(detail) => detail,
            Err(lookup_error) => {
                return Ok(InteractionReply::ephemeral_text(lookup_error.user_message()));
            }
        };

        let display = display_name(&normalize_slug(name));
        let thumbnail = self.resolve_thumbnail(detail.portrait_url.as_deref()).await;
        Ok(InteractionReply::embed(embeds::build_embed(&detail, &display, &thumbnail)))
    }

    async fn ping(
        &self,
        gateway_latency_ms: Option<u64>,
    ) -> Result<InteractionReply, CommandRouteError> {
        let tier = gateway_latency_ms
            .map(|latency_ms| LatencyTier::classify(latency_ms, &self.latency))
            .unwrap_or(LatencyTier::Poor);

        Ok(InteractionReply::embed(embeds::ping_embed(gateway_latency_ms, tier)))
    }

    async fn suggestions(&self, query: &str) -> Vec<Suggestion> {
        let roster = self.cache.get_all().await;
        if roster.is_empty() {
            warn!("no characters available for autocomplete");
            return Vec::new();
        }

        autocomplete_suggestions(&roster, query)
    }
}
