use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use wuwabot_api::{
    ApiClient, CharacterCache, CharacterSource, LookupPipeline, RetryPolicy, TransportError,
};
use wuwabot_core::config::{AppConfig, ConfigError, LoadOptions};
use wuwabot_discord::gateway::NoopGatewayTransport;
use wuwabot_discord::{service_dispatcher, ApiResonatorService, GatewayRunner, ReconnectPolicy};

pub struct Application {
    pub config: AppConfig,
    pub cache: Arc<CharacterCache>,
    pub gateway_runner: GatewayRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("api client initialization failed: {0}")]
    ApiClient(#[source] TransportError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!("starting application bootstrap");

    let client = ApiClient::new(&config.api).map_err(BootstrapError::ApiClient)?;
    let source: Arc<dyn CharacterSource> = Arc::new(client);
    info!(base_url = %config.api.base_url, "character api client ready");

    let cache = Arc::new(CharacterCache::new(source.clone()));
    let pipeline = LookupPipeline::new(source.clone(), RetryPolicy::from(&config.api));
    let service = Arc::new(ApiResonatorService::new(
        cache.clone(),
        pipeline,
        source,
        &config.api,
        config.latency.clone(),
    ));

    let gateway_runner = GatewayRunner::new(
        Arc::new(NoopGatewayTransport),
        service_dispatcher(service),
        ReconnectPolicy::default(),
    );
    info!(handlers = gateway_runner.handler_count(), "interaction handlers registered");

    Ok(Application { config, cache, gateway_runner })
}

#[cfg(test)]
mod tests {
    use wuwabot_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    #[tokio::test]
    async fn bootstrap_fails_fast_without_a_bot_token() {
        let result = bootstrap(LoadOptions::default()).await;

        let message = result.err().expect("config error").to_string();
        assert!(message.contains("discord.bot_token"));
    }

    #[tokio::test]
    async fn bootstrap_wires_command_and_autocomplete_handlers() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                discord_bot_token: Some("test-token".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await
        .expect("bootstrap succeeds with a token override");

        assert_eq!(app.gateway_runner.handler_count(), 2);
    }
}
