//! End-to-end command flow against a scripted character source: gateway
//! runner -> dispatcher -> API-backed service -> delivered replies.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use wuwabot_api::{
    CharacterCache, CharacterSource, LookupPipeline, RetryPolicy, TransportError,
};
use wuwabot_core::config::AppConfig;
use wuwabot_discord::gateway::ConnectionError;
use wuwabot_discord::interactions::{AutocompleteQuery, Interaction, InteractionEnvelope};
use wuwabot_discord::{
    service_dispatcher, ApiResonatorService, CommandInvocation, CommandOption, GatewayRunner,
    GatewayTransport, InteractionReply, ReconnectPolicy, Suggestion,
};

struct StubSource {
    roster: Vec<String>,
    detail: Value,
    probe_ok: bool,
}

#[async_trait]
impl CharacterSource for StubSource {
    async fn list_characters(&self) -> Result<Vec<String>, TransportError> {
        Ok(self.roster.clone())
    }

    async fn character_detail(&self, _slug: &str) -> Result<Value, TransportError> {
        Ok(self.detail.clone())
    }

    async fn probe_image(&self, _url: &str) -> Result<(), TransportError> {
        if self.probe_ok {
            Ok(())
        } else {
            Err(TransportError::status(404))
        }
    }
}

#[derive(Default)]
struct RecordingTransport {
    envelopes: Mutex<Vec<InteractionEnvelope>>,
    replies: Mutex<Vec<InteractionReply>>,
    suggestions: Mutex<Vec<Vec<Suggestion>>>,
}

impl RecordingTransport {
    fn with_envelopes(envelopes: Vec<InteractionEnvelope>) -> Self {
        Self { envelopes: Mutex::new(envelopes), ..Self::default() }
    }
}

#[async_trait]
impl GatewayTransport for RecordingTransport {
    async fn connect(&self) -> Result<(), ConnectionError> {
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<InteractionEnvelope>, ConnectionError> {
        let mut envelopes = self.envelopes.lock().expect("lock");
        if envelopes.is_empty() {
            return Ok(None);
        }
        Ok(Some(envelopes.remove(0)))
    }

    async fn defer(&self, _envelope_id: &str) -> Result<(), ConnectionError> {
        Ok(())
    }

    async fn deliver_reply(
        &self,
        _envelope_id: &str,
        reply: &InteractionReply,
    ) -> Result<(), ConnectionError> {
        self.replies.lock().expect("lock").push(reply.clone());
        Ok(())
    }

    async fn deliver_suggestions(
        &self,
        _envelope_id: &str,
        suggestions: &[Suggestion],
    ) -> Result<(), ConnectionError> {
        self.suggestions.lock().expect("lock").push(suggestions.to_vec());
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ConnectionError> {
        Ok(())
    }
}

fn service_over(source: StubSource) -> ApiResonatorService {
    let config = AppConfig::default();
    let source: Arc<dyn CharacterSource> = Arc::new(source);
    let cache = Arc::new(CharacterCache::new(source.clone()));
    let pipeline = LookupPipeline::new(
        source.clone(),
        RetryPolicy { max_attempts: 2, delay: Duration::ZERO },
    );

    ApiResonatorService::new(cache, pipeline, source, &config.api, config.latency)
}

fn command_envelope(id: &str, command: &str, options: Vec<(&str, &str)>) -> InteractionEnvelope {
    InteractionEnvelope {
        envelope_id: id.to_owned(),
        interaction: Interaction::Command(CommandInvocation {
            command: command.to_owned(),
            options: options
                .into_iter()
                .map(|(name, value)| CommandOption {
                    name: name.to_owned(),
                    value: value.to_owned(),
                })
                .collect(),
            channel_id: "channel-1".to_owned(),
            user_id: "user-1".to_owned(),
            interaction_token: format!("token-{id}"),
            request_id: id.to_owned(),
            gateway_latency_ms: Some(250),
        }),
    }
}

async fn run(source: StubSource, envelopes: Vec<InteractionEnvelope>) -> Arc<RecordingTransport> {
    let transport = Arc::new(RecordingTransport::with_envelopes(envelopes));
    let dispatcher = service_dispatcher(Arc::new(service_over(source)));
    let policy = ReconnectPolicy { max_retries: 0, base_delay_ms: 0, max_delay_ms: 0 };

    GatewayRunner::new(transport.clone(), dispatcher, policy)
        .start()
        .await
        .expect("runner completes");
    transport
}

#[tokio::test]
async fn roster_command_lists_display_names() {
    let source = StubSource {
        roster: vec!["the-shorekeeper".to_owned(), "jiyan".to_owned()],
        detail: json!({}),
        probe_ok: true,
    };

    let transport = run(source, vec![command_envelope("env-1", "resonator", vec![])]).await;

    let replies = transport.replies.lock().expect("lock");
    let embed = &replies[0].embeds[0];
    assert_eq!(embed.title, "Available Resonators");
    assert_eq!(embed.fields[0].value, "The Shorekeeper, Jiyan");
    assert!(!replies[0].ephemeral);
}

#[tokio::test]
async fn build_command_renders_detail_with_validated_portrait() {
    let source = StubSource {
        roster: vec!["jiyan".to_owned()],
        detail: json!({
            "portraitUrl": "/static/jiyan.png",
            "skillPriority": ["Resonance Liberation", "Basic Attack"],
            "weaponBuilds": [
                {"name": "Verdant Summit", "duplicates": 1, "percentage": "54.2%"}
            ]
        }),
        probe_ok: true,
    };

    let transport =
        run(source, vec![command_envelope("env-1", "resonator", vec![("name", "Jiyan")])]).await;

    let replies = transport.replies.lock().expect("lock");
    let embed = &replies[0].embeds[0];
    assert_eq!(embed.title, "Jiyan - Resonator Build Information");
    assert_eq!(
        embed.thumbnail.as_ref().map(|media| media.url.as_str()),
        Some("https://www.prydwen.gg/static/jiyan.png")
    );
    assert!(embed.fields.iter().any(|field| field.value.contains("Verdant Summit")));
}

#[tokio::test]
async fn unreachable_portrait_falls_back_to_default_thumbnail() {
    let source = StubSource {
        roster: vec!["jiyan".to_owned()],
        detail: json!({"portraitUrl": "/static/jiyan.png"}),
        probe_ok: false,
    };

    let transport =
        run(source, vec![command_envelope("env-1", "resonator", vec![("name", "jiyan")])]).await;

    let replies = transport.replies.lock().expect("lock");
    let thumbnail = replies[0].embeds[0].thumbnail.as_ref().expect("thumbnail");
    assert_eq!(thumbnail.url, AppConfig::default().api.fallback_thumbnail_url);
}

#[tokio::test]
async fn permanent_api_error_becomes_an_ephemeral_notice() {
    let source = StubSource {
        roster: vec!["jiyan".to_owned()],
        detail: json!({"errorCode": "SCRAPE_ERROR"}),
        probe_ok: true,
    };

    let transport =
        run(source, vec![command_envelope("env-1", "resonator", vec![("name", "jiyan")])]).await;

    let replies = transport.replies.lock().expect("lock");
    assert!(replies[0].ephemeral);
    assert!(replies[0].content.as_deref().expect("content").contains("could not find"));
}

#[tokio::test]
async fn autocomplete_suggests_matching_resonators() {
    let source = StubSource {
        roster: vec!["the-shorekeeper".to_owned(), "jiyan".to_owned()],
        detail: json!({}),
        probe_ok: true,
    };

    let envelope = InteractionEnvelope {
        envelope_id: "env-1".to_owned(),
        interaction: Interaction::Autocomplete(AutocompleteQuery {
            command: "resonator".to_owned(),
            option: "name".to_owned(),
            input: "sho".to_owned(),
            user_id: "user-1".to_owned(),
        }),
    };

    let transport = run(source, vec![envelope]).await;

    let suggestions = transport.suggestions.lock().expect("lock");
    assert_eq!(
        suggestions[0],
        vec![Suggestion { name: "The Shorekeeper".to_owned(), value: "the-shorekeeper".to_owned() }]
    );
}

#[tokio::test]
async fn ping_command_reports_latency_tier() {
    let source = StubSource { roster: vec![], detail: json!({}), probe_ok: true };

    let transport = run(source, vec![command_envelope("env-1", "ping", vec![])]).await;

    let replies = transport.replies.lock().expect("lock");
    let embed = &replies[0].embeds[0];
    assert_eq!(embed.fields[0].value, "`250ms`");
    assert_eq!(embed.fields[1].value, "GOOD");
}
