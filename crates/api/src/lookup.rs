use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};
use wuwabot_core::config::ApiConfig;
use wuwabot_core::{normalize_slug, CharacterDetail, LookupError, SCRAPE_ERROR_CODE};

use crate::client::CharacterSource;

/// Bounded retry policy for detail lookups: fixed delay, no backoff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5, delay: Duration::from_secs(2) }
    }
}

impl From<&ApiConfig> for RetryPolicy {
    fn from(config: &ApiConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts,
            delay: Duration::from_secs(config.retry_delay_secs),
        }
    }
}

/// Tagged result of a single lookup attempt.
enum AttemptOutcome {
    Success(Box<CharacterDetail>),
    Permanent,
    Transient(String),
}

/// Detail-lookup orchestration: slug normalization, the retry loop, and
/// classification of API-reported errors. Detail records are never
/// cached; only the roster is.
pub struct LookupPipeline {
    source: Arc<dyn CharacterSource>,
    policy: RetryPolicy,
}

impl LookupPipeline {
    pub fn new(source: Arc<dyn CharacterSource>, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    pub async fn character_detail(&self, name: &str) -> Result<CharacterDetail, LookupError> {
        let slug = normalize_slug(name);
        let mut last_failure = String::new();

        for attempt in 1..=self.policy.max_attempts {
            match self.attempt(&slug).await {
                AttemptOutcome::Success(detail) => return Ok(*detail),
                AttemptOutcome::Permanent => {
                    info!(%slug, "api reports no data for this resonator");
                    return Err(LookupError::Permanent { slug });
                }
                AttemptOutcome::Transient(message) => {
                    info!(
                        %slug,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        failure = %message,
                        "lookup attempt failed"
                    );
                    last_failure = message;
                    if attempt < self.policy.max_attempts && !self.policy.delay.is_zero() {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                }
            }
        }

        warn!(
            %slug,
            attempts = self.policy.max_attempts,
            last_failure = %last_failure,
            "lookup retries exhausted"
        );
        Err(LookupError::RetryExhausted { slug, attempts: self.policy.max_attempts })
    }

    async fn attempt(&self, slug: &str) -> AttemptOutcome {
        let payload = match self.source.character_detail(slug).await {
            Ok(payload) => payload,
            Err(error) => return AttemptOutcome::Transient(error.to_string()),
        };

        if let Some(code) = payload.get("errorCode").and_then(Value::as_str) {
            if code == SCRAPE_ERROR_CODE {
                return AttemptOutcome::Permanent;
            }
            return AttemptOutcome::Transient(format!("unrecognized error code `{code}`"));
        }

        match serde_json::from_value::<CharacterDetail>(payload) {
            Ok(detail) => AttemptOutcome::Success(Box::new(detail)),
            Err(error) => AttemptOutcome::Transient(format!("malformed detail payload: {error}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;
    use crate::client::TransportError;

    struct ScriptedDetailSource {
        responses: Mutex<Vec<Result<Value, TransportError>>>,
        calls: AtomicU32,
    }

    impl ScriptedDetailSource {
        fn new(responses: Vec<Result<Value, TransportError>>) -> Self {
            Self { responses: Mutex::new(responses), calls: AtomicU32::new(0) }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CharacterSource for ScriptedDetailSource {
        async fn list_characters(&self) -> Result<Vec<String>, TransportError> {
            Ok(vec![])
        }

        async fn character_detail(&self, _slug: &str) -> Result<Value, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().expect("lock");
            if responses.is_empty() {
                return Err(TransportError::network("script exhausted"));
            }
            responses.remove(0)
        }

        async fn probe_image(&self, _url: &str) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy { max_attempts, delay: Duration::ZERO }
    }

    #[tokio::test]
    async fn scrape_error_short_circuits_after_one_attempt() {
        let source =
            Arc::new(ScriptedDetailSource::new(vec![Ok(json!({"errorCode": "SCRAPE_ERROR"}))]));
        let pipeline = LookupPipeline::new(source.clone(), instant_policy(5));

        let error = pipeline.character_detail("Jiyan").await.err().expect("permanent error");
        assert_eq!(error, LookupError::Permanent { slug: "jiyan".to_owned() });
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn five_transport_failures_exhaust_exactly_five_attempts() {
        let failures =
            (0..5).map(|_| Err(TransportError::network("connection reset"))).collect();
        let source = Arc::new(ScriptedDetailSource::new(failures));
        let pipeline = LookupPipeline::new(source.clone(), instant_policy(5));

        let error = pipeline.character_detail("jiyan").await.err().expect("exhaustion");
        assert_eq!(error, LookupError::RetryExhausted { slug: "jiyan".to_owned(), attempts: 5 });
        assert_eq!(source.calls(), 5);
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let source = Arc::new(ScriptedDetailSource::new(vec![
            Err(TransportError::status(503)),
            Ok(json!({"errorCode": "RATE_LIMITED"})),
            Ok(json!({"substatPriority": "Crit Rate > Crit DMG"})),
        ]));
        let pipeline = LookupPipeline::new(source.clone(), instant_policy(5));

        let detail = pipeline.character_detail("jiyan").await.expect("detail");
        assert_eq!(detail.substat_priority.as_deref(), Some("Crit Rate > Crit DMG"));
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn input_is_normalized_to_slug_casing() {
        let source = Arc::new(ScriptedDetailSource::new(vec![Ok(json!({"errorCode":
            "SCRAPE_ERROR"}))]));
        let pipeline = LookupPipeline::new(source, instant_policy(1));

        let error =
            pipeline.character_detail("The-Shorekeeper").await.err().expect("permanent error");
        assert_eq!(error, LookupError::Permanent { slug: "the-shorekeeper".to_owned() });
    }

    #[tokio::test]
    async fn malformed_payload_counts_as_transient() {
        let source = Arc::new(ScriptedDetailSource::new(vec![
            Ok(json!({"weaponBuilds": "not-an-array"})),
            Ok(json!({})),
        ]));
        let pipeline = LookupPipeline::new(source.clone(), instant_policy(5));

        let detail = pipeline.character_detail("jiyan").await.expect("detail");
        assert_eq!(detail, CharacterDetail::default());
        assert_eq!(source.calls(), 2);
    }
}
