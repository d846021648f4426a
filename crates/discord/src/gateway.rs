use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    commands::{classify_command, BotCommand},
    interactions::{
        default_dispatcher, DispatchError, EventContext, HandlerResult, Interaction,
        InteractionDispatcher, InteractionEnvelope,
    },
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("gateway failed to connect: {0}")]
    Connect(String),
    #[error("gateway read failed: {0}")]
    Receive(String),
    #[error("gateway reply delivery failed: {0}")]
    Deliver(String),
    #[error("gateway disconnect failed: {0}")]
    Disconnect(String),
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Connection to the chat platform. The production adapter wraps a
/// Discord gateway SDK; tests script this directly.
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    async fn connect(&self) -> Result<(), ConnectionError>;
    async fn next_envelope(&self) -> Result<Option<InteractionEnvelope>, ConnectionError>;
    /// Acknowledge an interaction before a slow reply, keeping the
    /// response token alive while the lookup retries.
    async fn defer(&self, envelope_id: &str) -> Result<(), ConnectionError>;
    async fn deliver_reply(
        &self,
        envelope_id: &str,
        reply: &crate::embeds::InteractionReply,
    ) -> Result<(), ConnectionError>;
    async fn deliver_suggestions(
        &self,
        envelope_id: &str,
        suggestions: &[crate::commands::Suggestion],
    ) -> Result<(), ConnectionError>;
    async fn disconnect(&self) -> Result<(), ConnectionError>;
}

#[derive(Default)]
pub struct NoopGatewayTransport;

#[async_trait]
impl GatewayTransport for NoopGatewayTransport {
    async fn connect(&self) -> Result<(), ConnectionError> {
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<InteractionEnvelope>, ConnectionError> {
        Ok(None)
    }

    async fn defer(&self, _envelope_id: &str) -> Result<(), ConnectionError> {
        Ok(())
    }

    async fn deliver_reply(
        &self,
        _envelope_id: &str,
        _reply: &crate::embeds::InteractionReply,
    ) -> Result<(), ConnectionError> {
        Ok(())
    }

    async fn deliver_suggestions(
        &self,
        _envelope_id: &str,
        _suggestions: &[crate::commands::Suggestion],
    ) -> Result<(), ConnectionError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ConnectionError> {
        Ok(())
    }
}

/// Event loop: pulls interaction envelopes off the transport, dispatches
/// them, and delivers whatever the handlers produced. Reconnects with
/// bounded exponential backoff; a failed reply delivery is logged and
/// dropped, never retried.
pub struct GatewayRunner {
    transport: Arc<dyn GatewayTransport>,
    dispatcher: InteractionDispatcher,
    reconnect_policy: ReconnectPolicy,
}

impl Default for GatewayRunner {
    fn default() -> Self {
        Self {
            transport: Arc::new(NoopGatewayTransport),
            dispatcher: default_dispatcher(),
            reconnect_policy: ReconnectPolicy::default(),
        }
    }
}

impl GatewayRunner {
    pub fn new(
        transport: Arc<dyn GatewayTransport>,
        dispatcher: InteractionDispatcher,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher, reconnect_policy }
    }

    pub fn handler_count(&self) -> usize {
        self.dispatcher.handler_count()
    }

    pub async fn start(&self) -> Result<()> {
        for attempt in 0..=self.reconnect_policy.max_retries {
            match self.connect_and_pump(attempt).await {
                Ok(()) => return Ok(()),
                Err(connection_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %connection_error,
                        "gateway transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "gateway retries exhausted; continuing process without crash"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Ok(())
    }

    async fn connect_and_pump(&self, attempt: u32) -> Result<(), ConnectionError> {
        info!(attempt, "opening gateway transport connection");
        self.transport.connect().await?;
        info!(attempt, "gateway transport connected");

        loop {
            let Some(envelope) = self.transport.next_envelope().await? else {
                info!(attempt, "gateway transport stream closed");
                self.transport.disconnect().await?;
                return Ok(());
            };

            self.handle_envelope(&envelope).await;
        }
    }

    async fn handle_envelope(&self, envelope: &InteractionEnvelope) {
        let ctx = EventContext { correlation_id: envelope.envelope_id.clone() };

        // A build lookup can spend several retry delays before it has a
        // reply; acknowledge first so the response token stays valid.
        if let Interaction::Command(invocation) = &envelope.interaction {
            if matches!(classify_command(invocation), BotCommand::Build { .. }) {
                if let Err(delivery_error) = self.transport.defer(&envelope.envelope_id).await {
                    warn!(
                        envelope_id = %envelope.envelope_id,
                        error = %delivery_error,
                        "failed to defer interaction"
                    );
                }
            }
        }

        let result = match self.dispatcher.dispatch(envelope, &ctx).await {
            Ok(result) => result,
            Err(dispatch_error) => {
                error!(
                    envelope_id = %envelope.envelope_id,
                    error = %dispatch_error,
                    "interaction dispatch failed"
                );
                return;
            }
        };

        let delivery = match &result {
            HandlerResult::Responded(reply) => {
                self.transport.deliver_reply(&envelope.envelope_id, reply).await
            }
            HandlerResult::Suggested(suggestions) => {
                self.transport.deliver_suggestions(&envelope.envelope_id, suggestions).await
            }
            HandlerResult::Ignored => {
                debug!(envelope_id = %envelope.envelope_id, "interaction ignored");
                Ok(())
            }
        };

        if let Err(delivery_error) = delivery {
            // Response token may have expired; surface and move on.
            warn!(
                envelope_id = %envelope.envelope_id,
                error = %delivery_error,
                "reply delivery failed"
            );
        }
    }
}
