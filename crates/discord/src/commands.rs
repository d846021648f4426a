use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use wuwabot_core::config::LatencyConfig;
use wuwabot_core::CharacterSummary;

use crate::embeds::{self, InteractionReply};

/// Platform cap on autocomplete choices per response.
pub const AUTOCOMPLETE_LIMIT: usize = 25;

/// A slash-command invocation as the gateway hands it over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandInvocation {
    pub command: String,
    pub options: Vec<CommandOption>,
    pub channel_id: String,
    pub user_id: String,
    pub interaction_token: String,
    pub request_id: String,
    /// Gateway heartbeat round-trip, stamped by the transport.
    pub gateway_latency_ms: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOption {
    pub name: String,
    pub value: String,
}

impl CommandInvocation {
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.name == name)
            .map(|option| option.value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Classified command. `/resonator` without a name is the roster
/// listing; with a name it is a build lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotCommand {
    Roster,
    Build { name: String },
    Ping,
    Unknown { command: String },
}

pub fn classify_command(invocation: &CommandInvocation) -> BotCommand {
    match invocation.command.as_str() {
        "resonator" => match invocation.option("name") {
            Some(name) => BotCommand::Build { name: name.to_owned() },
            None => BotCommand::Roster,
        },
        "ping" => BotCommand::Ping,
        other => BotCommand::Unknown { command: other.to_owned() },
    }
}

/// Autocomplete choice in the platform wire shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub name: String,
    pub value: String,
}

/// Filters the roster by a case-insensitive substring match over slug or
/// display name. An empty query matches everything. Capped at the
/// platform limit of 25.
pub fn autocomplete_suggestions(roster: &[CharacterSummary], query: &str) -> Vec<Suggestion> {
    let query = query.trim().to_lowercase();

    roster
        .iter()
        .filter(|entry| {
            query.is_empty()
                || entry.slug().to_lowercase().contains(&query)
                || entry.display_name().to_lowercase().contains(&query)
        })
        .take(AUTOCOMPLETE_LIMIT)
        .map(|entry| Suggestion { name: entry.display_name(), value: entry.slug().to_owned() })
        .collect()
}

/// Health tier for the liveness command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LatencyTier {
    Good,
    Average,
    Poor,
}

impl LatencyTier {
    pub fn classify(latency_ms: u64, thresholds: &LatencyConfig) -> Self {
        if latency_ms < thresholds.good_under_ms {
            Self::Good
        } else if latency_ms < thresholds.average_under_ms {
            Self::Average
        } else {
            Self::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "GOOD",
            Self::Average => "AVERAGE",
            Self::Poor => "POOR",
        }
    }

    pub fn color(&self) -> u32 {
        match self {
            Self::Good => 0x2ECC71,
            Self::Average => 0xF1C40F,
            Self::Poor => 0xE74C3C,
        }
    }

    pub fn thumbnail_url(&self) -> &'static str {
        match self {
            Self::Good => {
                "https://wutheringlab.com/wp-content/uploads/2023/06/Wuthering-Waves-Chixia.png"
            }
            Self::Average => {
                "https://wutheringlab.com/wp-content/uploads/2023/06/Wuthering-Waves-Yangyang.png"
            }
            Self::Poor => {
                "https://wutheringlab.com/wp-content/uploads/2023/06/Wuthering-Waves-Aalto.png"
            }
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandRouteError {
    #[error("command service failed: {0}")]
    Service(String),
}

/// The command handlers behind the router. Implemented for real against
/// the character API; the Noop implementation keeps wiring testable.
#[async_trait]
pub trait ResonatorService: Send + Sync {
    async fn roster(&self) -> Result<InteractionReply, CommandRouteError>;
    async fn build(&self, name: &str) -> Result<InteractionReply, CommandRouteError>;
    async fn ping(&self, gateway_latency_ms: Option<u64>)
        -> Result<InteractionReply, CommandRouteError>;
    async fn suggestions(&self, query: &str) -> Vec<Suggestion>;
}

#[async_trait]
impl<S> ResonatorService for Arc<S>
where
    S: ResonatorService + ?Sized,
{
    async fn roster(&self) -> Result<InteractionReply, CommandRouteError> {
        self.as_ref().roster().await
    }

    async fn build(&self, name: &str) -> Result<InteractionReply, CommandRouteError> {
        self.as_ref().build(name).await
    }

    async fn ping(
        &self,
        gateway_latency_ms: Option<u64>,
    ) -> Result<InteractionReply, CommandRouteError> {
        self.as_ref().ping(gateway_latency_ms).await
    }

    async fn suggestions(&self, query: &str) -> Vec<Suggestion> {
        self.as_ref().suggestions(query).await
    }
}

/// Placeholder service for wiring that has no API behind it.
#[derive(Default)]
pub struct NoopResonatorService;

#[async_trait]
impl ResonatorService for NoopResonatorService {
    async fn roster(&self) -> Result<InteractionReply, CommandRouteError> {
        Ok(embeds::roster_unavailable_reply())
    }

    async fn build(&self, _name: &str) -> Result<InteractionReply, CommandRouteError> {
        Ok(embeds::roster_unavailable_reply())
    }

    async fn ping(
        &self,
        gateway_latency_ms: Option<u64>,
    ) -> Result<InteractionReply, CommandRouteError> {
        Ok(InteractionReply::embed(embeds::ping_embed(gateway_latency_ms, LatencyTier::Poor)))
    }

    async fn suggestions(&self, _query: &str) -> Vec<Suggestion> {
        Vec::new()
    }
}

pub struct CommandRouter<S> {
    service: S,
}

impl<S> CommandRouter<S>
where
    S: ResonatorService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub async fn route(
        &self,
        invocation: &CommandInvocation,
    ) -> Result<InteractionReply, CommandRouteError> {
        match classify_command(invocation) {
            BotCommand::Roster => self.service.roster().await,
            BotCommand::Build { name } => self.service.build(&name).await,
            BotCommand::Ping => self.service.ping(invocation.gateway_latency_ms).await,
            BotCommand::Unknown { command } => Ok(InteractionReply::ephemeral_text(format!(
                "Unsupported command `/{command}`."
            ))),
        }
    }
}
