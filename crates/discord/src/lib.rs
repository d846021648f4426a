//! Discord interface for the Wuthering Waves build bot.
//!
//! This crate provides the chat-platform surface:
//! - **Gateway** (`gateway`) - transport seam + event loop with
//!   reconnection logic (the production adapter wraps a Discord SDK)
//! - **Interactions** (`interactions`) - envelope model and dispatcher
//! - **Commands** (`commands`) - `/resonator`, `/ping`, classification,
//!   routing, autocomplete filtering
//! - **Embeds** (`embeds`) - rich reply builders in the platform wire
//!   shape
//! - **Service** (`service`) - handlers wired to the character API
//!
//! # Key Types
//!
//! - `GatewayRunner` - interaction event loop
//! - `InteractionDispatcher` - routes envelopes to handlers
//! - `ResonatorService` - trait the command handlers are written against
//! - `ApiResonatorService` - the API-backed implementation

pub mod commands;
pub mod embeds;
pub mod gateway;
pub mod interactions;
pub mod service;

pub use commands::{
    autocomplete_suggestions, classify_command, BotCommand, CommandInvocation, CommandOption,
    CommandRouter, LatencyTier, ResonatorService, Suggestion, AUTOCOMPLETE_LIMIT,
};
pub use embeds::{EmbedTemplate, InteractionReply};
pub use gateway::{GatewayRunner, GatewayTransport, NoopGatewayTransport, ReconnectPolicy};
pub use interactions::{
    service_dispatcher, Interaction, InteractionDispatcher, InteractionEnvelope,
};
pub use service::ApiResonatorService;
