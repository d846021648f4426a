use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    commands::{
        CommandInvocation, CommandRouteError, CommandRouter, NoopResonatorService,
        ResonatorService, Suggestion,
    },
    embeds::InteractionReply,
};

/// One inbound interaction as delivered by the gateway transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionEnvelope {
    pub envelope_id: String,
    pub interaction: Interaction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interaction {
    Command(CommandInvocation),
    Autocomplete(AutocompleteQuery),
    Unsupported { kind: String },
}

impl Interaction {
    pub fn kind(&self) -> InteractionKind {
        match self {
            Self::Command(_) => InteractionKind::Command,
            Self::Autocomplete(_) => InteractionKind::Autocomplete,
            Self::Unsupported { .. } => InteractionKind::Unsupported,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    Command,
    Autocomplete,
    Unsupported,
}

/// Live autocomplete keystroke for a command option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutocompleteQuery {
    pub command: String,
    pub option: String,
    pub input: String,
    pub user_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(InteractionReply),
    Suggested(Vec<Suggestion>),
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error(transparent)]
    Route(#[from] CommandRouteError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

#[async_trait]
pub trait InteractionHandler: Send + Sync {
    fn kind(&self) -> InteractionKind;
    async fn handle(
        &self,
        envelope: &InteractionEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, HandlerError>;
}

#[derive(Default)]
pub struct InteractionDispatcher {
    handlers: HashMap<InteractionKind, Arc<dyn InteractionHandler>>,
}

impl InteractionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: InteractionHandler + 'static,
    {
        self.handlers.insert(handler.kind(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &InteractionEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.interaction.kind()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Dispatcher wired against a shared service; both slash commands and
/// autocomplete go through the same `ResonatorService`.
pub fn service_dispatcher<S>(service: S) -> InteractionDispatcher
where
    S: ResonatorService + Clone + 'static,
{
    let mut dispatcher = InteractionDispatcher::new();
    dispatcher.register(CommandHandler::new(service.clone()));
    dispatcher.register(AutocompleteHandler::new(service));
    dispatcher
}

pub fn default_dispatcher() -> InteractionDispatcher {
    service_dispatcher(Arc::new(NoopResonatorService))
}

pub struct CommandHandler<S> {
    router: CommandRouter<S>,
}

impl<S> CommandHandler<S>
where
    S: ResonatorService,
{
    pub fn new(service: S) -> Self {
        Self { router: CommandRouter::new(service) }
    }
}

#[async_trait]
impl<S> InteractionHandler for CommandHandler<S>
where
    S: ResonatorService,
{
    fn kind(&self) -> InteractionKind {
        InteractionKind::Command
    }

    async fn handle(
        &self,
        envelope: &InteractionEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, HandlerError> {
        let Interaction::Command(invocation) = &envelope.interaction else {
            return Ok(HandlerResult::Ignored);
        };

        let reply = self.router.route(invocation).await?;
        Ok(HandlerResult::Responded(reply))
    }
}

pub struct AutocompleteHandler<S> {
    service: S,
}

impl<S> AutocompleteHandler<S>
where
    S: ResonatorService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> InteractionHandler for AutocompleteHandler<S>
where
    S: ResonatorService,
{
    fn kind(&self) -> InteractionKind {
        InteractionKind::Autocomplete
    }

    async fn handle(
        &self,
        envelope: &InteractionEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, HandlerError> {
        let Interaction::Autocomplete(query) = &envelope.interaction else {
            return Ok(HandlerResult::Ignored);
        };

        let suggestions = self.service.suggestions(&query.input).await;
        Ok(HandlerResult::Suggested(suggestions))
    }
}
