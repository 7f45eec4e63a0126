use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use loja_core::domain::session::{Session, UserId};
use loja_core::errors::ApplicationError;
use loja_core::flows::{FlowEngine, Turn};
use loja_db::repositories::{RepositoryError, SessionRepository};

use crate::keyboard::OutgoingMessage;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatEnvelope {
    pub update_id: i64,
    pub event: ChatEvent,
}

impl ChatEnvelope {
    pub fn correlation_id(&self) -> String {
        format!("update-{}", self.update_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatEvent {
    TextMessage(TextMessageEvent),
    Unsupported { event_type: String },
}

impl ChatEvent {
    pub fn event_type(&self) -> ChatEventType {
        match self {
            Self::TextMessage(_) => ChatEventType::TextMessage,
            Self::Unsupported { .. } => ChatEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChatEventType {
    TextMessage,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextMessageEvent {
    pub chat_id: i64,
    pub user_id: String,
    pub first_name: Option<String>,
    pub text: String,
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
    Responded(Vec<OutgoingMessage>),
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error("text message handler failure: {0}")]
    TextMessage(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> ChatEventType;
    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<ChatEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }
}

/// Dispatcher that routes every text message through `service`.
pub fn conversation_dispatcher<S>(service: S) -> EventDispatcher
where
    S: TextMessageService + 'static,
{
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(TextMessageHandler::new(service));
    dispatcher
}

#[async_trait]
pub trait TextMessageService: Send + Sync {
    async fn handle_text_message(
        &self,
        event: &TextMessageEvent,
        ctx: &EventContext,
    ) -> Result<Vec<OutgoingMessage>, EventHandlerError>;
}

pub struct TextMessageHandler<S> {
    service: S,
}

impl<S> TextMessageHandler<S>
where
    S: TextMessageService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for TextMessageHandler<S>
where
    S: TextMessageService + 'static,
{
    fn event_type(&self) -> ChatEventType {
        ChatEventType::TextMessage
    }

    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let ChatEvent::TextMessage(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let messages = self.service.handle_text_message(event, ctx).await?;
        Ok(if messages.is_empty() {
            HandlerResult::Processed
        } else {
            HandlerResult::Responded(messages)
        })
    }
}

/// Runs one message-handling cycle per incoming text: load the session, drive the
/// flow engine, save the session.
pub struct ConversationService<R: ?Sized> {
    engine: FlowEngine,
    sessions: Arc<R>,
}

impl<R> ConversationService<R>
where
    R: SessionRepository + ?Sized,
{
    pub fn new(engine: FlowEngine, sessions: Arc<R>) -> Self {
        Self { engine, sessions }
    }

    pub fn engine(&self) -> &FlowEngine {
        &self.engine
    }

    /// The session is only written back when the whole turn succeeded, so a failed
    /// save leaves the user where they were. A turn that ends in the initial session
    /// (start, cancel, completed order) removes the stored snapshot instead.
    pub async fn converse(
        &self,
        user_id: &UserId,
        text: &str,
        first_name: Option<&str>,
        ctx: &EventContext,
    ) -> Result<Turn, ApplicationError> {
        let mut session =
            self.sessions.load(user_id).await.map_err(persistence_error)?.unwrap_or_default();

        let turn = self.engine.handle(&mut session, text, first_name);
        info!(
            event_name = "conversation.transition",
            correlation_id = %ctx.correlation_id,
            user_id = %user_id,
            from = %turn.transition.from,
            state = %turn.transition.to,
            event = ?turn.transition.event.kind,
            replies = turn.replies.len(),
            "conversation turn handled"
        );

        if session == Session::default() {
            self.sessions.delete(user_id).await.map_err(persistence_error)?;
        } else {
            self.sessions.save(user_id, &session).await.map_err(persistence_error)?;
        }

        if let Some(order) = &turn.order {
            info!(
                event_name = "conversation.order_completed",
                correlation_id = %ctx.correlation_id,
                user_id = %user_id,
                lines = order.lines.len(),
                total = %order.total,
                "order completed; awaiting human follow-up for payment"
            );
            debug!(
                event_name = "conversation.order_completed",
                correlation_id = %ctx.correlation_id,
                user_id = %user_id,
                customer_name = %order.customer_name,
                address = %order.address,
                "order delivery details"
            );
        }

        Ok(turn)
    }
}

fn persistence_error(error: RepositoryError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

#[async_trait]
impl<R> TextMessageService for ConversationService<R>
where
    R: SessionRepository + ?Sized + 'static,
{
    async fn handle_text_message(
        &self,
        event: &TextMessageEvent,
        ctx: &EventContext,
    ) -> Result<Vec<OutgoingMessage>, EventHandlerError> {
        let user_id = UserId(event.user_id.clone());
        match self.converse(&user_id, &event.text, event.first_name.as_deref(), ctx).await {
            Ok(turn) => Ok(turn
                .replies
                .iter()
                .map(|reply| OutgoingMessage::from_reply(event.chat_id, reply))
                .collect()),
            Err(error) => {
                let interface = error.into_interface(ctx.correlation_id.clone());
                warn!(
                    event_name = "conversation.persistence_failed",
                    correlation_id = %interface.correlation_id(),
                    user_id = %user_id,
                    error = %interface,
                    "conversation turn aborted"
                );
                Ok(vec![OutgoingMessage::text(event.chat_id, interface.user_message())])
            }
        }
    }
}
