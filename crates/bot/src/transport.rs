use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::events::{ChatEnvelope, ChatEvent, EventContext, EventDispatcher, HandlerResult};
use crate::keyboard::OutgoingMessage;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport send failed: {0}")]
    Send(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
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

/// The messaging platform as seen by the bot: a stream of incoming updates and a way
/// to send text back.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    /// `Ok(None)` means the stream is closed for good.
    async fn next_envelope(&self) -> Result<Option<ChatEnvelope>, TransportError>;
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

pub struct PollingRunner {
    transport: Arc<dyn ChatTransport>,
    dispatcher: EventDispatcher,
    reconnect_policy: ReconnectPolicy,
}

impl PollingRunner {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        dispatcher: EventDispatcher,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher, reconnect_policy }
    }

    /// Pumps updates until the transport closes. Failures are retried with backoff.
    /// The retry budget counts consecutive failed connects, so a bot whose polls keep
    /// failing against a reachable API never stops; the backoff still grows until
    /// updates flow again. Exhausting the budget is an error.
    pub async fn start(&self) -> Result<()> {
        let mut connect_failures = 0;
        let mut attempt = 0;
        loop {
            let mut progress = PumpProgress::default();
            let Err(transport_error) = self.connect_and_pump(attempt, &mut progress).await else {
                return Ok(());
            };
            if progress.connected {
                connect_failures = 0;
            } else {
                connect_failures += 1;
            }
            if progress.delivered > 0 {
                attempt = 0;
            }

            warn!(
                attempt,
                connect_failures,
                max_retries = self.reconnect_policy.max_retries,
                error = %transport_error,
                "chat transport failed"
            );

            if connect_failures > self.reconnect_policy.max_retries {
                return Err(anyhow!(
                    "chat transport could not connect after {connect_failures} attempts: \
                     {transport_error}"
                ));
            }

            let delay = self.reconnect_policy.backoff(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt = attempt.saturating_add(1);
        }
    }

    async fn connect_and_pump(
        &self,
        attempt: u32,
        progress: &mut PumpProgress,
    ) -> Result<(), TransportError> {
        info!(attempt, "opening chat transport connection");
        self.transport.connect().await?;
        progress.connected = true;
        info!(attempt, "chat transport connected");

        loop {
            let Some(envelope) = self.transport.next_envelope().await? else {
                info!(attempt, "chat transport stream closed");
                self.transport.disconnect().await?;
                return Ok(());
            };
            progress.delivered += 1;
            let context = EventContext { correlation_id: envelope.correlation_id() };

            info!(
                event_name = "ingress.chat.update_received",
                update_id = envelope.update_id,
                event_type = ?envelope.event.event_type(),
                correlation_id = %context.correlation_id,
                user_id = sender_id(&envelope).unwrap_or("unknown"),
                "received chat update"
            );

            match self.dispatcher.dispatch(&envelope, &context).await {
                Ok(HandlerResult::Responded(messages)) => {
                    self.deliver(&messages, &context).await;
                }
                Ok(result) => {
                    debug!(
                        correlation_id = %context.correlation_id,
                        result = ?result,
                        "chat update produced no reply"
                    );
                }
                Err(error) => {
                    warn!(
                        update_id = envelope.update_id,
                        correlation_id = %context.correlation_id,
                        error = %error,
                        "event dispatch failed; continuing polling loop"
                    );
                }
            }
        }
    }

    /// Sends replies one by one in order; a failed send is logged and not retried.
    async fn deliver(&self, messages: &[OutgoingMessage], context: &EventContext) {
        for message in messages {
            match self.transport.send(message).await {
                Ok(()) => debug!(
                    event_name = "egress.chat.message_sent",
                    correlation_id = %context.correlation_id,
                    chat_id = message.chat_id,
                    "sent chat message"
                ),
                Err(error) => warn!(
                    event_name = "egress.chat.message_sent",
                    correlation_id = %context.correlation_id,
                    chat_id = message.chat_id,
                    error = %error,
                    "failed to send chat message"
                ),
            }
        }
    }
}

#[derive(Default)]
struct PumpProgress {
    connected: bool,
    delivered: usize,
}

fn sender_id(envelope: &ChatEnvelope) -> Option<&str> {
    match &envelope.event {
        ChatEvent::TextMessage(event) => Some(event.user_id.as_str()),
        ChatEvent::Unsupported { .. } => None,
    }
}
