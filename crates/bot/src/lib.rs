//! Chat interface for the shop bot.
//!
//! - **Events** (`events`) - incoming updates, dispatcher, and the conversation service
//!   that loads a session, runs the flow engine and saves the session back
//! - **Keyboards** (`keyboard`) - outgoing messages with reply keyboards
//! - **Transport** (`transport`) - `ChatTransport` trait and the polling loop
//! - **Telegram** (`telegram`) - Bot API transport over long polling
//!
//! ```text
//! Telegram getUpdates → PollingRunner → EventDispatcher → ConversationService
//!                                                              ↓
//!                        sendMessage ← OutgoingMessage ← FlowEngine + SessionRepository
//! ```

pub mod events;
pub mod keyboard;
pub mod telegram;
pub mod transport;

pub use events::{
    conversation_dispatcher, ChatEnvelope, ChatEvent, ConversationService, EventContext,
    EventDispatcher, HandlerResult, TextMessageEvent,
};
pub use keyboard::OutgoingMessage;
pub use telegram::TelegramTransport;
pub use transport::{ChatTransport, PollingRunner, ReconnectPolicy, TransportError};
