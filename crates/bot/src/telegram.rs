//! Telegram Bot API transport: long polling with `getUpdates`, replies with `sendMessage`.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use loja_core::config::TelegramConfig;

use crate::events::{ChatEnvelope, ChatEvent, TextMessageEvent};
use crate::keyboard::OutgoingMessage;
use crate::transport::{ChatTransport, TransportError};

const ALLOWED_UPDATES: &[&str] = &["message"];

pub struct TelegramTransport {
    client: Client,
    api_base_url: String,
    bot_token: SecretString,
    poll_timeout_secs: u64,
    state: Mutex<PollState>,
}

#[derive(Default)]
struct PollState {
    offset: Option<i64>,
    pending: VecDeque<ChatEnvelope>,
}

impl TelegramTransport {
    pub fn new(config: &TelegramConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 10))
            .build()
            .map_err(|error| TransportError::Connect(error.without_url().to_string()))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            bot_token: config.bot_token.clone(),
            poll_timeout_secs: config.poll_timeout_secs,
            state: Mutex::new(PollState::default()),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base_url, self.bot_token.expose_secret())
    }

    /// reqwest errors carry the request URL, which embeds the token; strip it.
    async fn call<P, T>(&self, method: &str, payload: &P) -> Result<T, String>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await
            .map_err(|error| format!("{method} request failed: {}", error.without_url()))?;

        let status = response.status();
        let body: ApiResponse<T> = response.json().await.map_err(|error| {
            format!("failed to decode {method} response ({status}): {}", error.without_url())
        })?;

        match body.result {
            Some(result) if body.ok => Ok(result),
            _ => Err(format!(
                "{method} returned {status}: {}",
                body.description.unwrap_or_else(|| "no description".to_owned())
            )),
        }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let me: BotUser =
            self.call("getMe", &serde_json::json!({})).await.map_err(TransportError::Connect)?;
        info!(
            bot_id = me.id,
            bot_username = me.username.as_deref().unwrap_or("unknown"),
            "telegram bot identity confirmed"
        );
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<ChatEnvelope>, TransportError> {
        let mut state = self.state.lock().await;
        loop {
            if let Some(envelope) = state.pending.pop_front() {
                return Ok(Some(envelope));
            }

            let request = GetUpdatesRequest {
                offset: state.offset,
                timeout: self.poll_timeout_secs,
                allowed_updates: ALLOWED_UPDATES,
            };
            let updates: Vec<Update> =
                self.call("getUpdates", &request).await.map_err(TransportError::Receive)?;
            debug!(count = updates.len(), offset = ?state.offset, "telegram poll returned");

            if let Some(last) = updates.last() {
                state.offset = Some(last.update_id + 1);
            }
            state.pending.extend(updates.into_iter().map(Update::into_envelope));
        }
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        let _sent: IgnoredAny =
            self.call("sendMessage", message).await.map_err(TransportError::Send)?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

#[derive(Debug, Deserialize)]
struct BotUser {
    id: i64,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    from: Option<Sender>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct Sender {
    id: i64,
    first_name: Option<String>,
    #[serde(default)]
    is_bot: bool,
}

impl Update {
    fn into_envelope(self) -> ChatEnvelope {
        let update_id = self.update_id;
        let event = match self.message {
            Some(Message { chat, from: Some(sender), text: Some(text) }) if !sender.is_bot => {
                ChatEvent::TextMessage(TextMessageEvent {
                    chat_id: chat.id,
                    user_id: sender.id.to_string(),
                    first_name: sender.first_name,
                    text,
                })
            }
            Some(_) => ChatEvent::Unsupported { event_type: "message".to_owned() },
            None => ChatEvent::Unsupported { event_type: "update".to_owned() },
        };
        ChatEnvelope { update_id, event }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;

    use loja_core::config::TelegramConfig;

    use super::{ApiResponse, GetUpdatesRequest, TelegramTransport, Update, ALLOWED_UPDATES};
    use crate::events::{ChatEvent, TextMessageEvent};

    fn parse_updates(value: serde_json::Value) -> Vec<Update> {
        let response: ApiResponse<Vec<Update>> =
            serde_json::from_value(value).expect("valid getUpdates payload");
        assert!(response.ok);
        response.result.expect("result present")
    }

    #[test]
    fn text_messages_become_text_events() {
        let updates = parse_updates(json!({
            "ok": true,
            "result": [{
                "update_id": 501,
                "message": {
                    "message_id": 9,
                    "date": 1_700_000_000,
                    "chat": { "id": 77, "type": "private" },
                    "from": { "id": 1234, "is_bot": false, "first_name": "Maria" },
                    "text": "Ver Camisetas"
                }
            }]
        }));

        let envelope = updates.into_iter().next().expect("one update").into_envelope();

        assert_eq!(envelope.update_id, 501);
        assert_eq!(
            envelope.event,
            ChatEvent::TextMessage(TextMessageEvent {
                chat_id: 77,
                user_id: "1234".to_owned(),
                first_name: Some("Maria".to_owned()),
                text: "Ver Camisetas".to_owned(),
            })
        );
    }

    #[test]
    fn non_text_updates_are_unsupported() {
        let updates = parse_updates(json!({
            "ok": true,
            "result": [
                {
                    "update_id": 1,
                    "message": {
                        "chat": { "id": 1 },
                        "from": { "id": 1, "is_bot": false, "first_name": "A" },
                        "sticker": { "file_id": "x" }
                    }
                },
                { "update_id": 2, "edited_message": { "chat": { "id": 1 }, "text": "x" } },
                {
                    "update_id": 3,
                    "message": {
                        "chat": { "id": 1 },
                        "from": { "id": 99, "is_bot": true, "first_name": "Bot" },
                        "text": "/start"
                    }
                }
            ]
        }));

        let events: Vec<ChatEvent> =
            updates.into_iter().map(|update| update.into_envelope().event).collect();

        assert!(events.iter().all(|event| matches!(event, ChatEvent::Unsupported { .. })));
    }

    #[test]
    fn error_responses_keep_description() {
        let response: ApiResponse<Vec<Update>> = serde_json::from_value(json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        }))
        .expect("error payload");

        assert!(!response.ok);
        assert!(response.result.is_none());
        assert_eq!(response.description.as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn get_updates_request_omits_missing_offset() {
        let first =
            GetUpdatesRequest { offset: None, timeout: 30, allowed_updates: ALLOWED_UPDATES };
        let next = GetUpdatesRequest { offset: Some(502), timeout: 30, allowed_updates: &[] };

        assert_eq!(
            serde_json::to_value(first).expect("json"),
            json!({ "timeout": 30, "allowed_updates": ["message"] })
        );
        assert_eq!(serde_json::to_value(next).expect("json")["offset"], json!(502));
    }

    #[test]
    fn method_urls_strip_trailing_slash() {
        let transport = TelegramTransport::new(&TelegramConfig {
            bot_token: SecretString::from("1:abc".to_owned()),
            api_base_url: "http://localhost:8081/".to_owned(),
            poll_timeout_secs: 0,
        })
        .expect("transport");

        assert_eq!(transport.method_url("getMe"), "http://localhost:8081/bot1:abc/getMe");
    }
}
