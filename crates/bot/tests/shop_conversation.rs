use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use loja_bot::keyboard::ReplyMarkup;
use loja_bot::{
    conversation_dispatcher, ChatEnvelope, ChatEvent, ChatTransport, ConversationService,
    OutgoingMessage, PollingRunner, ReconnectPolicy, TextMessageEvent, TransportError,
};
use loja_core::domain::session::UserId;
use loja_core::flows::FlowEngine;
use loja_db::migrations;
use loja_db::{connect_with_settings, SessionRepository, SqlSessionRepository};

struct ChatScript {
    inbox: Mutex<VecDeque<ChatEnvelope>>,
    outbox: Mutex<Vec<OutgoingMessage>>,
}

impl ChatScript {
    fn new(user_id: i64, lines: &[&str]) -> Self {
        let inbox = lines
            .iter()
            .enumerate()
            .map(|(index, text)| ChatEnvelope {
                update_id: index as i64 + 1,
                event: ChatEvent::TextMessage(TextMessageEvent {
                    chat_id: user_id,
                    user_id: user_id.to_string(),
                    first_name: Some("Ana".to_owned()),
                    text: (*text).to_owned(),
                }),
            })
            .collect();
        Self { inbox: Mutex::new(inbox), outbox: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl ChatTransport for ChatScript {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<ChatEnvelope>, TransportError> {
        Ok(self.inbox.lock().await.pop_front())
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        self.outbox.lock().await.push(message.clone());
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

async fn sql_sessions() -> Arc<SqlSessionRepository> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrate");
    Arc::new(SqlSessionRepository::new(pool))
}

async fn run_script(
    sessions: Arc<SqlSessionRepository>,
    user_id: i64,
    lines: &[&str],
) -> Vec<OutgoingMessage> {
    let transport = Arc::new(ChatScript::new(user_id, lines));
    let dispatcher =
        conversation_dispatcher(ConversationService::new(FlowEngine::default(), sessions));
    PollingRunner::new(transport.clone(), dispatcher, ReconnectPolicy::default())
        .start()
        .await
        .expect("runner completes");
    let outbox = transport.outbox.lock().await.clone();
    outbox
}

#[tokio::test]
async fn full_purchase_over_the_wire() {
    let sessions = sql_sessions().await;

    let sent = run_script(
        sessions.clone(),
        31,
        &[
            "/start",
            "Ver Camisetas",
            "cam001",
            "CAM001",
            "Voltar às categorias",
            "Ver Carrinho",
            "Finalizar Compra",
            "Ana Souza",
            "Rua das Flores, 10",
        ],
    )
    .await;

    let texts: Vec<&str> = sent.iter().map(|message| message.text.as_str()).collect();
    assert!(texts[0].starts_with("Olá Ana!"));
    assert!(texts[1].starts_with("--- MOSTRANDO CAMISETAS ---"));
    assert_eq!(texts[2], "✅ Adicionado 'Camiseta Branca Básica' ao carrinho.");
    assert_eq!(texts[3], texts[2]);
    assert!(texts[5].contains("2x Camiseta Branca Básica (R$ 50.00) - Sub: R$ 100.00"));

    let name_prompt = &sent[6];
    assert!(name_prompt.text.contains("NOME"));
    assert!(matches!(name_prompt.reply_markup, Some(ReplyMarkup::Remove(_))));

    let confirmation = texts[8];
    assert!(confirmation.contains("Obrigado, Ana Souza!"));
    assert!(confirmation.contains("TOTAL DO PEDIDO: R$ 100.00"));
    assert!(confirmation.contains("Rua das Flores, 10"));
    assert!(texts[9].starts_with("Compra finalizada com sucesso!"));
    assert_eq!(sent.len(), 10);

    let stored = sessions.load(&UserId("31".to_owned())).await.expect("load");
    assert_eq!(stored, None, "a completed order leaves nothing stored");
}

#[tokio::test]
async fn session_resumes_across_runner_restarts() {
    let sessions = sql_sessions().await;

    run_script(sessions.clone(), 32, &["Ver Calças", "cal001"]).await;
    let sent = run_script(sessions.clone(), 32, &["Voltar às categorias", "Ver Carrinho"]).await;

    assert!(sent[1].text.contains("1x Calça Jeans Reta (R$ 120.00)"));
}

#[tokio::test]
async fn cancel_mid_checkout_clears_everything() {
    let sessions = sql_sessions().await;

    let sent = run_script(
        sessions.clone(),
        33,
        &[
            "Ver Calças",
            "cal002",
            "Voltar às categorias",
            "Ver Carrinho",
            "Finalizar Compra",
            "/cancel",
        ],
    )
    .await;

    assert!(sent.last().expect("cancel reply").text.starts_with("Ação cancelada."));
    let stored = sessions.load(&UserId("33".to_owned())).await.expect("load");
    assert_eq!(stored, None, "cancel clears the stored session");
}
