use loja_core::domain::session::UserId;
use loja_core::flows::{FlowEngine, FlowState};
use loja_db::migrations;
use loja_db::{connect_with_settings, SessionRepository, SqlSessionRepository};
use tempfile::TempDir;

async fn turn(
    repo: &SqlSessionRepository,
    engine: &FlowEngine,
    user: &UserId,
    text: &str,
) -> FlowState {
    let mut session = repo.load(user).await.expect("load").unwrap_or_default();
    let turn = engine.handle(&mut session, text, None);
    repo.save(user, &session).await.expect("save");
    turn.transition.to
}

#[tokio::test]
async fn conversation_survives_pool_restart() {
    let dir = TempDir::new().expect("temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("loja.db").display());
    let engine = FlowEngine::default();
    let user = UserId("5550001".to_string());

    {
        let pool = connect_with_settings(&url, 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        let repo = SqlSessionRepository::new(pool.clone());

        assert_eq!(turn(&repo, &engine, &user, "/start").await, FlowState::Start);
        assert_eq!(
            turn(&repo, &engine, &user, "Ver Camisetas").await,
            FlowState::BrowsingCategory
        );
        assert_eq!(turn(&repo, &engine, &user, "CAM002").await, FlowState::BrowsingCategory);
        pool.close().await;
    }

    let pool = connect_with_settings(&url, 1, 30).await.expect("reconnect");
    migrations::run_pending(&pool).await.expect("migrate again");
    let repo = SqlSessionRepository::new(pool);

    let session = repo.load(&user).await.expect("load").expect("session persisted");
    assert_eq!(session.state, FlowState::BrowsingCategory);
    assert_eq!(session.cart.item_count(), 1);

    assert_eq!(turn(&repo, &engine, &user, "Ver Carrinho").await, FlowState::ViewingCart);
    assert_eq!(turn(&repo, &engine, &user, "Finalizar Compra").await, FlowState::AwaitingName);
    assert_eq!(turn(&repo, &engine, &user, "Ana").await, FlowState::AwaitingAddress);
    assert_eq!(turn(&repo, &engine, &user, "Rua A, 1").await, FlowState::Start);

    let session = repo.load(&user).await.expect("load").expect("session persisted");
    assert!(session.cart.is_empty());
    assert_eq!(session.pending_name, None);
}

#[tokio::test]
async fn users_do_not_share_carts() {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrate");
    let repo = SqlSessionRepository::new(pool);
    let engine = FlowEngine::default();
    let alice = UserId("1".to_string());
    let bob = UserId("2".to_string());

    turn(&repo, &engine, &alice, "Ver Calças").await;
    turn(&repo, &engine, &alice, "cal001").await;
    turn(&repo, &engine, &bob, "Ver Carrinho").await;

    let alice_session = repo.load(&alice).await.expect("load").expect("alice");
    let bob_session = repo.load(&bob).await.expect("load").expect("bob");
    assert_eq!(alice_session.cart.item_count(), 1);
    assert!(bob_session.cart.is_empty());
    assert_eq!(bob_session.state, FlowState::ViewingCart);
}
