use async_trait::async_trait;
use thiserror::Error;

use loja_core::domain::session::{Session, UserId};

pub mod memory;
pub mod session;

pub use memory::InMemorySessionRepository;
pub use session::SqlSessionRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Per-user conversation storage. A user without a stored session is in the initial state.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn load(&self, user_id: &UserId) -> Result<Option<Session>, RepositoryError>;
    async fn save(&self, user_id: &UserId, session: &Session) -> Result<(), RepositoryError>;
    async fn delete(&self, user_id: &UserId) -> Result<(), RepositoryError>;
}
