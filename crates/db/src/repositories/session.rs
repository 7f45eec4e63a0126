use chrono::Utc;
use sqlx::Row;

use loja_core::domain::session::{Session, UserId};

use super::{RepositoryError, SessionRepository};
use crate::DbPool;

/// Stores each session as a JSON snapshot keyed by the chat user id.
pub struct SqlSessionRepository {
    pool: DbPool,
}

impl SqlSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<Session, RepositoryError> {
    let snapshot: String =
        row.try_get("snapshot").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    serde_json::from_str(&snapshot)
        .map_err(|e| RepositoryError::Decode(format!("invalid session snapshot: {e}")))
}

#[async_trait::async_trait]
impl SessionRepository for SqlSessionRepository {
    async fn load(&self, user_id: &UserId) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query("SELECT snapshot FROM conversation_session WHERE user_id = ?")
            .bind(&user_id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_session(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, user_id: &UserId, session: &Session) -> Result<(), RepositoryError> {
        let snapshot = serde_json::to_string(session)
            .map_err(|e| RepositoryError::Decode(format!("could not encode session: {e}")))?;

        sqlx::query(
            "INSERT INTO conversation_session (user_id, state, snapshot, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                 state = excluded.state,
                 snapshot = excluded.snapshot,
                 updated_at = excluded.updated_at",
        )
        .bind(&user_id.0)
        .bind(session.state.as_str())
        .bind(&snapshot)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM conversation_session WHERE user_id = ?")
            .bind(&user_id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
