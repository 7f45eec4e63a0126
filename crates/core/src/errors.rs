use thiserror::Error;

/// Failures while handling a chat turn, after the message reached the bot.
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("persistence failure: {0}")]
    Persistence(String),
}

/// What the chat user is told when a turn fails. Internal detail stays in `message`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
}

impl InterfaceError {
    /// Text safe to send back to the chat user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable { .. } => {
                "A loja está temporariamente indisponível. Tente novamente dentro de momentos."
            }
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::ServiceUnavailable { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        match self {
            Self::Persistence(message) => {
                InterfaceError::ServiceUnavailable { message, correlation_id }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, InterfaceError};

    #[test]
    fn persistence_error_maps_to_service_unavailable() {
        let interface = ApplicationError::Persistence("database is locked".to_owned())
            .into_interface("update-3");

        let InterfaceError::ServiceUnavailable { ref message, .. } = interface;
        assert_eq!(message, "database is locked");
        assert_eq!(interface.correlation_id(), "update-3");
    }

    #[test]
    fn user_message_hides_internal_detail() {
        let interface =
            ApplicationError::Persistence("disk I/O error".to_owned()).into_interface("update-4");

        assert!(interface.user_message().contains("temporariamente indisponível"));
        assert!(!interface.user_message().contains("disk"));
        assert!(interface.to_string().contains("disk I/O error"));
    }
}
