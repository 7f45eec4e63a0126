use serde::{Deserialize, Serialize};

use crate::domain::cart::Cart;
use crate::flows::states::FlowState;

/// Identity of the chat user a session belongs to, as reported by the transport.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub state: FlowState,
    pub cart: Cart,
    pub pending_name: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to the initial state with an empty cart and no checkout fields.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
