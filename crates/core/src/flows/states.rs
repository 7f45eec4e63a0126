use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::cart::CartLine;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    #[default]
    Start,
    BrowsingCategory,
    ViewingCart,
    AwaitingName,
    AwaitingAddress,
}

impl FlowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::BrowsingCategory => "browsing_category",
            Self::ViewingCart => "viewing_cart",
            Self::AwaitingName => "awaiting_name",
            Self::AwaitingAddress => "awaiting_address",
        }
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an incoming text means, independent of the state it arrives in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    StartCommand,
    CancelCommand,
    UnknownCommand,
    ViewCategory { key: String },
    ViewCart,
    BackToCategories,
    ContinueShopping,
    Checkout,
    FreeText,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEvent {
    pub kind: EventKind,
    /// Trimmed message text, kept so states that accept free input can use it verbatim.
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowContext {
    pub cart_is_empty: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowAction {
    ResetSession,
    Greet,
    ListCategory { key: String },
    ShowCart,
    ShowCategoryMenu,
    AddItem { code: String },
    WarnEmptyCart,
    PromptForName,
    StorePendingName { name: String },
    CompleteOrder { address: String },
    ConfirmCancelled,
    NotUnderstood,
    InvalidCartOption,
    UnknownCommand,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: FlowState,
    pub to: FlowState,
    pub event: FlowEvent,
    pub actions: Vec<FlowAction>,
}

/// Rows of quick-reply labels. Advisory only: users may still type anything.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub rows: Vec<Vec<String>>,
}

impl Menu {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuChange {
    #[default]
    Keep,
    Show(Menu),
    Hide,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub menu: MenuChange,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), menu: MenuChange::Keep }
    }

    pub fn with_menu(mut self, menu: Menu) -> Self {
        self.menu = MenuChange::Show(menu);
        self
    }

    pub fn hide_menu(mut self) -> Self {
        self.menu = MenuChange::Hide;
        self
    }
}

/// Checkout snapshot handed to a human for payment and delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub customer_name: String,
    pub address: String,
    pub lines: Vec<CartLine>,
    pub total: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub transition: TransitionOutcome,
    pub replies: Vec<Reply>,
    pub order: Option<OrderSummary>,
}
