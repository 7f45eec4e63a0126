use std::sync::Arc;

use crate::catalog::Catalog;
use crate::domain::session::Session;
use crate::flows::states::{
    EventKind, FlowAction, FlowContext, FlowEvent, FlowState, OrderSummary, Reply,
    TransitionOutcome, Turn,
};
use crate::presentation::{self, labels};

pub const START_COMMAND: &str = "/start";
pub const CANCEL_COMMAND: &str = "/cancel";

/// Drives a single session through the shop conversation.
///
/// `handle` is a pure function of (session, text, sender name): replaying the same inputs
/// against a fresh session always produces the same replies.
#[derive(Clone, Debug)]
pub struct FlowEngine {
    catalog: Arc<Catalog>,
}

impl FlowEngine {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn classify(&self, text: &str) -> FlowEvent {
        let text = text.trim();
        FlowEvent { kind: classify_text(&self.catalog, text), text: text.to_owned() }
    }

    pub fn transition(
        &self,
        current: FlowState,
        event: &FlowEvent,
        context: &FlowContext,
    ) -> TransitionOutcome {
        transition_shop(current, event, context)
    }

    pub fn handle(&self, session: &mut Session, text: &str, first_name: Option<&str>) -> Turn {
        let event = self.classify(text);
        let context = FlowContext { cart_is_empty: session.cart.is_empty() };
        let transition = self.transition(session.state, &event, &context);

        let mut replies = Vec::with_capacity(transition.actions.len());
        let mut order = None;
        for action in &transition.actions {
            if let Some(summary) = self.execute(action, session, first_name, &mut replies) {
                order = Some(summary);
            }
        }
        session.state = transition.to;

        Turn { transition, replies, order }
    }

    fn execute(
        &self,
        action: &FlowAction,
        session: &mut Session,
        first_name: Option<&str>,
        replies: &mut Vec<Reply>,
    ) -> Option<OrderSummary> {
        let catalog = self.catalog.as_ref();
        match action {
            FlowAction::ResetSession => session.reset(),
            FlowAction::Greet => replies.push(
                Reply::text(presentation::greeting(first_name))
                    .with_menu(presentation::category_menu(catalog)),
            ),
            FlowAction::ListCategory { key } => replies.push(
                Reply::text(presentation::list_category(catalog, key))
                    .with_menu(presentation::product_menu()),
            ),
            FlowAction::ShowCart => replies.push(
                Reply::text(presentation::describe_cart(&session.cart))
                    .with_menu(presentation::cart_menu()),
            ),
            FlowAction::ShowCategoryMenu => replies.push(
                Reply::text(presentation::SHOWING_CATEGORIES)
                    .with_menu(presentation::category_menu(catalog)),
            ),
            FlowAction::AddItem { code } => replies
                .push(Reply::text(presentation::add_item(catalog, &mut session.cart, code))),
            FlowAction::WarnEmptyCart => {
                replies.push(Reply::text(presentation::CHECKOUT_EMPTY_CART));
            }
            FlowAction::PromptForName => {
                replies.push(Reply::text(presentation::ASK_NAME).hide_menu());
            }
            FlowAction::StorePendingName { name } => {
                session.pending_name = Some(name.clone());
                replies.push(Reply::text(presentation::ask_address(name)));
            }
            FlowAction::CompleteOrder { address } => {
                let summary = OrderSummary {
                    customer_name: session
                        .pending_name
                        .clone()
                        .unwrap_or_else(|| presentation::DEFAULT_CUSTOMER_NAME.to_owned()),
                    address: address.clone(),
                    lines: session.cart.lines().to_vec(),
                    total: session.cart.total(),
                };
                let cart_summary = presentation::describe_cart(&session.cart);
                let confirmation = presentation::order_confirmation(&summary, &cart_summary);
                replies.push(Reply::text(confirmation));
                replies.push(
                    Reply::text(presentation::PURCHASE_COMPLETED)
                        .with_menu(presentation::category_menu(catalog)),
                );
                session.reset();
                return Some(summary);
            }
            FlowAction::ConfirmCancelled => replies.push(
                Reply::text(presentation::CANCELLED)
                    .with_menu(presentation::category_menu(catalog)),
            ),
            FlowAction::NotUnderstood => replies.push(Reply::text(presentation::NOT_UNDERSTOOD)),
            FlowAction::InvalidCartOption => {
                replies.push(Reply::text(presentation::INVALID_CART_OPTION));
            }
            FlowAction::UnknownCommand => {
                replies.push(Reply::text(presentation::UNKNOWN_COMMAND));
            }
        }
        None
    }
}

impl Default for FlowEngine {
    fn default() -> Self {
        Self::new(Arc::new(Catalog::builtin()))
    }
}

fn classify_text(catalog: &Catalog, text: &str) -> EventKind {
    if text.starts_with('/') {
        // Telegram may address commands as `/start@LojaBot`.
        let command = text
            .split_whitespace()
            .next()
            .and_then(|token| token.split('@').next())
            .unwrap_or_default()
            .to_lowercase();
        return match command.as_str() {
            START_COMMAND => EventKind::StartCommand,
            CANCEL_COMMAND => EventKind::CancelCommand,
            _ => EventKind::UnknownCommand,
        };
    }

    let lowered = text.to_lowercase();
    let matches_label = |label: &str| lowered == label.to_lowercase();
    if matches_label(labels::VIEW_CART) {
        return EventKind::ViewCart;
    }
    if matches_label(labels::BACK_TO_CATEGORIES) {
        return EventKind::BackToCategories;
    }
    if matches_label(labels::CHECKOUT) {
        return EventKind::Checkout;
    }
    if matches_label(labels::CONTINUE_SHOPPING) {
        return EventKind::ContinueShopping;
    }

    let prefix = labels::VIEW_CATEGORY_PREFIX.to_lowercase();
    if let Some(category) =
        lowered.strip_prefix(&prefix).and_then(|label| catalog.category_by_label(label))
    {
        return EventKind::ViewCategory { key: category.key.clone() };
    }

    EventKind::FreeText
}

fn transition_shop(
    current: FlowState,
    event: &FlowEvent,
    context: &FlowContext,
) -> TransitionOutcome {
    use FlowAction::{
        AddItem, CompleteOrder, ConfirmCancelled, Greet, InvalidCartOption, ListCategory,
        NotUnderstood, PromptForName, ResetSession, ShowCart, ShowCategoryMenu, StorePendingName,
        WarnEmptyCart,
    };
    use FlowState::{AwaitingAddress, AwaitingName, BrowsingCategory, Start, ViewingCart};

    let (to, actions) = match (current, &event.kind) {
        (_, EventKind::StartCommand) => (Start, vec![ResetSession, Greet]),
        (_, EventKind::CancelCommand) => (Start, vec![ResetSession, ConfirmCancelled]),
        (state, EventKind::UnknownCommand) => (state, vec![FlowAction::UnknownCommand]),

        (Start, EventKind::ViewCategory { key }) => {
            (BrowsingCategory, vec![ListCategory { key: key.clone() }])
        }
        (Start, EventKind::ViewCart) => (ViewingCart, vec![ShowCart]),
        (Start, _) => (Start, vec![NotUnderstood]),

        (BrowsingCategory, EventKind::BackToCategories) => (Start, vec![ShowCategoryMenu]),
        (BrowsingCategory, _) => {
            (BrowsingCategory, vec![AddItem { code: event.text.to_lowercase() }])
        }

        (ViewingCart, EventKind::ContinueShopping) => (Start, vec![ShowCategoryMenu]),
        (ViewingCart, EventKind::Checkout) if context.cart_is_empty => {
            (Start, vec![WarnEmptyCart, ShowCategoryMenu])
        }
        (ViewingCart, EventKind::Checkout) => (AwaitingName, vec![PromptForName]),
        (ViewingCart, _) => (ViewingCart, vec![InvalidCartOption]),

        (AwaitingName, _) => {
            (AwaitingAddress, vec![StorePendingName { name: event.text.clone() }])
        }
        (AwaitingAddress, _) => (Start, vec![CompleteOrder { address: event.text.clone() }]),
    };

    TransitionOutcome { from: current, to, event: event.clone(), actions }
}
