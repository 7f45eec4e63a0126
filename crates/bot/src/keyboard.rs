use serde::Serialize;

use loja_core::flows::{Menu, MenuChange, Reply};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
    pub one_time_keyboard: bool,
}

impl From<&Menu> for ReplyKeyboardMarkup {
    fn from(menu: &Menu) -> Self {
        Self {
            keyboard: menu
                .rows
                .iter()
                .map(|row| row.iter().map(|label| KeyboardButton { text: label.clone() }).collect())
                .collect(),
            resize_keyboard: true,
            one_time_keyboard: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReplyKeyboardRemove {
    pub remove_keyboard: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Keyboard(ReplyKeyboardMarkup),
    Remove(ReplyKeyboardRemove),
}

/// A message ready to hand to the transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl OutgoingMessage {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self { chat_id, text: text.into(), reply_markup: None }
    }

    pub fn from_reply(chat_id: i64, reply: &Reply) -> Self {
        let reply_markup = match &reply.menu {
            MenuChange::Keep => None,
            MenuChange::Show(menu) => Some(ReplyMarkup::Keyboard(menu.into())),
            MenuChange::Hide => {
                Some(ReplyMarkup::Remove(ReplyKeyboardRemove { remove_keyboard: true }))
            }
        };
        Self { chat_id, text: reply.text.clone(), reply_markup }
    }
}
