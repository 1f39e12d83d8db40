pub mod chat;

pub use chat::{chat_panel, ChatAction};
