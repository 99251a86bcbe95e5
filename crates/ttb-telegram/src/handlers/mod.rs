//! Telegram update handlers.
//!
//! Each update is reduced to text (message body or media caption), then
//! handed to the core service under the chat's handling lock.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use crate::router::AppState;

mod callback;
mod message;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    // Forwarded messages and media captions translate like regular text.
    let Some(text) = msg
        .text()
        .or_else(|| msg.caption())
        .map(|s| s.to_string())
    else {
        return Ok(());
    };

    let chat_id = msg.chat.id.0;
    let _guard = state.chat_locks.lock_chat(chat_id).await;
    message::process(state, chat_id, text).await;
    Ok(())
}

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    callback::handle_callback(q, state).await
}
