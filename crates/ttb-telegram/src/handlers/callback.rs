//! Share-confirmation callbacks (the inline keyboard after a translation).

use std::sync::Arc;

use teloxide::{prelude::*, types::CallbackQuery};
use tracing::warn;

use ttb_core::{
    domain::{ChatId, MessageId, MessageRef},
    formatting::{part_header, split_chunks},
    messaging::types::{SHARE_CONFIRM, SHARE_DISMISS},
};

use crate::handlers::message::outbound_limit;
use crate::router::AppState;

pub(crate) async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let cb_id = q.id.clone();
    let data = q.data.clone().unwrap_or_default();

    // Always answer the callback query, even when there is nothing to do.
    let Some(msg) = q.message.as_ref() else {
        let _ = state.messenger.answer_callback(&cb_id, None).await;
        return Ok(());
    };
    let chat = ChatId(msg.chat.id.0);
    let keyboard_msg = MessageRef {
        chat_id: chat,
        message_id: MessageId(msg.id.0),
    };

    match data.as_str() {
        SHARE_DISMISS => {
            let _guard = state.chat_locks.lock_chat(chat.0).await;
            state.pending_shares.clear(chat.0).await;
            let _ = state.messenger.answer_callback(&cb_id, None).await;
            let _ = state
                .messenger
                .edit_text(keyboard_msg, "Sharing dismissed.")
                .await;
        }
        SHARE_CONFIRM => {
            let _guard = state.chat_locks.lock_chat(chat.0).await;
            let Some(text) = state.pending_shares.take(chat.0).await else {
                // Pressed twice, or a newer translation replaced this one.
                let _ = state
                    .messenger
                    .answer_callback(&cb_id, Some("Nothing left to share."))
                    .await;
                let _ = state
                    .messenger
                    .edit_text(keyboard_msg, "Nothing left to share.")
                    .await;
                return Ok(());
            };

            let _ = state.messenger.answer_callback(&cb_id, None).await;
            let _ = state.messenger.edit_text(keyboard_msg, "📤 Sharing…").await;

            let report = share(&state, &text).await;
            let _ = state.messenger.edit_text(keyboard_msg, &report).await;
        }
        _ => {
            let _ = state.messenger.answer_callback(&cb_id, None).await;
        }
    }

    Ok(())
}

/// Publish to Twitter and republish to the group chat. Each destination is
/// attempted and reported independently; the translation already delivered
/// to the user is never touched.
async fn share(state: &AppState, text: &str) -> String {
    let mut lines = Vec::new();

    match state.service.share(text).await {
        Ok(receipt) if receipt.thread => lines.push(format!(
            "✅ Posted to Twitter as a {}-tweet thread.",
            receipt.posts
        )),
        Ok(_) => lines.push("✅ Posted to Twitter.".to_string()),
        Err(e) => {
            warn!(error = %e, "twitter share failed");
            lines.push(format!("❌ Twitter: {}", short(&e.to_string())));
        }
    }

    match post_to_group(state, text).await {
        Ok(parts) if parts > 1 => {
            lines.push(format!("✅ Posted to the group chat in {parts} parts."))
        }
        Ok(_) => lines.push("✅ Posted to the group chat.".to_string()),
        Err(e) => {
            warn!(error = %e, "group republish failed");
            lines.push(format!("❌ Group chat: {}", short(&e.to_string())));
        }
    }

    lines.join("\n")
}

async fn post_to_group(state: &AppState, text: &str) -> ttb_core::Result<usize> {
    let group = ChatId(state.cfg.telegram_group_id);
    let chunks = split_chunks(text, outbound_limit(state));
    let total = chunks.len();
    for (i, chunk) in chunks.iter().enumerate() {
        state
            .messenger
            .send_text(group, &part_header(i, total, chunk))
            .await?;
    }
    Ok(total)
}

fn short(detail: &str) -> String {
    detail.chars().take(160).collect()
}
