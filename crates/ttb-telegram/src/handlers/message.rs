use tracing::warn;

use ttb_core::{
    command::{parse_message, Command, ParsedMessage},
    domain::{ChatId, MessageRef},
    errors::Error,
    formatting::split_chunks,
    messaging::types::InlineKeyboard,
    service::{Outcome, MIN_AUTO_TRANSLATE_CHARS},
};

use std::sync::Arc;

use crate::router::AppState;

pub(crate) async fn process(state: Arc<AppState>, chat_id: i64, text: String) {
    let chat = ChatId(chat_id);
    let parsed = parse_message(&text);

    // Show a progress message only when adapter work is coming.
    let progress = match &parsed {
        ParsedMessage::Command(Command::Detect { .. }) => Some("🔍 Detecting…"),
        ParsedMessage::Command(cmd) if cmd.consumes_quota() => Some("🔄 Translating…"),
        ParsedMessage::Plain { text }
            if state.cfg.enable_auto_detect
                && text.chars().count() >= MIN_AUTO_TRANSLATE_CHARS =>
        {
            Some("🔄 Translating…")
        }
        _ => None,
    };
    let placeholder = match progress {
        Some(note) => state.messenger.send_text(chat, note).await.ok(),
        None => None,
    };

    match state.service.handle_parsed(chat, parsed).await {
        Ok(Outcome::Ignored) => {}
        Ok(Outcome::Reply(reply)) => deliver(&state, chat, placeholder, &reply).await,
        Ok(Outcome::Translation { reply, share_offer }) => {
            deliver(&state, chat, placeholder, &reply).await;
            if let Some(share_text) = share_offer {
                offer_share(&state, chat, share_text).await;
            }
        }
        Err(err) => {
            warn!(chat_id, error = %err, "message handling failed");
            deliver(&state, chat, placeholder, &error_reply(&err)).await;
        }
    }
}

/// Send a reply, split to fit the messenger limit. The first chunk replaces
/// the progress placeholder when one was shown.
async fn deliver(
    state: &AppState,
    chat: ChatId,
    placeholder: Option<MessageRef>,
    text: &str,
) {
    let mut chunks = split_chunks(text, outbound_limit(state)).into_iter();
    let Some(first) = chunks.next() else {
        return;
    };

    let edited = match placeholder {
        Some(msg) if state.messenger.capabilities().supports_edit => {
            state.messenger.edit_text(msg, &first).await.is_ok()
        }
        _ => false,
    };
    if !edited {
        if let Err(e) = state.messenger.send_text(chat, &first).await {
            warn!(chat_id = chat.0, error = %e, "failed to send reply");
            return;
        }
    }

    for chunk in chunks {
        if let Err(e) = state.messenger.send_text(chat, &chunk).await {
            warn!(chat_id = chat.0, error = %e, "failed to send reply chunk");
            return;
        }
    }
}

async fn offer_share(state: &AppState, chat: ChatId, share_text: String) {
    if !state.messenger.capabilities().supports_inline_keyboards {
        return;
    }
    state.pending_shares.put(chat.0, share_text).await;
    let _ = state
        .messenger
        .send_keyboard(
            chat,
            "Share this translation to Twitter and the group chat?",
            InlineKeyboard::share_confirm(),
        )
        .await;
}

pub(crate) fn outbound_limit(state: &AppState) -> usize {
    state
        .cfg
        .max_message_length
        .min(state.messenger.capabilities().max_message_len)
}

/// User-visible rendering of core errors. Recoverable by design: the reply
/// tells the user what to do next.
pub(crate) fn error_reply(err: &Error) -> String {
    match err {
        Error::Validation(hint) => format!("⚠️ {hint}"),
        Error::RateLimited { retry_after } => match retry_after {
            Some(wait) => {
                let secs = (wait.as_secs_f64().ceil() as u64).max(1);
                format!("⏳ Rate limit reached. Try again in {secs} seconds.")
            }
            None => "⏳ Rate limit reached. Try again later.".to_string(),
        },
        Error::Upstream(detail) => {
            let short: String = detail.chars().take(160).collect();
            format!("❌ Translation failed: {short}")
        }
        _ => "❌ Internal error. Please try again.".to_string(),
    }
}
