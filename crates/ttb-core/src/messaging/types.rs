/// Callback payloads for the share-confirmation keyboard.
pub const SHARE_CONFIRM: &str = "share:yes";
pub const SHARE_DISMISS: &str = "share:no";

/// Capabilities / limits of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_edit: bool,
    pub supports_inline_keyboards: bool,
    pub max_message_len: usize,
}

/// Inline keyboard (buttons rendered in a single row).
#[derive(Clone, Debug)]
pub struct InlineKeyboard {
    pub buttons: Vec<InlineButton>,
}

#[derive(Clone, Debug)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineKeyboard {
    pub fn new(buttons: Vec<InlineButton>) -> Self {
        Self { buttons }
    }

    /// The Share / Dismiss pair offered after a translation.
    pub fn share_confirm() -> Self {
        Self::new(vec![
            InlineButton {
                label: "✅ Share".to_string(),
                callback_data: SHARE_CONFIRM.to_string(),
            },
            InlineButton {
                label: "❌ Dismiss".to_string(),
                callback_data: SHARE_DISMISS.to_string(),
            },
        ])
    }
}
