//! Slash-command parsing.

/// One incoming message, parsed. Built once per message and discarded after
/// handling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedMessage {
    Command(Command),
    /// A slash command the bot does not know. Answered with a usage hint.
    Unknown { name: String },
    /// Plain text: translated automatically when auto-detect is enabled,
    /// ignored otherwise.
    Plain { text: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Translate { text: String },
    TranslateTo { lang: String, text: String },
    Detect { text: String },
    Languages,
    Settings,
}

impl Command {
    /// Whether handling this command calls the translation adapter (and thus
    /// consumes rate-limit quota).
    pub fn consumes_quota(&self) -> bool {
        matches!(
            self,
            Command::Translate { .. } | Command::TranslateTo { .. } | Command::Detect { .. }
        )
    }
}

/// Parse raw message text into a command or the plain-text fallthrough.
///
/// Matching is prefix-based on the leading token. Telegram groups may send
/// `/cmd@botname arg ...`; the `@botname` suffix is stripped. Command names
/// are case-insensitive; arguments are the trimmed remainder of the line.
pub fn parse_message(text: &str) -> ParsedMessage {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return ParsedMessage::Plain {
            text: trimmed.to_string(),
        };
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let name = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    let cmd = match name.as_str() {
        "start" => Command::Start,
        "help" => Command::Help,
        "languages" => Command::Languages,
        "settings" => Command::Settings,
        "translate" => Command::Translate { text: rest },
        "detect" => Command::Detect { text: rest },
        "translate_to" => {
            let mut args = rest.splitn(2, char::is_whitespace);
            let lang = args.next().unwrap_or("").trim().to_lowercase();
            let text = args.next().unwrap_or("").trim().to_string();
            Command::TranslateTo { lang, text }
        }
        _ => return ParsedMessage::Unknown { name },
    };

    ParsedMessage::Command(cmd)
}
