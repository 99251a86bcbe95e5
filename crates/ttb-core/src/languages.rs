//! Supported language registry (ISO 639-1 codes).

/// Codes the bot accepts as translation targets, with display names.
pub const SUPPORTED: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
    ("ar", "Arabic"),
    ("hi", "Hindi"),
    ("nl", "Dutch"),
    ("sv", "Swedish"),
    ("da", "Danish"),
    ("no", "Norwegian"),
    ("fi", "Finnish"),
    ("pl", "Polish"),
    ("tr", "Turkish"),
    ("he", "Hebrew"),
    ("th", "Thai"),
    ("vi", "Vietnamese"),
    ("id", "Indonesian"),
    ("ms", "Malay"),
    ("tl", "Filipino"),
    ("sw", "Swahili"),
    ("yo", "Yoruba"),
];

pub fn is_supported(code: &str) -> bool {
    name_for(code).is_some()
}

pub fn name_for(code: &str) -> Option<&'static str> {
    let code = code.trim().to_lowercase();
    SUPPORTED
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Display name for a code, falling back to the uppercased code itself for
/// languages outside the registry (the detector may report any ISO code).
pub fn display_name(code: &str) -> String {
    match name_for(code) {
        Some(name) => name.to_string(),
        None => code.trim().to_uppercase(),
    }
}

/// Bulleted listing for the `/languages` reply.
pub fn listing() -> String {
    let mut out = String::from("🌐 Supported languages:\n");
    for (code, name) in SUPPORTED {
        out.push_str(&format!("\n• {code} — {name}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_resolve() {
        assert!(is_supported("es"));
        assert!(is_supported("ES "));
        assert_eq!(name_for("ja"), Some("Japanese"));
        assert!(!is_supported("xx"));
    }

    #[test]
    fn display_name_falls_back_to_code() {
        assert_eq!(display_name("fr"), "French");
        assert_eq!(display_name("xx"), "XX");
    }

    #[test]
    fn listing_mentions_every_code() {
        let listing = listing();
        for (code, name) in SUPPORTED {
            assert!(listing.contains(code));
            assert!(listing.contains(name));
        }
    }
}
