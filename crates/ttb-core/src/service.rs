//! Command dispatch and translation-request handling.

use std::sync::Arc;

use crate::{
    command::{parse_message, Command, ParsedMessage},
    config::Config,
    domain::ChatId,
    errors::Error,
    formatting::{clean_text, format_translation_reply, truncate_chars},
    languages,
    ports::{ShareReceipt, SocialPort, TranslationRequest, Translator},
    ratelimit::{RateLimiter, RateLimits},
    Result,
};

/// Plain-text messages shorter than this are ignored by the auto-translate
/// path (button mashing, "ok", bare emoji).
pub const MIN_AUTO_TRANSLATE_CHARS: usize = 5;

/// What the caller should do with a handled message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Send this reply to the chat.
    Reply(String),
    /// Send the reply; when `share_offer` is set, also offer the
    /// share-confirmation keyboard carrying that text.
    Translation {
        reply: String,
        share_offer: Option<String>,
    },
    /// Nothing to do (plain text with auto-detect off, or too short).
    Ignored,
}

/// The service context injected into the message handlers: translation
/// adapter, optional social adapter, rate limiter, and configuration.
pub struct BotService {
    cfg: Arc<Config>,
    translator: Arc<dyn Translator>,
    social: Option<Arc<dyn SocialPort>>,
    limiter: RateLimiter,
}

impl BotService {
    pub fn new(
        cfg: Arc<Config>,
        translator: Arc<dyn Translator>,
        social: Option<Arc<dyn SocialPort>>,
    ) -> Self {
        let limiter = RateLimiter::new(RateLimits {
            per_minute: cfg.max_requests_per_minute,
            per_hour: cfg.max_requests_per_hour,
        });
        Self {
            cfg,
            translator,
            social,
            limiter,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn sharing_enabled(&self) -> bool {
        self.cfg.enable_twitter_sharing && self.social.is_some()
    }

    pub async fn handle_message(&self, chat: ChatId, text: &str) -> Result<Outcome> {
        self.handle_parsed(chat, parse_message(text)).await
    }

    pub async fn handle_parsed(&self, chat: ChatId, parsed: ParsedMessage) -> Result<Outcome> {
        match parsed {
            ParsedMessage::Command(cmd) => self.dispatch(chat, cmd).await,
            ParsedMessage::Unknown { name } => Ok(Outcome::Reply(format!(
                "Unknown command /{name}. Try /help for the list of commands."
            ))),
            ParsedMessage::Plain { text } => self.handle_plain(chat, &text).await,
        }
    }

    async fn dispatch(&self, chat: ChatId, cmd: Command) -> Result<Outcome> {
        match cmd {
            Command::Start => Ok(Outcome::Reply(self.welcome_text())),
            Command::Help => Ok(Outcome::Reply(self.help_text())),
            Command::Languages => Ok(Outcome::Reply(languages::listing())),
            Command::Settings => Ok(Outcome::Reply(self.settings_summary())),
            Command::Translate { text } => {
                if text.trim().is_empty() {
                    return Err(Error::Validation(
                        "Usage: /translate <text>".to_string(),
                    ));
                }
                self.translate(chat, &text, self.cfg.default_target_language.clone())
                    .await
            }
            Command::TranslateTo { lang, text } => {
                if lang.is_empty() || text.trim().is_empty() {
                    return Err(Error::Validation(
                        "Usage: /translate_to <language code> <text>".to_string(),
                    ));
                }
                if !languages::is_supported(&lang) {
                    return Err(Error::Validation(format!(
                        "Unsupported language code '{lang}'. Use /languages to list supported codes."
                    )));
                }
                self.translate(chat, &text, lang).await
            }
            Command::Detect { text } => {
                if text.trim().is_empty() {
                    return Err(Error::Validation("Usage: /detect <text>".to_string()));
                }
                self.detect(chat, &text).await
            }
        }
    }

    async fn handle_plain(&self, chat: ChatId, text: &str) -> Result<Outcome> {
        if !self.cfg.enable_auto_detect {
            return Ok(Outcome::Ignored);
        }
        if text.chars().count() < MIN_AUTO_TRANSLATE_CHARS {
            return Ok(Outcome::Ignored);
        }
        self.translate(chat, text, self.cfg.default_target_language.clone())
            .await
    }

    /// Charge one rate-limit attempt for `chat` before touching the adapter.
    fn charge(&self, chat: ChatId) -> Result<()> {
        let (ok, retry_after) = self.limiter.allow(chat);
        if ok {
            return Ok(());
        }
        Err(Error::RateLimited { retry_after })
    }

    async fn translate(&self, chat: ChatId, text: &str, target: String) -> Result<Outcome> {
        self.charge(chat)?;

        let cleaned = clean_text(text);
        if cleaned.is_empty() {
            return Err(Error::Validation("Nothing to translate.".to_string()));
        }
        let (source_text, truncated) = truncate_chars(&cleaned, self.cfg.max_message_length);

        let result = self
            .translator
            .translate(TranslationRequest {
                source_text,
                target_language: target.clone(),
                auto_detect: self.cfg.enable_auto_detect,
            })
            .await?;

        let mut reply = format_translation_reply(
            &result.translated_text,
            result.detected_source_language.as_deref(),
            &target,
        );
        if truncated {
            reply.push_str(&format!(
                "\n\n⚠️ The input was longer than {} characters and was truncated before translation.",
                self.cfg.max_message_length
            ));
        }

        let share_offer = self
            .sharing_enabled()
            .then(|| result.translated_text.clone());

        Ok(Outcome::Translation { reply, share_offer })
    }

    async fn detect(&self, chat: ChatId, text: &str) -> Result<Outcome> {
        self.charge(chat)?;

        let cleaned = clean_text(text);
        if cleaned.is_empty() {
            return Err(Error::Validation("Nothing to detect.".to_string()));
        }
        let (sample, _) = truncate_chars(&cleaned, self.cfg.max_message_length);

        let reply = match self.translator.detect(&sample).await? {
            Some(code) => format!(
                "🔍 Detected language: {} ({})",
                languages::display_name(&code),
                code
            ),
            None => "🔍 Could not reliably detect the language of that text.".to_string(),
        };
        Ok(Outcome::Reply(reply))
    }

    /// Publish confirmed text through the social port.
    pub async fn share(&self, text: &str) -> Result<ShareReceipt> {
        if !self.cfg.enable_twitter_sharing {
            return Err(Error::Upstream("social sharing is disabled".to_string()));
        }
        let Some(social) = &self.social else {
            return Err(Error::Upstream(
                "social sharing is not configured".to_string(),
            ));
        };
        social.post(text).await
    }

    fn welcome_text(&self) -> String {
        let target = languages::display_name(&self.cfg.default_target_language);
        let auto = if self.cfg.enable_auto_detect {
            format!("Send me any text and I will translate it to {target} automatically.\n\n")
        } else {
            String::new()
        };
        format!(
            "👋 Welcome to the translation bot!\n\n{auto}Commands:\n\
             /translate <text> — translate to {target}\n\
             /translate_to <lang> <text> — translate to a specific language\n\
             /detect <text> — identify the language of a text\n\
             /languages — list supported language codes\n\
             /settings — show the current configuration\n\
             /help — how the bot works"
        )
    }

    fn help_text(&self) -> String {
        let target = languages::display_name(&self.cfg.default_target_language);
        let mut out = format!(
            "🆘 How this bot works\n\n\
             • /translate <text> translates to {target}.\n\
             • /translate_to <lang> <text> picks the target per message (codes via /languages).\n\
             • /detect <text> tells you what language a text is written in.\n"
        );
        if self.cfg.enable_auto_detect {
            out.push_str("• Plain messages (no command) are translated automatically.\n");
        }
        if self.sharing_enabled() {
            out.push_str(
                "• After a translation you can publish it to Twitter and the group chat with the Share button.\n",
            );
        }
        out.push_str("\nLong messages are truncated; replies are split to fit the chat limits.");
        out
    }

    fn settings_summary(&self) -> String {
        let auto = if self.cfg.enable_auto_detect {
            "enabled"
        } else {
            "disabled"
        };
        let sharing = if self.sharing_enabled() {
            "enabled"
        } else {
            "disabled"
        };
        format!(
            "⚙️ Current settings\n\n\
             • Target language: {} ({})\n\
             • Max message length: {}\n\
             • Auto-detect: {auto}\n\
             • Twitter sharing: {sharing}\n\
             • Rate limits: {}/minute, {}/hour\n\
             • Server time: {}",
            languages::display_name(&self.cfg.default_target_language),
            self.cfg.default_target_language,
            self.cfg.max_message_length,
            self.cfg.max_requests_per_minute,
            self.cfg.max_requests_per_hour,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::ports::TranslationResult;

    #[derive(Default)]
    struct MockTranslator {
        calls: AtomicUsize,
        last_request: Mutex<Option<TranslationRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl Translator for MockTranslator {
        async fn translate(&self, req: TranslationRequest) -> Result<TranslationResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(req.clone());
            if self.fail {
                return Err(Error::Upstream("boom".to_string()));
            }
            Ok(TranslationResult {
                translated_text: format!("[{}] {}", req.target_language, req.source_text),
                detected_source_language: Some("en".to_string()),
            })
        }

        async fn detect(&self, _text: &str) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some("fr".to_string()))
        }
    }

    fn test_config() -> Config {
        Config {
            telegram_bot_token: "token".to_string(),
            telegram_group_id: -100,
            openai_api_key: "key".to_string(),
            twitter_api_key: String::new(),
            twitter_api_secret: String::new(),
            twitter_access_token: String::new(),
            twitter_access_token_secret: String::new(),
            twitter_bearer_token: String::new(),
            default_target_language: "es".to_string(),
            max_message_length: 4000,
            enable_auto_detect: true,
            enable_twitter_sharing: false,
            log_level: "info".to_string(),
            log_file: None,
            max_requests_per_minute: 30,
            max_requests_per_hour: 500,
            database_url: None,
        }
    }

    fn service_with(cfg: Config, translator: Arc<MockTranslator>) -> BotService {
        BotService::new(Arc::new(cfg), translator, None)
    }

    #[tokio::test]
    async fn translate_to_builds_the_right_request() {
        let mock = Arc::new(MockTranslator::default());
        let svc = service_with(test_config(), mock.clone());

        let outcome = svc
            .handle_message(ChatId(1), "/translate_to es Hello")
            .await
            .unwrap();

        let req = mock.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(req.target_language, "es");
        assert_eq!(req.source_text, "Hello");
        assert!(req.auto_detect);
        assert!(matches!(outcome, Outcome::Translation { .. }));
    }

    #[tokio::test]
    async fn languages_skips_adapter_and_limiter() {
        let mock = Arc::new(MockTranslator::default());
        let mut cfg = test_config();
        // A zero ceiling rejects every quota-consuming call.
        cfg.max_requests_per_minute = 0;
        let svc = service_with(cfg, mock.clone());

        let outcome = svc.handle_message(ChatId(1), "/languages").await.unwrap();
        match outcome {
            Outcome::Reply(text) => assert!(text.contains("es — Spanish")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);

        // The same chat is rejected the moment it actually asks to translate.
        let err = svc
            .handle_message(ChatId(1), "/translate hi there")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RateLimited { .. }));
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn upstream_failure_charges_exactly_one_attempt() {
        let mock = Arc::new(MockTranslator {
            fail: true,
            ..MockTranslator::default()
        });
        let mut cfg = test_config();
        cfg.max_requests_per_minute = 2;
        let svc = service_with(cfg, mock.clone());
        let chat = ChatId(5);

        let err = svc
            .handle_message(chat, "/translate first try")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));

        // The failed call consumed one slot; exactly one more is admitted.
        let err = svc
            .handle_message(chat, "/translate second try")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));

        let err = svc
            .handle_message(chat, "/translate third try")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RateLimited { .. }));
        assert_eq!(mock.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn overlong_input_is_truncated_and_flagged() {
        let mock = Arc::new(MockTranslator::default());
        let mut cfg = test_config();
        cfg.max_message_length = 10;
        let svc = service_with(cfg, mock.clone());

        let long = "a".repeat(25);
        let outcome = svc
            .handle_message(ChatId(1), &format!("/translate {long}"))
            .await
            .unwrap();

        let req = mock.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(req.source_text.chars().count(), 10);

        match outcome {
            Outcome::Translation { reply, .. } => assert!(reply.contains("truncated")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn plain_text_respects_auto_detect_flag() {
        let mock = Arc::new(MockTranslator::default());
        let mut cfg = test_config();
        cfg.enable_auto_detect = false;
        let svc = service_with(cfg, mock.clone());

        let outcome = svc
            .handle_message(ChatId(1), "good morning everyone")
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Ignored);
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);

        let svc = service_with(test_config(), mock.clone());
        let outcome = svc
            .handle_message(ChatId(1), "good morning everyone")
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Translation { .. }));
        assert_eq!(mock.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn short_plain_text_is_ignored() {
        let mock = Arc::new(MockTranslator::default());
        let svc = service_with(test_config(), mock.clone());

        let outcome = svc.handle_message(ChatId(1), "ok").await.unwrap();
        assert_eq!(outcome, Outcome::Ignored);
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unsupported_target_language_is_a_validation_error() {
        let mock = Arc::new(MockTranslator::default());
        let svc = service_with(test_config(), mock.clone());

        let err = svc
            .handle_message(ChatId(1), "/translate_to xx Hello")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn detect_reports_the_language_name() {
        let mock = Arc::new(MockTranslator::default());
        let svc = service_with(test_config(), mock.clone());

        let outcome = svc
            .handle_message(ChatId(1), "/detect Bonjour tout le monde")
            .await
            .unwrap();
        match outcome {
            Outcome::Reply(text) => assert!(text.contains("French (fr)")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_command_gets_a_usage_hint() {
        let mock = Arc::new(MockTranslator::default());
        let svc = service_with(test_config(), mock.clone());

        let outcome = svc.handle_message(ChatId(1), "/frobnicate").await.unwrap();
        match outcome {
            Outcome::Reply(text) => assert!(text.contains("/frobnicate")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn share_without_social_port_is_an_upstream_error() {
        let mock = Arc::new(MockTranslator::default());
        let mut cfg = test_config();
        cfg.enable_twitter_sharing = true;
        let svc = service_with(cfg, mock);

        let err = svc.share("hola").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }
}
