//! OpenAI adapter (translation + language detection).
//!
//! Implements the `ttb-core` `Translator` port over the chat completions
//! endpoint. One outbound call per invocation, no retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ttb_core::{
    errors::Error,
    languages,
    ports::{TranslationRequest, TranslationResult, Translator},
    Result,
};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4";
const MAX_COMPLETION_TOKENS: u32 = 1000;
const TEMPERATURE: f64 = 0.7;

const TRANSLATOR_SYSTEM_PROMPT: &str = "You are a professional translator. \
You produce accurate, natural translations that preserve the meaning and tone \
of the original text.";

#[derive(Clone, Debug)]
pub struct OpenAiTranslator {
    api_key: String,
    model: String,
    /// Inputs longer than this are rejected; the service truncates before
    /// calling, so hitting it means a caller bug.
    input_limit: usize,
    http: reqwest::Client,
}

impl OpenAiTranslator {
    pub fn new(api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("reqwest client build");
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            input_limit: 4000,
            http,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_input_limit(mut self, limit: usize) -> Self {
        self.input_limit = limit;
        self
    }

    async fn complete(&self, user_prompt: String) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: TRANSLATOR_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_tokens: MAX_COMPLETION_TOKENS,
            temperature: TEMPERATURE,
        };

        debug!(model = %self.model, "requesting completion");

        let resp = self
            .http
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("openai request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "openai returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("openai response decode error: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        let content = content.trim().to_string();

        if content.is_empty() {
            return Err(Error::Upstream(
                "openai returned an empty completion".to_string(),
            ));
        }

        Ok(content)
    }

    fn check_input(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::Validation("empty input text".to_string()));
        }
        if text.chars().count() > self.input_limit {
            return Err(Error::Validation(format!(
                "input exceeds the {} character limit",
                self.input_limit
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    async fn translate(&self, req: TranslationRequest) -> Result<TranslationResult> {
        self.check_input(&req.source_text)?;
        let content = self.complete(translation_prompt(&req)).await?;
        Ok(parse_translation(&content, req.auto_detect))
    }

    async fn detect(&self, text: &str) -> Result<Option<String>> {
        self.check_input(text)?;
        let prompt = format!(
            "Identify the language of the following text. Respond with only its \
             ISO 639-1 code, nothing else.\n\n{text}"
        );
        let content = self.complete(prompt).await?;
        Ok(plausible_lang_code(&content))
    }
}

fn translation_prompt(req: &TranslationRequest) -> String {
    let target = languages::display_name(&req.target_language);
    if req.auto_detect {
        format!(
            "Translate the following text to {target}.\n\
             Respond with a single JSON object of the form \
             {{\"translation\": \"...\", \"source_language\": \"<ISO 639-1 code of the source text>\"}}.\n\
             Do not add any text outside the JSON object.\n\n{}",
            req.source_text
        )
    } else {
        format!(
            "Translate the following text to {target}.\n\
             Output only the translation, with no explanations, prefixes, or commentary.\n\n{}",
            req.source_text
        )
    }
}

#[derive(Deserialize)]
struct DetectedPayload {
    translation: String,
    source_language: Option<String>,
}

/// Turn a completion into a `TranslationResult`.
///
/// In auto-detect mode the model is asked for a JSON object; anything that
/// does not parse is taken verbatim as the translation.
fn parse_translation(content: &str, auto_detect: bool) -> TranslationResult {
    if auto_detect {
        if let Ok(payload) = serde_json::from_str::<DetectedPayload>(strip_code_fence(content)) {
            let detected = payload
                .source_language
                .as_deref()
                .and_then(plausible_lang_code);
            return TranslationResult {
                translated_text: payload.translation.trim().to_string(),
                detected_source_language: detected,
            };
        }
    }

    TranslationResult {
        translated_text: content.trim().to_string(),
        detected_source_language: None,
    }
}

/// Models occasionally wrap JSON answers in a markdown code fence.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Accept only answers that look like an ISO 639-1/639-2 code.
fn plausible_lang_code(s: &str) -> Option<String> {
    let first = s.split_whitespace().next()?;
    let code: String = first
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_lowercase();
    if (2..=3).contains(&code.len()) {
        Some(code)
    } else {
        None
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_completion_becomes_the_translation() {
        let result = parse_translation("  Hola mundo  ", false);
        assert_eq!(result.translated_text, "Hola mundo");
        assert_eq!(result.detected_source_language, None);
    }

    #[test]
    fn auto_detect_parses_json_payload() {
        let content = r#"{"translation": "Hola mundo", "source_language": "en"}"#;
        let result = parse_translation(content, true);
        assert_eq!(result.translated_text, "Hola mundo");
        assert_eq!(result.detected_source_language, Some("en".to_string()));
    }

    #[test]
    fn auto_detect_handles_fenced_json() {
        let content = "```json\n{\"translation\": \"Hola\", \"source_language\": \"EN\"}\n```";
        let result = parse_translation(content, true);
        assert_eq!(result.translated_text, "Hola");
        assert_eq!(result.detected_source_language, Some("en".to_string()));
    }

    #[test]
    fn auto_detect_falls_back_to_verbatim_text() {
        let result = parse_translation("Hola mundo", true);
        assert_eq!(result.translated_text, "Hola mundo");
        assert_eq!(result.detected_source_language, None);
    }

    #[test]
    fn implausible_source_codes_are_dropped() {
        let content = r#"{"translation": "Hola", "source_language": "unknown"}"#;
        let result = parse_translation(content, true);
        assert_eq!(result.translated_text, "Hola");
        assert_eq!(result.detected_source_language, None);
    }

    #[test]
    fn lang_code_plausibility() {
        assert_eq!(plausible_lang_code("en"), Some("en".to_string()));
        assert_eq!(plausible_lang_code(" ES \n"), Some("es".to_string()));
        assert_eq!(plausible_lang_code("fra"), Some("fra".to_string()));
        assert_eq!(plausible_lang_code("en."), Some("en".to_string()));
        assert_eq!(plausible_lang_code("I think it is English"), None);
        assert_eq!(plausible_lang_code(""), None);
    }

    #[test]
    fn prompt_names_the_target_language() {
        let req = TranslationRequest {
            source_text: "Hello".to_string(),
            target_language: "es".to_string(),
            auto_detect: false,
        };
        let prompt = translation_prompt(&req);
        assert!(prompt.contains("Spanish"));
        assert!(prompt.ends_with("Hello"));
        assert!(!prompt.contains("JSON"));

        let auto = TranslationRequest {
            auto_detect: true,
            ..req
        };
        assert!(translation_prompt(&auto).contains("source_language"));
    }
}
