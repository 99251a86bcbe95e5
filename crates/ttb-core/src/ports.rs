//! Ports for the external services the bot talks to.

use async_trait::async_trait;

use crate::Result;

/// One translation call. Constructed per request, not retained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslationRequest {
    pub source_text: String,
    /// ISO 639-1 target code.
    pub target_language: String,
    /// When set, the adapter is asked to also report the detected source
    /// language.
    pub auto_detect: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslationResult {
    pub translated_text: String,
    pub detected_source_language: Option<String>,
}

/// Translation backend port (OpenAI is the first implementation).
///
/// One outbound network call per invocation; retries are the caller's
/// decision, and none are made here.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, req: TranslationRequest) -> Result<TranslationResult>;

    /// Identify the language of `text`. `None` when the backend cannot give
    /// a plausible code.
    async fn detect(&self, text: &str) -> Result<Option<String>>;
}

/// What a social share produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShareReceipt {
    /// Number of posts created (1 for a single post, more for a thread).
    pub posts: usize,
    pub thread: bool,
}

/// Social publishing port (Twitter is the first implementation).
#[async_trait]
pub trait SocialPort: Send + Sync {
    async fn post(&self, text: &str) -> Result<ShareReceipt>;
}
