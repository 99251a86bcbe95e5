use std::sync::Arc;

use ttb_core::{config::Config, ports::SocialPort, service::BotService};
use ttb_openai::OpenAiTranslator;
use ttb_twitter::TwitterClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Arc::new(Config::load()?);
    ttb_core::logging::init(&cfg)?;

    if cfg.database_url.is_some() {
        tracing::info!("DATABASE_URL is set but persistence is not wired up; ignoring");
    }

    let translator = Arc::new(
        OpenAiTranslator::new(cfg.openai_api_key.clone()).with_input_limit(cfg.max_message_length),
    );

    let social: Option<Arc<dyn SocialPort>> = if cfg.enable_twitter_sharing {
        if cfg.twitter_bearer_token.trim().is_empty() {
            tracing::warn!(
                "ENABLE_TWITTER_SHARING is on but TWITTER_BEARER_TOKEN is empty; sharing disabled"
            );
            None
        } else {
            Some(Arc::new(TwitterClient::new(
                cfg.twitter_bearer_token.clone(),
            )))
        }
    } else {
        None
    };

    let service = Arc::new(BotService::new(cfg.clone(), translator, social));

    ttb_telegram::router::run_polling(cfg, service).await
}
