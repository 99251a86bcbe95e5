use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, languages, Result};

/// Typed configuration, loaded from the environment (with `.env` support).
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    /// Chat the share action republishes translations into. Group ids are
    /// usually negative numbers.
    pub telegram_group_id: i64,

    // OpenAI
    pub openai_api_key: String,

    // Twitter. The OAuth quartet is accepted for compatibility with older
    // deployments; posting itself only needs the bearer token.
    pub twitter_api_key: String,
    pub twitter_api_secret: String,
    pub twitter_access_token: String,
    pub twitter_access_token_secret: String,
    pub twitter_bearer_token: String,

    // Behavior
    pub default_target_language: String,
    pub max_message_length: usize,
    pub enable_auto_detect: bool,
    pub enable_twitter_sharing: bool,

    // Logging
    pub log_level: String,
    pub log_file: Option<PathBuf>,

    // Rate limiting
    pub max_requests_per_minute: usize,
    pub max_requests_per_hour: usize,

    /// Reserved for future persistence features. Read from the environment
    /// but not consumed anywhere yet.
    pub database_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        let telegram_group_id_raw = env_str("TELEGRAM_GROUP_ID").unwrap_or_default();
        let openai_api_key = env_str("OPENAI_API_KEY").unwrap_or_default();

        // Report every missing required variable at once.
        let mut missing = Vec::new();
        if telegram_bot_token.trim().is_empty() {
            missing.push("TELEGRAM_BOT_TOKEN");
        }
        if telegram_group_id_raw.trim().is_empty() {
            missing.push("TELEGRAM_GROUP_ID");
        }
        if openai_api_key.trim().is_empty() {
            missing.push("OPENAI_API_KEY");
        }
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let telegram_group_id = telegram_group_id_raw.trim().parse::<i64>().map_err(|_| {
            Error::Config(format!(
                "TELEGRAM_GROUP_ID must be a numeric chat id, got: {telegram_group_id_raw}"
            ))
        })?;

        let twitter_api_key = env_str("TWITTER_API_KEY").unwrap_or_default();
        let twitter_api_secret = env_str("TWITTER_API_SECRET").unwrap_or_default();
        let twitter_access_token = env_str("TWITTER_ACCESS_TOKEN").unwrap_or_default();
        let twitter_access_token_secret =
            env_str("TWITTER_ACCESS_TOKEN_SECRET").unwrap_or_default();
        let twitter_bearer_token = env_str("TWITTER_BEARER_TOKEN").unwrap_or_default();

        let default_target_language = env_str("DEFAULT_TARGET_LANGUAGE")
            .and_then(non_empty)
            .unwrap_or_else(|| "es".to_string())
            .to_lowercase();
        if !languages::is_supported(&default_target_language) {
            return Err(Error::Config(format!(
                "DEFAULT_TARGET_LANGUAGE is not a supported language code: {default_target_language}"
            )));
        }

        let max_message_length = env_usize("MAX_MESSAGE_LENGTH").unwrap_or(4000);
        if max_message_length == 0 {
            return Err(Error::Config(
                "MAX_MESSAGE_LENGTH must be greater than zero".to_string(),
            ));
        }

        let enable_auto_detect = env_bool("ENABLE_AUTO_DETECT").unwrap_or(true);
        let enable_twitter_sharing = env_bool("ENABLE_TWITTER_SHARING").unwrap_or(true);

        let log_level = env_str("LOG_LEVEL")
            .and_then(non_empty)
            .unwrap_or_else(|| "info".to_string())
            .to_lowercase();
        let log_file = env_str("LOG_FILE").and_then(non_empty).map(PathBuf::from);

        let max_requests_per_minute = env_usize("MAX_REQUESTS_PER_MINUTE").unwrap_or(30);
        let max_requests_per_hour = env_usize("MAX_REQUESTS_PER_HOUR").unwrap_or(500);

        let database_url = env_str("DATABASE_URL").and_then(non_empty);

        Ok(Self {
            telegram_bot_token,
            telegram_group_id,
            openai_api_key,
            twitter_api_key,
            twitter_api_secret,
            twitter_access_token,
            twitter_access_token_secret,
            twitter_bearer_token,
            default_target_language,
            max_message_length,
            enable_auto_detect,
            enable_twitter_sharing,
            log_level,
            log_file,
            max_requests_per_minute,
            max_requests_per_hour,
            database_url,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
