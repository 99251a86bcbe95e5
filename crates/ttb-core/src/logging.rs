use std::{fs::OpenOptions, sync::Arc};

use tracing_subscriber::{fmt, EnvFilter};

use crate::{config::Config, Result};

/// Initialize tracing for the bot.
///
/// `LOG_LEVEL` sets the default filter; `RUST_LOG` overrides it when set.
/// With `LOG_FILE` configured, output goes to that file (append) instead of
/// stderr.
pub fn init(cfg: &Config) -> Result<()> {
    let level = cfg.log_level.as_str();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},ttb={level},ttb_core={level},ttb_telegram={level}"
        ))
    });

    match &cfg.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .init();
        }
        None => {
            fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(true)
                .init();
        }
    }

    Ok(())
}
