use std::{collections::HashMap, sync::Arc};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::{Mutex, OwnedMutexGuard};

use ttb_core::messaging::throttled::{ThrottleConfig, ThrottledMessenger};
use ttb_core::{config::Config, messaging::port::MessagingPort, service::BotService};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub service: Arc<BotService>,
    pub messenger: Arc<dyn MessagingPort>,
    pub chat_locks: Arc<ChatLocks>,
    pub pending_shares: Arc<PendingShares>,
}

/// Per-chat handling locks: messages within one chat are serialized,
/// independent chats proceed in parallel.
#[derive(Default)]
pub struct ChatLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub async fn lock_chat(&self, chat_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(chat_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Last translation per chat, held until the user confirms or dismisses the
/// share keyboard. A newer translation simply replaces the pending one.
#[derive(Default)]
pub struct PendingShares {
    inner: Mutex<HashMap<i64, String>>,
}

impl PendingShares {
    pub async fn put(&self, chat_id: i64, text: String) {
        self.inner.lock().await.insert(chat_id, text);
    }

    pub async fn take(&self, chat_id: i64) -> Option<String> {
        self.inner.lock().await.remove(&chat_id)
    }

    pub async fn clear(&self, chat_id: i64) {
        self.inner.lock().await.remove(&chat_id);
    }
}

pub async fn run_polling(cfg: Arc<Config>, service: Arc<BotService>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    if let Ok(me) = bot.get_me().await {
        tracing::info!("ttb started: @{}", me.username());
    }
    tracing::info!(
        group_id = cfg.telegram_group_id,
        target_language = %cfg.default_target_language,
        auto_detect = cfg.enable_auto_detect,
        sharing = service.sharing_enabled(),
        "configuration loaded"
    );

    // Wrap the raw messenger with a throttling decorator so multi-chunk
    // replies and group fan-out stay under Telegram flood limits. The
    // adapter still retries once on RetryAfter.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig::default(),
    ));

    let state = Arc::new(AppState {
        cfg,
        service,
        messenger,
        chat_locks: Arc::new(ChatLocks::default()),
        pending_shares: Arc::new(PendingShares::default()),
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
