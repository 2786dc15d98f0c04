mod compose;
mod config;
mod language;
mod platform;
mod relay;
mod resolver;
mod translate;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::platform::telegram::{self, TelegramSink};
use crate::relay::{Relay, RelaySettings};
use crate::resolver::Resolver;
use crate::translate::GoogleTranslator;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lazytranslate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let default_language = config.translate.default_language()?;
    info!("Configuration loaded successfully");
    info!("  Default language: {}", default_language);
    info!("  Allowed users: {:?}", config.telegram.allowed_user_ids);
    info!("  Response timeout: {:?}", config.relay.response_timeout());

    let bot = build_bot(&config)?;
    let me = bot.get_me().await.context("Unable to init Telegram bot")?;
    let mention = match &config.telegram.mention {
        Some(mention) => mention.clone(),
        None => {
            let username = me
                .user
                .username
                .as_deref()
                .context("Bot has no username, set telegram.mention")?;
            format!("@{}", username)
        }
    };
    info!("Bot ready as {} ({})", mention, me.user.id.0);

    let settings = RelaySettings {
        mention,
        allowed_user_ids: config.telegram.allowed_user_ids.iter().copied().collect(),
        deadline: config.relay.response_timeout(),
    };
    let relay = Arc::new(Relay::new(
        settings,
        Resolver::new(default_language),
        Arc::new(GoogleTranslator::new(config.translate.clone())),
        Arc::new(TelegramSink::new(bot.clone())),
    ));

    info!("Bot is starting...");
    telegram::run(
        relay,
        bot,
        me.user.id,
        Duration::from_secs(u64::from(config.telegram.poll_timeout_secs)),
    )
    .await?;

    Ok(())
}

/// Telegram client, routed through the SOCKS5 proxy when one is configured.
/// Long polling needs an HTTP timeout above the poll timeout.
fn build_bot(config: &Config) -> Result<Bot> {
    let http_timeout = Duration::from_secs(u64::from(config.telegram.poll_timeout_secs) + 10);
    let mut builder = teloxide::net::default_reqwest_settings().timeout(http_timeout);

    match &config.proxy {
        Some(proxy) => {
            info!("Proxy is enabled: {}", proxy.address);
            builder = builder
                .proxy(reqwest::Proxy::all(proxy.url()?).context("Can't configure the proxy")?);
        }
        None => info!("Proxy is disabled"),
    }

    let client = builder
        .build()
        .context("Failed to build the Telegram HTTP client")?;
    Ok(Bot::with_client(&config.telegram.bot_token, client))
}
