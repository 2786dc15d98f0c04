use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::language::LanguageTag;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub translate: TranslateConfig,
    #[serde(default = "default_relay_config")]
    pub relay: RelayConfig,
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub allowed_user_ids: Vec<u64>,
    /// Token that must lead a message addressed to the bot.
    /// Defaults to `@<bot username>` as reported by Telegram.
    #[serde(default)]
    pub mention: Option<String>,
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranslateConfig {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_language")]
    pub default_language: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    /// Deadline for translating and answering a single message
    #[serde(default = "default_response_timeout_secs")]
    pub response_timeout_secs: u64,
}

/// SOCKS5 proxy for the Telegram connection
#[derive(Debug, Deserialize, Clone)]
pub struct ProxyConfig {
    pub address: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn default_poll_timeout_secs() -> u32 {
    60
}

fn default_base_url() -> String {
    "https://translation.googleapis.com/language/translate/v2".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_response_timeout_secs() -> u64 {
    120
}

fn default_relay_config() -> RelayConfig {
    RelayConfig {
        response_timeout_secs: default_response_timeout_secs(),
    }
}

impl TranslateConfig {
    pub fn default_language(&self) -> Result<LanguageTag> {
        LanguageTag::parse(&self.default_language).with_context(|| {
            format!(
                "Unable to parse the default language: {}",
                self.default_language
            )
        })
    }
}

impl RelayConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_secs)
    }
}

impl ProxyConfig {
    /// Proxy URL with the credentials percent-encoded into it.
    pub fn url(&self) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&format!("socks5://{}", self.address))
            .with_context(|| format!("Invalid proxy address: {}", self.address))?;
        url.set_username(&self.username)
            .map_err(|_| anyhow::anyhow!("Proxy address cannot carry credentials"))?;
        url.set_password(Some(&self.password))
            .map_err(|_| anyhow::anyhow!("Proxy address cannot carry credentials"))?;
        Ok(url)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            bail!("telegram.bot_token is empty");
        }
        if self.telegram.allowed_user_ids.is_empty() {
            bail!("telegram.allowed_user_ids is empty");
        }
        if self.telegram.poll_timeout_secs == 0 {
            bail!("telegram.poll_timeout_secs must be positive");
        }
        if let Some(mention) = &self.telegram.mention {
            if mention.trim().is_empty() || mention.contains(char::is_whitespace) {
                bail!("telegram.mention must be a single word");
            }
        }
        if self.translate.api_key.trim().is_empty() {
            bail!("translate.api_key is empty");
        }
        self.translate.default_language()?;
        if self.relay.response_timeout_secs == 0 {
            bail!("relay.response_timeout_secs must be positive");
        }
        if let Some(proxy) = &self.proxy {
            if proxy.address.trim().is_empty() {
                bail!("proxy.address is empty");
            }
            if proxy.username.is_empty() || proxy.password.is_empty() {
                bail!("proxy.username and proxy.password are required with a proxy");
            }
            proxy.url()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [telegram]
        bot_token = "123:abc"
        allowed_user_ids = [111, 222]

        [translate]
        api_key = "key"
    "#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::parse(MINIMAL).unwrap();
        assert_eq!(config.telegram.allowed_user_ids, vec![111, 222]);
        assert_eq!(config.telegram.mention, None);
        assert_eq!(config.telegram.poll_timeout_secs, 60);
        assert_eq!(config.translate.default_language, "en");
        assert!(config.translate.base_url.starts_with("https://translation.googleapis.com"));
        assert_eq!(config.relay.response_timeout(), Duration::from_secs(120));
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
            [telegram]
            bot_token = "123:abc"
            allowed_user_ids = [1]
            mention = "@lazy_bot"
            poll_timeout_secs = 30

            [translate]
            api_key = "key"
            default_language = "pt-br"

            [relay]
            response_timeout_secs = 15

            [proxy]
            address = "127.0.0.1:1080"
            username = "user"
            password = "p@ss"
            "#,
        )
        .unwrap();
        assert_eq!(config.telegram.mention.as_deref(), Some("@lazy_bot"));
        assert_eq!(config.telegram.poll_timeout_secs, 30);
        assert_eq!(
            config.translate.default_language().unwrap().to_string(),
            "pt-BR"
        );
        assert_eq!(config.relay.response_timeout(), Duration::from_secs(15));

        let url = config.proxy.unwrap().url().unwrap();
        assert_eq!(url.scheme(), "socks5");
        assert_eq!(url.username(), "user");
        assert_eq!(url.password(), Some("p%40ss"));
    }

    #[test]
    fn test_empty_whitelist_rejected() {
        let content = MINIMAL.replace("[111, 222]", "[]");
        assert!(Config::parse(&content).is_err());
    }

    #[test]
    fn test_bad_default_language_rejected() {
        let content = format!("{}default_language = \"klingon\"\n", MINIMAL);
        let err = Config::parse(&content).unwrap_err();
        assert!(format!("{:#}", err).contains("default language"));
    }

    #[test]
    fn test_three_letter_default_language() {
        let content = format!("{}default_language = \"haw\"\n", MINIMAL);
        let config = Config::parse(&content).unwrap();
        assert_eq!(
            config.translate.default_language().unwrap().to_string(),
            "haw"
        );
    }

    #[test]
    fn test_proxy_requires_credentials() {
        let content = format!("{}\n[proxy]\naddress = \"127.0.0.1:1080\"\n", MINIMAL);
        assert!(Config::parse(&content).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let content = format!("{}\n[relay]\nresponse_timeout_secs = 0\n", MINIMAL);
        assert!(Config::parse(&content).is_err());
    }
}
