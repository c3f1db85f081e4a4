use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Harvest configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HarvestConfig {
    /// Paginated listing endpoint, queried with `?page=N`
    pub listing_url: String,
    /// Total number of listing pages.
    /// Discovered manually from the site's pagination, it may change.
    pub pages_amount: u32,
    /// Attempts per page before the page is abandoned
    pub retries_amount: u32,
    /// Host running the Tor client
    pub proxy_host: String,
    /// Tor SOCKS5 listener
    pub socks_port: u16,
    /// Tor control port
    pub control_port: u16,
    /// Password for `AUTHENTICATE` (HashedControlPassword)
    pub control_password: Option<String>,
    /// Cookie file for `AUTHENTICATE` (CookieAuthentication)
    pub cookie_path: Option<String>,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Seconds Tor refuses a second NEWNYM for
    pub newnym_cooldown: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            pages_amount: default_pages_amount(),
            retries_amount: default_retries_amount(),
            proxy_host: default_proxy_host(),
            socks_port: default_socks_port(),
            control_port: default_control_port(),
            control_password: None,
            cookie_path: None,
            timeout: default_timeout(),
            newnym_cooldown: default_newnym_cooldown(),
        }
    }
}

// Default value functions
fn default_listing_url() -> String {
    "https://eda.ru/recepty".to_string()
}

fn default_pages_amount() -> u32 {
    291
}

fn default_retries_amount() -> u32 {
    10
}

fn default_proxy_host() -> String {
    "127.0.0.1".to_string()
}

fn default_socks_port() -> u16 {
    9150
}

fn default_control_port() -> u16 {
    9151
}

fn default_timeout() -> u64 {
    30
}

fn default_newnym_cooldown() -> u64 {
    10
}

impl HarvestConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with EDA_HARVEST__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: EDA_HARVEST__PAGES_AMOUNT
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    /// SOCKS5 proxy URL; `socks5h` resolves hostnames through Tor
    pub fn socks_proxy_url(&self) -> String {
        format!("socks5h://{}:{}", self.proxy_host, self.socks_port)
    }

    pub fn control_address(&self) -> String {
        format!("{}:{}", self.proxy_host, self.control_port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn newnym_cooldown(&self) -> Duration {
        Duration::from_secs(self.newnym_cooldown)
    }
}

/// Load configuration from file and environment variables
pub fn load_config() -> Result<HarvestConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Use double underscore for nested keys: EDA_HARVEST__CONTROL_PORT
        .add_source(
            Environment::with_prefix("EDA_HARVEST")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
