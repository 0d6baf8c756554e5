//! Deployment configuration.
//!
//! Loaded once from YAML at startup, overridden from the environment, then
//! validated and shared read-only. Every field has a default matching the
//! BSC mainnet deployment, so an empty file plus `CHAINWATCH_WS_URL` is a
//! working setup.

use std::path::Path;
use std::time::Duration;

use alloy_primitives::{address, b256, Address, B256};
use chainwatch_observability::LogConfig;
use chainwatch_rpc::WsConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::market::MarketDataConfig;

pub const ENV_WS_URL: &str = "CHAINWATCH_WS_URL";
pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default)]
    pub rpc: RpcSettings,
    #[serde(default)]
    pub telegram: TelegramSettings,
    #[serde(default)]
    pub market: MarketSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub logging: LogConfig,
    #[serde(default)]
    pub watchers: WatcherSettings,
}

// ─── Sections ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcSettings {
    /// `ws://` or `wss://` node endpoint.
    #[serde(default)]
    pub ws_url: String,
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,
    #[serde(default = "default_pong_timeout_ms")]
    pub pong_timeout_ms: u64,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

fn default_call_timeout_ms() -> u64 {
    10_000
}

fn default_ping_interval_ms() -> u64 {
    20_000
}

fn default_pong_timeout_ms() -> u64 {
    10_000
}

fn default_reconnect_delay_ms() -> u64 {
    5_000
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            ws_url: String::new(),
            call_timeout_ms: default_call_timeout_ms(),
            ping_interval_ms: default_ping_interval_ms(),
            pong_timeout_ms: default_pong_timeout_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramSettings {
    /// Without a token notifications are only logged.
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Default target chat.
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default = "default_telegram_api")]
    pub api_base: String,
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".into()
}

fn default_http_timeout_ms() -> u64 {
    5_000
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: default_telegram_api(),
            timeout_ms: default_http_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSettings {
    #[serde(default = "default_dynamic_info_url")]
    pub dynamic_info_url: String,
    #[serde(default = "default_meta_info_url")]
    pub meta_info_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: String,
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_dynamic_info_url() -> String {
    "https://web3.binance.com/bapi/defi/v4/public/wallet-direct/buw/wallet/market/token/dynamic/info".into()
}

fn default_meta_info_url() -> String {
    "https://web3.binance.com/bapi/defi/v1/public/wallet-direct/buw/wallet/dex/market/token/meta/info".into()
}

fn default_chain_id() -> String {
    "56".into()
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            dynamic_info_url: default_dynamic_info_url(),
            meta_info_url: default_meta_info_url(),
            chain_id: default_chain_id(),
            timeout_ms: default_http_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// How many recent `(txHash, logIndex)` pairs to remember for duplicate
    /// suppression; 0 turns it off.
    #[serde(default)]
    pub dedup_capacity: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatcherSettings {
    #[serde(default)]
    pub flap: FlapSettings,
    #[serde(default)]
    pub four: FourSettings,
    #[serde(default)]
    pub pancake: PancakeSettings,
}

impl WatcherSettings {
    pub fn any_enabled(&self) -> bool {
        self.flap.enabled || self.four.enabled || self.pancake.enabled
    }

    /// Enable exactly the named watchers.
    pub fn only(&mut self, names: &[&str]) {
        self.flap.enabled = names.contains(&"flap");
        self.four.enabled = names.contains(&"four");
        self.pancake.enabled = names.contains(&"pancake");
    }
}

fn bool_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlapSettings {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_flap_contract")]
    pub contract: Address,
    #[serde(default = "default_flap_topic")]
    pub topic: B256,
    /// Tokens whose address ends with this are skipped.
    #[serde(default = "default_vanity_suffix")]
    pub vanity_suffix: Option<String>,
}

fn default_flap_contract() -> Address {
    address!("e2cE6ab80874Fa9Fa2aAE65D277Dd6B8e65C9De0")
}

fn default_flap_topic() -> B256 {
    b256!("504e7f360b2e5fe33cbaaae4c593bc55305328341bf79009e43e0e3b7f699603")
}

fn default_vanity_suffix() -> Option<String> {
    Some("8888".into())
}

impl Default for FlapSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            contract: default_flap_contract(),
            topic: default_flap_topic(),
            vanity_suffix: default_vanity_suffix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FourSettings {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_four_contract")]
    pub contract: Address,
    #[serde(default = "default_four_create_topic")]
    pub create_topic: B256,
    #[serde(default = "default_four_liquidity_topic")]
    pub liquidity_topic: B256,
    /// Channel for new-token notices; unset means creations are not sent.
    #[serde(default)]
    pub create_channel: Option<String>,
    /// Channel for migration notices; unset means migrations are not sent.
    #[serde(default)]
    pub migrate_channel: Option<String>,
}

fn default_four_contract() -> Address {
    address!("5c952063c7fc8610FFDB798152D69F0B9550762b")
}

fn default_four_create_topic() -> B256 {
    b256!("396d5e902b675b032348d3d2e9517ee8f0c4a926603fbc075d3d282ff00cad20")
}

fn default_four_liquidity_topic() -> B256 {
    b256!("c18aa71171b358b706fe3dd345299685ba21a5316c66ffa9e319268b033c44b0")
}

impl Default for FourSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            contract: default_four_contract(),
            create_topic: default_four_create_topic(),
            liquidity_topic: default_four_liquidity_topic(),
            create_channel: None,
            migrate_channel: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PancakeSettings {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_pancake_factory")]
    pub factory: Address,
    #[serde(default = "default_pair_created_topic")]
    pub topic: B256,
    /// Pairs touching any of these are skipped.
    #[serde(default = "default_denylist")]
    pub denylist: Vec<Address>,
    /// USD; pairs where every token is below this are skipped.
    #[serde(default = "default_market_cap_floor")]
    pub market_cap_floor: f64,
    /// Only notify when the subject's name or symbol ends with this.
    #[serde(default)]
    pub name_suffix: Option<String>,
}

fn default_pancake_factory() -> Address {
    address!("cA143Ce32Fe78f1f7019d7d551a6402fC5350c73")
}

fn default_pair_created_topic() -> B256 {
    b256!("0d3648bd0f6ba80134a33ba9275ac585d9d315f0ad8355cddefde31afa28d0e9")
}

fn default_market_cap_floor() -> f64 {
    1_000_000.0
}

fn default_denylist() -> Vec<Address> {
    vec![
        address!("bb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"), // WBNB
        address!("000ae314e2a2172a039b26378814c252734f556a"), // ASTER
        address!("55d398326f99059fF775485246999027B3197955"), // USDT
        address!("8d0D000Ee44948FC98c9B98A4FA4921476f08B0d"), // USD1
        address!("ce24439f2d9c6a2289f741120fe202248b666666"), // U
        address!("0782b6d8c4551b9760e74c0545a9bcd90bdc41e5"), // lisUSD
    ]
}

impl Default for PancakeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            factory: default_pancake_factory(),
            topic: default_pair_created_topic(),
            denylist: default_denylist(),
            market_cap_floor: default_market_cap_floor(),
            name_suffix: None,
        }
    }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

impl WatchConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read `path`, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&yaml)?;
        config.apply_env();
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `CHAINWATCH_WS_URL`, `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`
    /// from `lookup`; empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_WS_URL) {
            self.rpc.ws_url = url;
        }
        if let Some(token) = get(ENV_BOT_TOKEN) {
            self.telegram.bot_token = Some(token);
        }
        if let Some(chat) = get(ENV_CHAT_ID) {
            self.telegram.chat_id = Some(chat);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.rpc.ws_url).map_err(|e| {
            ConfigError::Invalid(format!("rpc.ws_url '{}': {e}", self.rpc.ws_url))
        })?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ConfigError::Invalid(format!(
                "rpc.ws_url must use ws:// or wss://, got {}://",
                url.scheme()
            )));
        }
        if !self.watchers.any_enabled() {
            return Err(ConfigError::Invalid("no watcher is enabled".into()));
        }
        let timeouts = [
            ("rpc.call_timeout_ms", self.rpc.call_timeout_ms),
            ("rpc.ping_interval_ms", self.rpc.ping_interval_ms),
            ("rpc.pong_timeout_ms", self.rpc.pong_timeout_ms),
            ("market.timeout_ms", self.market.timeout_ms),
            ("telegram.timeout_ms", self.telegram.timeout_ms),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, ms)| *ms == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be positive")));
        }
        let floor = self.watchers.pancake.market_cap_floor;
        if !floor.is_finite() || floor < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "watchers.pancake.market_cap_floor must be a non-negative number, got {floor}"
            )));
        }
        Ok(())
    }

    // ─── Derived settings ────────────────────────────────────────────────────

    pub fn ws_config(&self) -> WsConfig {
        WsConfig {
            ping_interval: Duration::from_millis(self.rpc.ping_interval_ms),
            pong_timeout: Duration::from_millis(self.rpc.pong_timeout_ms),
            call_timeout: Duration::from_millis(self.rpc.call_timeout_ms),
        }
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.rpc.reconnect_delay_ms)
    }

    pub fn market_config(&self) -> MarketDataConfig {
        MarketDataConfig {
            dynamic_info_url: self.market.dynamic_info_url.clone(),
            meta_info_url: self.market.meta_info_url.clone(),
            chain_id: self.market.chain_id.clone(),
            timeout: Duration::from_millis(self.market.timeout_ms),
        }
    }
}
