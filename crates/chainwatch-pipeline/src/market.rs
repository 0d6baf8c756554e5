//! Market-data lookups over HTTP.
//!
//! Best-effort and short-timeout: every caller treats a failure as "no data"
//! and carries on with placeholders.

use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::error::MarketDataError;

/// Dynamic market figures for one token.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketInfo {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub market_cap: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub holders: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub dev_holders: f64,
    #[serde(default, rename = "holdersDevPercent", deserialize_with = "lenient_f64")]
    pub dev_holding_percent: f64,
    #[serde(default, rename = "top10HoldersPercentage", deserialize_with = "lenient_f64")]
    pub top10_percent: f64,
}

/// Static token metadata.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TokenMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
}

/// The market-data collaborator.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// `Ok(None)` when the service answers but has nothing for this token.
    async fn market_info(&self, token: Address) -> Result<Option<MarketInfo>, MarketDataError>;
    async fn token_meta(&self, token: Address) -> Result<Option<TokenMeta>, MarketDataError>;
}

/// `{"success": bool, "data": {...}}`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Option<T> {
        if self.success {
            self.data
        } else {
            None
        }
    }
}

/// Numbers arrive either as JSON numbers or as decimal strings; null and
/// unparseable strings read as 0.
fn lenient_f64<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Str(String),
        Null,
    }
    Ok(match Option::<Raw>::deserialize(de)? {
        Some(Raw::Num(n)) => n,
        Some(Raw::Str(s)) => s.trim().parse().unwrap_or(0.0),
        Some(Raw::Null) | None => 0.0,
    })
}

/// Settings for [`BinanceMarketData`].
#[derive(Debug, Clone)]
pub struct MarketDataConfig {
    pub dynamic_info_url: String,
    pub meta_info_url: String,
    pub chain_id: String,
    pub timeout: Duration,
}

/// Client for the Binance Web3 wallet market endpoints.
pub struct BinanceMarketData {
    http: reqwest::Client,
    config: MarketDataConfig,
}

impl BinanceMarketData {
    pub fn new(config: MarketDataConfig) -> Result<Self, MarketDataError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MarketDataError::Http(e.to_string()))?;
        Ok(Self { http, config })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        token: Address,
    ) -> Result<Option<T>, MarketDataError> {
        let contract = format!("{token:#x}");
        let resp = self
            .http
            .get(url)
            .query(&[
                ("chainId", self.config.chain_id.as_str()),
                ("contractAddress", contract.as_str()),
            ])
            .send()
            .await
            .map_err(|e| MarketDataError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(MarketDataError::Status(resp.status().as_u16()));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| MarketDataError::Http(e.to_string()))?;
        parse_envelope(&body)
    }
}

fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<Option<T>, MarketDataError> {
    serde_json::from_str::<Envelope<T>>(body)
        .map(Envelope::into_data)
        .map_err(|e| MarketDataError::Parse(e.to_string()))
}

#[async_trait]
impl MarketData for BinanceMarketData {
    async fn market_info(&self, token: Address) -> Result<Option<MarketInfo>, MarketDataError> {
        self.fetch(&self.config.dynamic_info_url, token).await
    }

    async fn token_meta(&self, token: Address) -> Result<Option<TokenMeta>, MarketDataError> {
        self.fetch(&self.config.meta_info_url, token).await
    }
}

/// Market cap, or 0 when unavailable.
pub async fn market_cap_or_zero(market: &dyn MarketData, token: Address) -> f64 {
    match market.market_info(token).await {
        Ok(Some(info)) => info.market_cap,
        Ok(None) => {
            tracing::warn!(token = %token, "no market data");
            0.0
        }
        Err(e) => {
            tracing::warn!(token = %token, error = %e, "market data lookup failed");
            0.0
        }
    }
}
