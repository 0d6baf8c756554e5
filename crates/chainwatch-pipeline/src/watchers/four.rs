//! four.meme launchpad: new tokens and their migration to a DEX.
//!
//! Both events come from one contract on one subscription. Creations are
//! rendered straight from the event; migrations look up the base token's
//! name on chain and its market figures over HTTP.

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use chainwatch_abi::{Schema, TypeTag};
use chainwatch_rpc::{LogSubscription, RawLog};

use crate::config::FourSettings;
use crate::enrich::erc20_name_symbol;
use crate::error::PipelineError;
use crate::format::{escape_markdown, market_cap_short, or_placeholder};
use crate::handler::{EventContext, EventHandler};
use crate::links;
use crate::market::MarketInfo;
use crate::notification::{FilterDecision, LinkButton, Notification};

pub fn token_create_schema() -> Schema {
    Schema::new("TokenCreate")
        .param("creator", TypeTag::Address)
        .param("token", TypeTag::Address)
        .param("requestId", TypeTag::Uint(256))
        .param("name", TypeTag::String)
        .param("symbol", TypeTag::String)
        .param("totalSupply", TypeTag::Uint(256))
        .param("launchTime", TypeTag::Uint(256))
        .param("launchFee", TypeTag::Uint(256))
}

pub fn liquidity_added_schema() -> Schema {
    Schema::new("LiquidityAdded")
        .param("base", TypeTag::Address)
        .param("offers", TypeTag::Uint(256))
        .param("quote", TypeTag::Address)
        .param("funds", TypeTag::Uint(256))
}

pub struct FourWatcher {
    subscription: LogSubscription,
    create_topic: B256,
    liquidity_topic: B256,
    create: Schema,
    liquidity: Schema,
    create_channel: Option<String>,
    migrate_channel: Option<String>,
}

impl FourWatcher {
    pub fn new(settings: &FourSettings) -> Self {
        Self {
            subscription: LogSubscription::new(
                "four",
                settings.contract,
                vec![settings.create_topic, settings.liquidity_topic],
            ),
            create_topic: settings.create_topic,
            liquidity_topic: settings.liquidity_topic,
            create: token_create_schema(),
            liquidity: liquidity_added_schema(),
            create_channel: non_empty(&settings.create_channel),
            migrate_channel: non_empty(&settings.migrate_channel),
        }
    }

    fn on_create(&self, log: &RawLog) -> Result<FilterDecision, PipelineError> {
        let event = self.create.decode_log(&log.topics, &log.data)?;
        let token = event.address("token")?;
        let creator = event.address("creator")?;
        let name = event.string("name")?;
        let symbol = event.string("symbol")?;
        tracing::info!(token = %token, creator = %creator, name, symbol, "token create");

        let Some(channel) = self.create_channel.clone() else {
            return Ok(FilterDecision::suppressed("no channel configured for token creation"));
        };
        let text = format!(
            "🆕 *New token*\n\n\
             💰 *Name:* {name} (BSC)\n\
             🔣 *Symbol:* {symbol}\n\n\
             {trade}\n\n\
             📋 *Contract:* `{token}`",
            name = escape_markdown(name),
            symbol = escape_markdown(symbol),
            trade = links::trading_links(&token, true),
        );
        let notification = Notification::new(text)
            .button_row(vec![
                LinkButton::new("Search CA on X", links::x_search(&token.to_string())),
                LinkButton::new("Search creator on X", links::x_search(&creator.to_string())),
            ])
            .button_row(links::buy_buttons(&token).into_iter().take(2).collect())
            .to_channel(Some(channel));
        Ok(FilterDecision::Notify(notification))
    }

    async fn on_liquidity(
        &self,
        log: &RawLog,
        ctx: &mut EventContext<'_>,
    ) -> Result<FilterDecision, PipelineError> {
        let event = self.liquidity.decode_log(&log.topics, &log.data)?;
        let base = event.address("base")?;
        let quote = event.address("quote")?;
        tracing::info!(base = %base, quote = %quote, "liquidity added");

        let Some(channel) = self.migrate_channel.clone() else {
            return Ok(FilterDecision::suppressed("no channel configured for migration"));
        };
        let (name, symbol) = erc20_name_symbol(&mut *ctx.rpc, base).await;
        let market = match ctx.market.market_info(base).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(token = %base, error = %e, "market data lookup failed");
                None
            }
        };

        let notification = render_migration(base, &name, &symbol, market.as_ref())
            .button_row(vec![LinkButton::new(
                "Search CA on X",
                links::x_search(&base.to_string()),
            )])
            .button_row(links::buy_buttons(&base).into_iter().take(2).collect())
            .to_channel(Some(channel));
        Ok(FilterDecision::Notify(notification))
    }
}

fn non_empty(channel: &Option<String>) -> Option<String> {
    channel.as_ref().filter(|c| !c.trim().is_empty()).cloned()
}

fn render_migration(base: Address, name: &str, symbol: &str, market: Option<&MarketInfo>) -> Notification {
    let mut text = format!(
        "🚀🚀🚀 *Token migrated*\n\n\
         💰 *Name:* {} (BSC)\n\
         🔣 *Symbol:* {}\n\n",
        escape_markdown(or_placeholder(name, "Unknown")),
        escape_markdown(or_placeholder(symbol, "?")),
    );
    if let Some(info) = market {
        text.push_str(&format!(
            "🚀 *Market cap:* {}\n\
             👥 *Holders:* {:.0} | *Top 10:* {:.2}%\n\n",
            market_cap_short(info.market_cap),
            info.holders,
            info.top10_percent,
        ));
    }
    text.push_str(&format!(
        "{}\n\n📋 *Contract:* `{base}`",
        links::trading_links(&base, true)
    ));
    Notification::new(text)
}

#[async_trait]
impl EventHandler for FourWatcher {
    fn name(&self) -> &str {
        "four"
    }

    fn subscription(&self) -> &LogSubscription {
        &self.subscription
    }

    async fn evaluate(
        &self,
        log: &RawLog,
        ctx: &mut EventContext<'_>,
    ) -> Result<FilterDecision, PipelineError> {
        match log.topic0() {
            Some(t) if *t == self.create_topic => self.on_create(log),
            Some(t) if *t == self.liquidity_topic => self.on_liquidity(log, ctx).await,
            other => Ok(FilterDecision::suppressed(format!("unexpected topic {other:?}"))),
        }
    }
}
