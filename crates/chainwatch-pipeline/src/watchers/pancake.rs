//! New PancakeSwap V2 pairs where at least one side already has a real
//! market.
//!
//! The "subject" of a notice is the smaller of the two tokens by market
//! cap: the large side is usually the established quote asset.

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use chainwatch_abi::{Schema, TypeTag};
use chainwatch_rpc::{LogSubscription, RawLog};

use crate::config::PancakeSettings;
use crate::enrich::erc20_name_symbol;
use crate::error::PipelineError;
use crate::filter::{self, Denylist};
use crate::format::{escape_markdown, or_placeholder, usd};
use crate::handler::{EventContext, EventHandler};
use crate::links;
use crate::market::market_cap_or_zero;
use crate::notification::{FilterDecision, Notification};

pub fn pair_created_schema() -> Schema {
    Schema::new("PairCreated")
        .indexed("token0", TypeTag::Address)
        .indexed("token1", TypeTag::Address)
        .param("pair", TypeTag::Address)
        .param("index", TypeTag::Uint(256))
}

pub struct PancakeWatcher {
    subscription: LogSubscription,
    schema: Schema,
    denylist: Denylist,
    market_cap_floor: f64,
    name_suffix: Option<String>,
}

impl PancakeWatcher {
    pub fn new(settings: &PancakeSettings) -> Self {
        Self {
            subscription: LogSubscription::new("pancake", settings.factory, vec![settings.topic]),
            schema: pair_created_schema(),
            denylist: Denylist::new(settings.denylist.iter().copied()),
            market_cap_floor: settings.market_cap_floor,
            name_suffix: settings.name_suffix.clone().filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Side {
    address: Address,
    market_cap: f64,
    name: String,
    symbol: String,
}

impl Side {
    fn name(&self) -> &str {
        or_placeholder(&self.name, "Unknown")
    }

    fn symbol(&self) -> &str {
        or_placeholder(&self.symbol, "?")
    }
}

/// `(subject, paired)`; ties go to `token0`.
fn pick_subject(token0: Side, token1: Side) -> (Side, Side) {
    if token0.market_cap <= token1.market_cap {
        (token0, token1)
    } else {
        (token1, token0)
    }
}

/// Name and symbol from market metadata, falling back to `eth_call`.
async fn token_names(ctx: &mut EventContext<'_>, token: Address) -> (String, String) {
    match ctx.market.token_meta(token).await {
        Ok(Some(meta)) if !(meta.name.is_empty() && meta.symbol.is_empty()) => {
            return (meta.name, meta.symbol);
        }
        Ok(_) => tracing::debug!(token = %token, "no token metadata, asking the contract"),
        Err(e) => tracing::warn!(token = %token, error = %e, "token metadata lookup failed"),
    }
    erc20_name_symbol(&mut *ctx.rpc, token).await
}

fn render(subject: &Side, paired: &Side, pair: Address, tx: Option<&B256>) -> Notification {
    let token = subject.address;
    let tx_line = match tx {
        Some(tx) => format!("🔗 *Tx:* [{tx:#x}]({})\n\n", links::bscscan_tx(tx)),
        None => String::new(),
    };
    let text = format!(
        "🥞 *New PancakeSwap pair*\n\n\
         📛 *Name:* {name}\n\
         🔤 *Symbol:* {symbol}\n\
         📍 *Token:* `{token}`\n\n\
         💰 *Market cap:* {cap}\n\
         🔗 *Paired with:* {paired_name} ({paired_symbol})\n\
         📍 *Paired token:* `{paired_address}`\n\
         💰 *Paired market cap:* {paired_cap}\n\n\
         🔗 *Pair:* `{pair}`\n\
         {tx_line}\
         🔗 *Trade:*\n{trade}",
        name = escape_markdown(subject.name()),
        symbol = escape_markdown(subject.symbol()),
        cap = usd(subject.market_cap),
        paired_name = escape_markdown(paired.name()),
        paired_symbol = escape_markdown(paired.symbol()),
        paired_address = paired.address,
        paired_cap = usd(paired.market_cap),
        trade = links::trading_links(&token, links::is_axiom_listed(&token)),
    );
    Notification::new(text).button_row(links::buy_buttons(&token))
}

#[async_trait]
impl EventHandler for PancakeWatcher {
    fn name(&self) -> &str {
        "pancake"
    }

    fn subscription(&self) -> &LogSubscription {
        &self.subscription
    }

    async fn evaluate(
        &self,
        log: &RawLog,
        ctx: &mut EventContext<'_>,
    ) -> Result<FilterDecision, PipelineError> {
        let event = self.schema.decode_log(&log.topics, &log.data)?;
        let token0 = event.address("token0")?;
        let token1 = event.address("token1")?;
        let pair = event.address("pair")?;
        tracing::info!(token0 = %token0, token1 = %token1, pair = %pair, "pair created");

        if let Some(reason) = self.denylist.check(&[token0, token1]).suppressed() {
            return Ok(FilterDecision::Suppressed(reason));
        }

        let (cap0, cap1) = tokio::join!(
            market_cap_or_zero(ctx.market, token0),
            market_cap_or_zero(ctx.market, token1),
        );
        tracing::debug!(cap0, cap1, "market caps");
        if let Some(reason) = filter::market_cap_floor(&[cap0, cap1], self.market_cap_floor).suppressed() {
            return Ok(FilterDecision::Suppressed(reason));
        }

        let (name0, symbol0) = token_names(ctx, token0).await;
        let (name1, symbol1) = token_names(ctx, token1).await;
        let (subject, paired) = pick_subject(
            Side { address: token0, market_cap: cap0, name: name0, symbol: symbol0 },
            Side { address: token1, market_cap: cap1, name: name1, symbol: symbol1 },
        );

        if let Some(suffix) = &self.name_suffix {
            if let Some(reason) =
                filter::name_suffix(subject.name(), subject.symbol(), suffix).suppressed()
            {
                return Ok(FilterDecision::Suppressed(reason));
            }
        }

        Ok(FilterDecision::Notify(render(
            &subject,
            &paired,
            pair,
            log.transaction_hash.as_ref(),
        )))
    }
}
