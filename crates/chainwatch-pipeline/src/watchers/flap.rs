//! Charity-token launches on the flap launchpad.
//!
//! The event names the token and its creator; the tax beneficiary only
//! appears in the launch transaction's input, so each event costs one
//! `eth_getTransactionByHash` on the live connection.

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use chainwatch_abi::{Schema, TypeTag};
use chainwatch_rpc::{LogSubscription, RawLog};

use crate::config::FlapSettings;
use crate::enrich::transaction_input;
use crate::error::PipelineError;
use crate::filter;
use crate::format::escape_markdown;
use crate::handler::{EventContext, EventHandler};
use crate::links;
use crate::notification::{FilterDecision, Notification};

pub fn token_created_schema() -> Schema {
    Schema::new("TokenCreated")
        .param("ts", TypeTag::Uint(256))
        .param("creator", TypeTag::Address)
        .param("nonce", TypeTag::Uint(256))
        .param("token", TypeTag::Address)
        .param("name", TypeTag::String)
        .param("symbol", TypeTag::String)
        .param("meta", TypeTag::String)
}

/// Members of the single struct argument of the launch call.
pub fn launch_params_schema() -> Schema {
    Schema::new("newTokenV2")
        .param("name", TypeTag::String)
        .param("symbol", TypeTag::String)
        .param("meta", TypeTag::String)
        .param("dexThresh", TypeTag::Uint(8))
        .param("salt", TypeTag::FixedBytes(32))
        .param("taxRate", TypeTag::Uint(16))
        .param("migratorType", TypeTag::Uint(8))
        .param("quoteToken", TypeTag::Address)
        .param("quoteAmt", TypeTag::Uint(256))
        .param("beneficiary", TypeTag::Address)
        .param("permitData", TypeTag::Bytes)
}

pub struct FlapWatcher {
    subscription: LogSubscription,
    event: Schema,
    launch: Schema,
    vanity_suffix: Option<String>,
}

impl FlapWatcher {
    pub fn new(settings: &FlapSettings) -> Self {
        Self {
            subscription: LogSubscription::new("flap", settings.contract, vec![settings.topic]),
            event: token_created_schema(),
            launch: launch_params_schema(),
            vanity_suffix: settings.vanity_suffix.clone().filter(|s| !s.is_empty()),
        }
    }
}

struct Launch<'a> {
    token: Address,
    creator: Address,
    beneficiary: Address,
    name: &'a str,
    symbol: &'a str,
    tax_rate: u64,
}

fn render(launch: &Launch<'_>, tx: &B256) -> Notification {
    let Launch { token, creator, beneficiary, .. } = launch;
    let text = format!(
        "🔔 *New charity token*\n\n\
         📛 *Name:* {name}\n\
         🔤 *Symbol:* {symbol}\n\
         📍 *Token:* `{token}`\n\n\
         👤 *Creator:* `{creator}`\n\
         💰 *Tax:* {tax:.2}% + 1%\n\
         💸 *Beneficiary:* `{beneficiary}` [Search on X🔎]({x}) | [Search on GitHub🔎]({gh})\n\n\
         🔗 *Tx:* [{tx:#x}]({tx_link})\n\n\
         🔗 *Trade:*\n{trade}",
        name = escape_markdown(launch.name),
        symbol = escape_markdown(launch.symbol),
        tax = launch.tax_rate as f64 / 100.0,
        x = links::x_search(&beneficiary.to_string()),
        gh = links::github_code_search(&beneficiary.to_string()),
        tx_link = links::bscscan_tx(tx),
        trade = links::trading_links(token, false),
    );
    Notification::new(text).button_row(links::buy_buttons(token))
}

#[async_trait]
impl EventHandler for FlapWatcher {
    fn name(&self) -> &str {
        "flap"
    }

    fn subscription(&self) -> &LogSubscription {
        &self.subscription
    }

    async fn evaluate(
        &self,
        log: &RawLog,
        ctx: &mut EventContext<'_>,
    ) -> Result<FilterDecision, PipelineError> {
        let event = self.event.decode_log(&log.topics, &log.data)?;
        let token = event.address("token")?;
        let creator = event.address("creator")?;
        tracing::info!(
            token = %token,
            creator = %creator,
            name = event.string("name")?,
            symbol = event.string("symbol")?,
            "token created"
        );

        if let Some(suffix) = &self.vanity_suffix {
            if let Some(reason) = filter::address_suffix(token, suffix).suppressed() {
                return Ok(FilterDecision::Suppressed(reason));
            }
        }

        let tx = log
            .transaction_hash
            .ok_or_else(|| PipelineError::Enrichment("log has no transactionHash".into()))?;
        let input = transaction_input(&mut *ctx.rpc, tx)
            .await?
            .ok_or_else(|| PipelineError::Enrichment(format!("no input for transaction {tx:#x}")))?;
        let params = self.launch.decode_struct_input(&input)?;
        let beneficiary = params.address("beneficiary")?;
        let tax_rate = u64::try_from(params.uint("taxRate")?).unwrap_or(u64::MAX);

        if let Some(reason) =
            filter::distinct_roles("beneficiary", beneficiary, "creator", creator).suppressed()
        {
            return Ok(FilterDecision::Suppressed(reason));
        }

        let launch = Launch {
            token,
            creator,
            beneficiary,
            name: params.string("name")?,
            symbol: params.string("symbol")?,
            tax_rate,
        };
        Ok(FilterDecision::Notify(render(&launch, &tx)))
    }
}
