//! External deep links for a BSC token.

use alloy_primitives::{Address, B256};

use crate::notification::LinkButton;

pub fn bscscan_tx(tx: &B256) -> String {
    format!("https://bscscan.com/tx/{tx:#x}")
}

pub fn x_search(query: &str) -> String {
    format!("https://x.com/search?q={query}")
}

pub fn github_code_search(query: &str) -> String {
    format!("https://github.com/search?q={query}&type=code")
}

pub fn axiom(token: &Address) -> String {
    format!("https://axiom.trade/meme/{token}?chain=bnb")
}

/// `[Ave](..) | [GMGN](..) | ...` for the trading venues, Markdown.
pub fn trading_links(token: &Address, with_axiom: bool) -> String {
    let mut links = vec![format!("[Ave](https://pro.ave.ai/token/{token}-bsc)")];
    if with_axiom {
        links.push(format!("[Axiom]({})", axiom(token)));
    }
    links.push(format!("[Binance Web3](https://web3.binance.com/en/token/bsc/{token})"));
    links.push(format!("[GMGN](https://gmgn.ai/bsc/token/{token})"));
    links.push(format!("[OKX Web3](https://web3.okx.com/token/bsc/{token})"));
    links.join(" | ")
}

/// One row of trading-bot buttons.
pub fn buy_buttons(token: &Address) -> Vec<LinkButton> {
    vec![
        LinkButton::new("Avebot Buy", format!("https://t.me/AveSniperBot_01_bot?start={token}")),
        LinkButton::new("Bloom Buy", format!("https://t.me/BloomEVMbot?start=ca_{token}")),
        LinkButton::new("GMGN Buy", format!("https://t.me/gmgn_bsc_bot?start=c_{token}")),
    ]
}

/// Axiom lists vanity launchpad tokens whose address starts or ends in `4444`.
pub fn is_axiom_listed(token: &Address) -> bool {
    let hex = format!("{token:x}");
    hex.starts_with("4444") || hex.ends_with("4444")
}
