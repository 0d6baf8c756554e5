//! Filter predicates. Each one either lets the event through or suppresses
//! it with a reason; watchers chain them in order.

use std::collections::HashSet;

use alloy_primitives::Address;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Suppress(String),
}

impl Verdict {
    fn suppress(reason: impl Into<String>) -> Self {
        Self::Suppress(reason.into())
    }

    /// The reason, if this verdict stops the chain.
    pub fn suppressed(self) -> Option<String> {
        match self {
            Self::Continue => None,
            Self::Suppress(reason) => Some(reason),
        }
    }
}

/// Suppress when the hex form of `address` ends with `suffix` (case-insensitive).
pub fn address_suffix(address: Address, suffix: &str) -> Verdict {
    let hex = format!("{address:x}");
    if !suffix.is_empty() && hex.ends_with(&suffix.to_ascii_lowercase()) {
        Verdict::suppress(format!("address {address} ends with {suffix}"))
    } else {
        Verdict::Continue
    }
}

/// Static set of addresses that are never newsworthy on their own, such as
/// wrapped native tokens and stablecoins.
#[derive(Debug, Clone, Default)]
pub struct Denylist {
    entries: HashSet<Address>,
}

impl Denylist {
    pub fn new(entries: impl IntoIterator<Item = Address>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.entries.contains(address)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Suppress when any of `addresses` is listed.
    pub fn check(&self, addresses: &[Address]) -> Verdict {
        match addresses.iter().find(|a| self.contains(a)) {
            Some(hit) => Verdict::suppress(format!("{hit} is denylisted")),
            None => Verdict::Continue,
        }
    }
}

/// Suppress when every market cap is below `floor`.
pub fn market_cap_floor(caps: &[f64], floor: f64) -> Verdict {
    if caps.iter().all(|cap| *cap < floor) {
        let caps: Vec<String> = caps.iter().map(|c| format!("{c:.2}")).collect();
        Verdict::suppress(format!("all market caps [{}] below {floor:.0}", caps.join(", ")))
    } else {
        Verdict::Continue
    }
}

/// Suppress when two derived roles resolve to the same address.
pub fn distinct_roles(role_a: &str, a: Address, role_b: &str, b: Address) -> Verdict {
    if a == b {
        Verdict::suppress(format!("{role_a} is the {role_b} ({a})"))
    } else {
        Verdict::Continue
    }
}

/// Continue only when the name or symbol ends with `suffix` (case-insensitive).
pub fn name_suffix(name: &str, symbol: &str, suffix: &str) -> Verdict {
    let suffix = suffix.to_lowercase();
    if name.to_lowercase().ends_with(&suffix) || symbol.to_lowercase().ends_with(&suffix) {
        Verdict::Continue
    } else {
        Verdict::suppress(format!("neither '{name}' nor '{symbol}' ends with '{suffix}'"))
    }
}
