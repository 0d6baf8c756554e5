//! Number and Markdown helpers for message rendering.

/// `$1,234,567.89`
pub fn usd(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let sign = if value < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    format!("{sign}${}.{frac_part}", group_thousands(int_part))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Compact market cap: `2.5M USD (250.0万)`, `12.3K USD (1.2万)`, `999.0 USD`.
///
/// The parenthesised figure is the same amount in units of 10,000.
pub fn market_cap_short(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.1}M USD ({:.1}万)", value / 1_000_000.0, value / 10_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}K USD ({:.1}万)", value / 1_000.0, value / 10_000.0)
    } else {
        format!("{value:.1} USD")
    }
}

/// Escape the characters legacy Telegram Markdown treats as markup.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Replace an empty string with a placeholder.
pub fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_grouping() {
        assert_eq!(usd(0.0), "$0.00");
        assert_eq!(usd(999.999), "$1,000.00");
        assert_eq!(usd(1_234_567.891), "$1,234,567.89");
        assert_eq!(usd(100_000.0), "$100,000.00");
        assert_eq!(usd(-42.5), "-$42.50");
        assert_eq!(usd(f64::NAN), "$0.00");
    }

    #[test]
    fn market_cap_tiers() {
        assert_eq!(market_cap_short(2_500_000.0), "2.5M USD (250.0万)");
        assert_eq!(market_cap_short(12_345.0), "12.3K USD (1.2万)");
        assert_eq!(market_cap_short(999.0), "999.0 USD");
    }

    #[test]
    fn markdown_escaping() {
        assert_eq!(escape_markdown("DOG_COIN*[x]`"), "DOG\\_COIN\\*\\[x]\\`");
        assert_eq!(escape_markdown("plain"), "plain");
    }

    #[test]
    fn placeholders() {
        assert_eq!(or_placeholder("", "Unknown"), "Unknown");
        assert_eq!(or_placeholder("  ", "?"), "?");
        assert_eq!(or_placeholder("Cake", "?"), "Cake");
    }
}
