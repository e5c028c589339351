//! Notification payloads and HTML rendering
//!
//! One alert per logical occurrence. Rendering degrades with the resolved
//! metadata: the Seer link and market name appear only when resolution
//! succeeded, the Curate link falls back to the registry page when the item
//! is unknown. The transaction link is always present.

use crate::metadata::ResolvedMarket;
use alloy_primitives::B256;

/// Telegram rejects messages beyond 4096 chars; stay under with headroom
pub const MAX_MESSAGE_LENGTH: usize = 3900;

/// What kind of occurrence the alert describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// An item was submitted or a request was opened
    Submission,
    /// A request was challenged
    Dispute,
}

/// A notification ready for rendering
#[derive(Debug, Clone)]
pub struct Alert {
    pub kind: AlertKind,
    pub market: ResolvedMarket,
    pub tx_hash: B256,
    pub block_number: u64,
}

/// Deep-link bases for rendered messages
#[derive(Debug, Clone)]
pub struct MessageTemplates {
    /// Explorer transaction URL base, tx hash appended
    pub explorer_tx_url: String,
    /// Seer market URL base, market address appended
    pub seer_market_url: String,
    /// Full Curate URL of the watched registry, item ID appended when known
    pub curate_registry_url: String,
}

/// Render an alert as a Telegram HTML message
pub fn render(alert: &Alert, templates: &MessageTemplates) -> String {
    let mut lines = Vec::new();

    lines.push(
        match alert.kind {
            AlertKind::Submission => "A new market has been submitted for verification.",
            AlertKind::Dispute => "A market verification has been challenged.",
        }
        .to_string(),
    );

    if let Some(name) = &alert.market.market_name {
        lines.push(format!("Market: {}", escape_html(name)));
    }

    if let Some(address) = alert.market.market_address {
        lines.push(format!(
            "Seer: <a href=\"{}{}\">check here</a>",
            with_trailing_slash(&templates.seer_market_url),
            address
        ));
    }

    let curate_url = match alert.market.item_id {
        Some(item_id) => format!(
            "{}/{}",
            templates.curate_registry_url.trim_end_matches('/'),
            item_id
        ),
        None => templates.curate_registry_url.clone(),
    };
    lines.push(format!("Curate: <a href=\"{}\">check here</a>", curate_url));

    lines.push(format!(
        "Tx: <a href=\"{}{}\">block {}</a>",
        with_trailing_slash(&templates.explorer_tx_url),
        alert.tx_hash,
        alert.block_number
    ));

    truncate_message(lines.join("\n"))
}

fn with_trailing_slash(base: &str) -> String {
    format!("{}/", base.trim_end_matches('/'))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Truncate over-long messages on a char boundary, marking the cut
fn truncate_message(message: String) -> String {
    if message.len() <= MAX_MESSAGE_LENGTH {
        return message;
    }

    let mut end = MAX_MESSAGE_LENGTH;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n… (truncated)", &message[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    fn templates() -> MessageTemplates {
        MessageTemplates {
            explorer_tx_url: "https://gnosisscan.io/tx/".to_string(),
            seer_market_url: "https://app.seer.pm/markets/100".to_string(),
            curate_registry_url:
                "https://curate.kleros.io/tcr/100/0x5aAF9E23A11440f8C1Ad6D2E2e5109C7e52CC672"
                    .to_string(),
        }
    }

    fn market_address() -> Address {
        "0xAbcdabcdabcdabcdabcdabcdabcdabcdabcdabcd".parse().unwrap()
    }

    #[test]
    fn test_fully_resolved_submission_has_both_links_and_name() {
        let alert = Alert {
            kind: AlertKind::Submission,
            market: ResolvedMarket {
                item_id: Some(B256::repeat_byte(0x11)),
                market_address: Some(market_address()),
                market_name: Some("Will X happen?".to_string()),
            },
            tx_hash: B256::repeat_byte(0xaa),
            block_number: 42,
        };

        let message = render(&alert, &templates());

        assert!(message.contains("A new market has been submitted for verification."));
        assert!(message.contains("Will X happen?"));
        assert!(message.contains(&format!(
            "https://app.seer.pm/markets/100/{}",
            market_address()
        )));
        assert!(message.contains(&format!(
            "https://curate.kleros.io/tcr/100/0x5aAF9E23A11440f8C1Ad6D2E2e5109C7e52CC672/{}",
            B256::repeat_byte(0x11)
        )));
        assert!(message.contains(&format!("https://gnosisscan.io/tx/{}", B256::repeat_byte(0xaa))));
    }

    #[test]
    fn test_unresolved_submission_has_curate_link_only() {
        let alert = Alert {
            kind: AlertKind::Submission,
            market: ResolvedMarket {
                item_id: Some(B256::repeat_byte(0x11)),
                market_address: None,
                market_name: None,
            },
            tx_hash: B256::repeat_byte(0xaa),
            block_number: 42,
        };

        let message = render(&alert, &templates());

        assert!(!message.contains("Seer:"));
        assert!(!message.contains("Market:"));
        assert!(message.contains("Curate:"));
        assert!(message.contains("Tx:"));
    }

    #[test]
    fn test_uncorrelated_dispute_links_to_registry_page() {
        let alert = Alert {
            kind: AlertKind::Dispute,
            market: ResolvedMarket::default(),
            tx_hash: B256::repeat_byte(0xbb),
            block_number: 50,
        };

        let message = render(&alert, &templates());

        assert!(message.contains("A market verification has been challenged."));
        assert!(message.contains(
            "href=\"https://curate.kleros.io/tcr/100/0x5aAF9E23A11440f8C1Ad6D2E2e5109C7e52CC672\""
        ));
        assert!(!message.contains("Seer:"));
    }

    #[test]
    fn test_market_name_is_html_escaped() {
        let alert = Alert {
            kind: AlertKind::Submission,
            market: ResolvedMarket {
                item_id: Some(B256::repeat_byte(0x11)),
                market_address: None,
                market_name: Some("Will <X> & Y happen?".to_string()),
            },
            tx_hash: B256::ZERO,
            block_number: 1,
        };

        let message = render(&alert, &templates());

        assert!(message.contains("Will &lt;X&gt; &amp; Y happen?"));
        assert!(!message.contains("<X>"));
    }

    #[test]
    fn test_long_message_is_truncated() {
        let long = "x".repeat(MAX_MESSAGE_LENGTH + 100);
        let truncated = truncate_message(long);

        assert!(truncated.len() <= MAX_MESSAGE_LENGTH + "\n… (truncated)".len());
        assert!(truncated.ends_with("… (truncated)"));
    }

    #[test]
    fn test_short_message_is_untouched() {
        let message = "short".to_string();
        assert_eq!(truncate_message(message.clone()), message);
    }
}
