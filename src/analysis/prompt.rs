//! Prompt assembly for market commentary.

use std::fmt::Write as _;

use crate::news::NewsArticle;
use crate::quote::Quote;

pub(crate) const SYSTEM_PROMPT: &str = "You are a concise financial markets analyst. \
Reply with a JSON object with the fields \"summary\" (string), \"sentiment\" \
(bullish, bearish or neutral), \"key_factors\" (array of short strings) and \
\"risk_level\" (low, medium or high).";

/// Builds the user prompt from the latest quotes and headlines.
///
/// Every line is plain text; absent values never reach the prompt.
pub(crate) fn build_prompt(quotes: &[Quote], news: &[NewsArticle]) -> String {
    let mut out = String::from("Market snapshot:\n");
    if quotes.is_empty() {
        out.push_str("- no quotes available\n");
    }
    for q in quotes {
        let _ = writeln!(
            out,
            "- {}: {:.2} ({:+.2}%), high {:.2}, low {:.2}, volume {}",
            q.ticker, q.price, q.change_percent, q.high, q.low, q.volume
        );
    }

    out.push_str("\nHeadlines:\n");
    let lines: Vec<String> = news
        .iter()
        .map(NewsArticle::ai_context)
        .filter(|c| !c.is_empty())
        .collect();
    if lines.is_empty() {
        out.push_str("- no headlines available\n");
    }
    for line in lines {
        let _ = writeln!(out, "- {line}");
    }

    out.push_str("\nSummarize today's market in two or three sentences.");
    out
}
