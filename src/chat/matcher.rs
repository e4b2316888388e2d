//! First-match-wins intent lookup over a response table.

use super::Panel;
use super::responses::ResponseTable;

/// Outcome of matching one input against the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intent<'a> {
    pub reply: &'a str,
    pub signal: Option<Panel>,
    /// Index of the matched rule; `None` for the fallback.
    pub rule: Option<usize>,
}

/// Scan rules in declaration order and return the first whose triggers
/// match the trimmed input. No match yields the fallback with no signal.
/// Callers suppress blank input before calling.
#[must_use]
pub fn match_intent<'a>(table: &'a ResponseTable, input: &str) -> Intent<'a> {
    let input = input.trim();
    table
        .rules
        .iter()
        .enumerate()
        .find(|(_, rule)| rule.matches(input))
        .map_or(Intent { reply: &table.fallback, signal: None, rule: None }, |(i, rule)| Intent {
            reply: &rule.reply,
            signal: rule.signal,
            rule: Some(i),
        })
}

#[cfg(test)]
#[path = "matcher_test.rs"]
mod tests;
