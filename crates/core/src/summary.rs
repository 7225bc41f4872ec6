//! Summarization prompt and response extraction.
//!
//! The summarizer returns free text. In the default mode the first fenced
//! ```` ```json ```` block is extracted and parsed; in structured mode the
//! provider was asked for a bare JSON object and the whole text must parse.
//! Either way a failure yields `None`, never an error.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::error::Result;
use crate::report::ReportAggregate;

/// First fenced JSON block, non-greedy so a second block is never swallowed.
static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)[ \t]*\r?\n(.*?)```").expect("invalid fenced JSON pattern")
});

/// Fixed instruction sent ahead of the aggregate.
pub const SUMMARY_INSTRUCTIONS: &str = "You are a web analytics assistant. \
Analyze the session and event data below and respond with a single JSON object \
inside a ```json fenced block, with exactly these keys:
- \"pageViews\": { \"total\": number, \"unique\": number }
- \"conversionFunnel\": array of { \"step\": string, \"count\": number, \"dropOffRate\": number }
- \"topPages\": array of { \"path\": string, \"views\": number }
- \"userPersonas\": array of { \"name\": string, \"description\": string, \"share\": number }
- \"summary\": string
- \"recommendations\": array of strings
Do not include any other keys. Do not add commentary outside the JSON.";

/// How the summarizer's text is turned into JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryFormat {
    /// Free text containing one fenced JSON block
    #[default]
    Fenced,
    /// The whole response is a JSON object
    Structured,
}

/// Build the prompt for one aggregate.
pub fn build_prompt(aggregate: &ReportAggregate) -> Result<String> {
    let data = serde_json::to_string(aggregate)?;
    Ok(format!("{}\n\nData:\n{}", SUMMARY_INSTRUCTIONS, data))
}

/// Extract the summary object from summarizer output.
pub fn extract_summary(text: &str, format: SummaryFormat) -> Option<Value> {
    match format {
        SummaryFormat::Fenced => extract_fenced_json(text),
        SummaryFormat::Structured => parse_object(text.trim()),
    }
}

/// Parse the first ```` ```json ```` block in `text`.
pub fn extract_fenced_json(text: &str) -> Option<Value> {
    let captures = FENCED_JSON.captures(text)?;
    parse_object(captures.get(1)?.as_str().trim())
}

fn parse_object(candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(value) if value.is_object() => Some(value),
        _ => None,
    }
}
