//! Parsing of provider replies into commit suggestions.
//!
//! Models wrap JSON in Markdown fences more often than not, so the parser
//! strips one fenced block if present and tries the remainder as JSON.
//! A reply that fails to parse is never an error: the raw text becomes the
//! commit message and no split is offered.

use regex_lite::Regex;
use tracing::debug;

use super::{GenerateOutcome, GenerateResponse};

/// Parse a raw provider reply into a structured response, if it is one.
///
/// Accepts bare JSON or JSON inside a ```/```json fence. Returns `None`
/// for anything that does not parse into the expected shape.
pub fn parse_generate_response(raw: &str) -> Option<GenerateResponse> {
    let trimmed = raw.trim();
    let candidate = extract_fenced(trimmed).unwrap_or(trimmed);

    match serde_json::from_str::<GenerateResponse>(candidate.trim()) {
        Ok(response) => Some(response),
        Err(e) => {
            debug!("Reply is not a structured commit response: {e}");
            None
        }
    }
}

/// Turn a raw provider reply into a usable outcome.
///
/// Unparseable replies degrade to a single-message outcome carrying the
/// trimmed raw text. A split is only reported when the reply both asks for
/// one and proposes more than one commit.
pub fn outcome_from_raw(raw: &str) -> GenerateOutcome {
    let Some(response) = parse_generate_response(raw) else {
        return GenerateOutcome {
            message: raw.trim().to_string(),
            split_suggested: false,
            commits: Vec::new(),
        };
    };

    for commit in &response.commits {
        debug!(
            files = commit.files.len(),
            "Suggested commit '{}': {}", commit.message, commit.reasoning
        );
    }

    if response.suggest_split && response.commits.len() > 1 {
        let message = response.commits[0].message.clone();
        return GenerateOutcome {
            message,
            split_suggested: true,
            commits: response.commits,
        };
    }

    let message = response
        .commits
        .first()
        .map(|c| c.message.clone())
        .unwrap_or_else(|| raw.trim().to_string());
    GenerateOutcome {
        message,
        split_suggested: false,
        commits: response.commits,
    }
}

/// Extract the body of the first fenced code block, with or without a
/// `json` language tag.
fn extract_fenced(text: &str) -> Option<&str> {
    let fence = Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("Invalid regex");
    fence.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}
