//! Party link extraction from free-form chat text.

use fancy_regex::Regex;
use tracing::warn;

/// Literal prefix that marks a party link.
pub const LINK_MARKER: &str = "diep.io/#";

/// Finds party link codes in message text.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    pattern: Regex,
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkExtractor {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"diep\.io/#([0-9A-F]*)\s?").unwrap(),
        }
    }

    /// Return every candidate code in `text`, left to right.
    ///
    /// Duplicates are kept. A marker followed by no hex digits yields an
    /// empty candidate, which the validator later drops.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut codes = Vec::new();
        for caps in self.pattern.captures_iter(text) {
            match caps {
                Ok(caps) => {
                    let code = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                    codes.push(code.to_string());
                }
                Err(e) => {
                    warn!("Party link scan aborted: {}", e);
                    break;
                }
            }
        }
        codes
    }
}
