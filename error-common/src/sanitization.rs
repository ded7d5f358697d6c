// Sanitization utilities
// This module strips credentials from text before it is logged or echoed

mod patterns {
    #![allow(clippy::unwrap_used)]

    use lazy_static::lazy_static;
    use regex::Regex;

    lazy_static! {
        pub static ref QUERY_KEY: Regex =
            Regex::new(r"(?i)([?&](?:key|access_token|api_key)=)[^&\s\x22']+").unwrap();
        pub static ref BEARER: Regex = Regex::new(r"(?i)(bearer\s+)[A-Za-z0-9\-\._~\+/]+=*").unwrap();
        pub static ref GOOGLE_KEY: Regex = Regex::new(r"AIza[0-9A-Za-z\-_]{20,}").unwrap();
    }
}

use patterns::{BEARER, GOOGLE_KEY, QUERY_KEY};

/// Placeholder written over redacted material
pub const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone, Default)]
pub struct DataSanitizer;

impl DataSanitizer {
    pub fn new() -> Self {
        Self
    }

    /// Remove API keys and bearer tokens from free text
    pub fn sanitize_for_logging(&self, data: &str) -> String {
        let stripped = QUERY_KEY.replace_all(data, format!("${{1}}{REDACTED}").as_str());
        let stripped = BEARER.replace_all(&stripped, format!("${{1}}{REDACTED}").as_str());
        GOOGLE_KEY.replace_all(&stripped, REDACTED).into_owned()
    }
}

/// Truncate to at most `max_chars` characters, respecting char boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text.get(..byte_index).unwrap_or(text),
        None => text,
    }
}
