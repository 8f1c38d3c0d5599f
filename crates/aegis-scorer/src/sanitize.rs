//! Markdown fence stripping.
//!
//! Generators routinely wrap code in markdown fences. Stripping the
//! wrapper is the only permitted transformation before scanning; the
//! content between the fences is never altered.

use regex::Regex;

/// Removes a leading ```` ```lang ```` line and a trailing ```` ``` ````
/// fence from a code string.
#[derive(Clone, Debug)]
pub struct CodeSanitizer {
    start_fence: Regex,
    end_fence: Regex,
}

impl CodeSanitizer {
    pub fn new() -> Self {
        Self {
            // Anchored to the very start/end so interior fences survive.
            start_fence: Regex::new(r"\A```[A-Za-z]*\r?\n").expect("static fence pattern"),
            end_fence: Regex::new(r"\r?\n```\z").expect("static fence pattern"),
        }
    }

    pub fn sanitize(&self, code: &str) -> String {
        if code.is_empty() {
            return String::new();
        }
        let trimmed = code.trim();
        let stripped = self.start_fence.replace(trimmed, "");
        let stripped = self.end_fence.replace(&stripped, "");
        stripped.trim().to_string()
    }
}

impl Default for CodeSanitizer {
    fn default() -> Self {
        Self::new()
    }
}
