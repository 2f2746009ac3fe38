//! Line scanner extracting `-- name: <key>` tagged blocks.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Tag line: optional whitespace, `--`, optional whitespace, `name:`, then the key.
static TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*--\s*name:\s*(\S+)").expect("tag pattern compiles"));

/// Returns the key named by a tag line, or `None` for any other line.
pub fn tag_name(line: &str) -> Option<&str> {
    TAG_REGEX
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the first tag; lines are discarded.
    Seeking,
    /// Appending body lines to the current key.
    Collecting,
}

/// Per-parse scanner state. Never shared between parses.
#[derive(Debug)]
pub struct QueryScanner {
    state: State,
    current: String,
    queries: HashMap<String, String>,
}

impl Default for QueryScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryScanner {
    pub fn new() -> Self {
        Self {
            state: State::Seeking,
            current: String::new(),
            queries: HashMap::new(),
        }
    }

    /// Feed one line (without its terminator).
    pub fn push_line(&mut self, line: &str) {
        if let Some(tag) = tag_name(line) {
            self.current.clear();
            self.current.push_str(tag);
            self.queries.entry(self.current.clone()).or_default();
            self.state = State::Collecting;
            return;
        }

        if self.state == State::Collecting {
            self.append(line);
        }
    }

    fn append(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        let body = self.queries.entry(self.current.clone()).or_default();
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str(line);
    }

    /// Consume the scanner and return the collected blocks.
    pub fn finish(self) -> HashMap<String, String> {
        self.queries
    }
}

/// Parse a whole document in one pass.
pub fn parse_queries(input: &str) -> HashMap<String, String> {
    let mut scanner = QueryScanner::new();
    for line in input.lines() {
        scanner.push_line(line);
    }
    scanner.finish()
}
