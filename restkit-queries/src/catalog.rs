use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::QueryError;
use crate::parser::{parse_queries, QueryScanner};

/// Read-only lookup of named queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryCatalog {
    queries: HashMap<String, String>,
}

impl QueryCatalog {
    /// Build a catalog from an in-memory document.
    pub fn parse(input: &str) -> Self {
        Self {
            queries: parse_queries(input),
        }
    }

    /// Build a catalog by scanning `reader` line by line.
    ///
    /// Lines are split on raw `\n` bytes and decoded lossily, so bytes that
    /// are not valid UTF-8 end up as U+FFFD instead of failing the load.
    pub fn from_reader<R: BufRead>(mut reader: R) -> Result<Self, QueryError> {
        let mut scanner = QueryScanner::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            scanner.push_line(&String::from_utf8_lossy(line));
        }
        Ok(Self {
            queries: scanner.finish(),
        })
    }

    /// Load a catalog from a query file on disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, QueryError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| QueryError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_reader(BufReader::new(file)).map_err(|e| match e {
            QueryError::Io(source) => QueryError::ReadFile {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        debug!(path = %path.display(), queries = catalog.len(), "loaded query catalog");
        Ok(catalog)
    }

    /// Fold another catalog in. Entries from `other` replace same-named ones.
    pub fn merge(&mut self, other: QueryCatalog) {
        self.queries.extend(other.queries);
    }

    /// The query text registered under `name`.
    ///
    /// A name tagged with no body yields `Some("")`; an unknown name yields `None`.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.queries.get(name).map(String::as_str)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.queries.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// All query names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.queries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.queries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "-- name: version\nselect 1;\n-- name: count\nselect count(*) from t;\n";

    #[test]
    fn lookup_hits_and_misses() {
        let catalog = QueryCatalog::parse(DOC);
        assert_eq!(catalog.get("version"), Some("select 1;"));
        assert_eq!(catalog.get("count"), Some("select count(*) from t;"));
        assert_eq!(catalog.get("nonexistent"), None);
        assert!(catalog.contains("count"));
        assert_eq!(catalog.names(), vec!["count", "version"]);
    }

    #[test]
    fn empty_query_is_distinct_from_missing() {
        let catalog = QueryCatalog::parse("-- name: blank\n\n");
        assert_eq!(catalog.get("blank"), Some(""));
        assert_eq!(catalog.get("other"), None);
    }

    #[test]
    fn reader_matches_in_memory_parse() {
        let from_reader = QueryCatalog::from_reader(DOC.as_bytes()).unwrap();
        assert_eq!(from_reader, QueryCatalog::parse(DOC));
    }

    #[test]
    fn merge_prefers_later_definitions() {
        let mut catalog = QueryCatalog::parse(DOC);
        catalog.merge(QueryCatalog::parse("-- name: version\nselect sqlite_version();"));
        assert_eq!(catalog.get("version"), Some("select sqlite_version();"));
        assert_eq!(catalog.len(), 2);
    }
}
