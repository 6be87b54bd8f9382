use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Raw tabular input: cleaned, de-duplicated headers and string cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawFrame {
    /// Builds a frame, cleaning headers and padding short rows to the header width.
    pub fn new<H, S>(headers: impl IntoIterator<Item = H>, rows: Vec<Vec<S>>) -> Self
    where
        H: AsRef<str>,
        S: Into<String>,
    {
        let headers = dedupe_headers(headers.into_iter().map(|h| clean_header(h.as_ref())));
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|row| {
                let mut cells: Vec<String> = row.into_iter().map(Into::into).collect();
                cells.resize(width, String::new());
                cells
            })
            .collect();

        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First column, left to right, whose header contains `keyword`.
    pub fn find_column(&self, keyword: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|candidate| candidate.contains(keyword))
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
    }

    /// Keeps only the rows for which `keep` returns true.
    pub fn retain_rows<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&[String]) -> bool,
    {
        Self {
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep(row))
                .cloned()
                .collect(),
        }
    }
}

/// Removes whitespace, line breaks and invisible marks that exporters scatter in headers.
pub(crate) fn clean_header(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_whitespace() && !matches!(ch, '\u{feff}' | '\u{200b}'))
        .collect()
}

/// Suffixes repeated headers `_1`, `_2`, ... in order of appearance, skipping any
/// suffixed name another column already uses.
pub(crate) fn dedupe_headers(headers: impl IntoIterator<Item = String>) -> Vec<String> {
    let headers: Vec<String> = headers.into_iter().collect();
    let original: HashSet<String> = headers.iter().cloned().collect();
    let mut taken: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut counters: HashMap<String, usize> = HashMap::new();

    headers
        .into_iter()
        .map(|header| {
            if taken.insert(header.clone()) {
                return header;
            }
            let count = counters.entry(header.clone()).or_insert(0);
            loop {
                *count += 1;
                let candidate = format!("{header}_{count}");
                if !original.contains(&candidate) && taken.insert(candidate.clone()) {
                    return candidate;
                }
            }
        })
        .collect()
}
