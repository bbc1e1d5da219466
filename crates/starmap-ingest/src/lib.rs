//! Name extraction for starmap imports.
//!
//! Turns raw text or CSV content into candidate system rows:
//! - plain text: one system name per line
//! - CSV: `name[, category][, x, y, z]`
//!
//! Design constraints:
//! - Imports come from user-picked files, so malformed rows are never an
//!   error. Bad rows are skipped and partial input yields partial results.
//! - This crate only extracts. Category-id minting, label composition and
//!   dedup-by-identity all happen at the catalog layer.

use regex::Regex;
use std::sync::OnceLock;

/// One parsed CSV row.
///
/// `coords` is present iff columns 2..=4 all parsed as finite numbers, in
/// which case the row is pre-resolved and exempt from external lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    pub name: String,
    pub category: Option<String>,
    pub coords: Option<[f64; 3]>,
}

fn header_cell_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(name|system|system\s*name)$").unwrap())
}

/// Parse a plain newline-delimited name list.
///
/// Lines are trimmed, empties dropped, and duplicates removed preserving the
/// first occurrence. Identity is case-sensitive at this stage; the catalog
/// applies its own case-insensitive dedup on merge.
pub fn parse_names(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_string()))
        .map(str::to_string)
        .collect()
}

/// Split one CSV row into cells.
///
/// A separator counts only when it is followed by an even number of `"`
/// characters up to the end of the row, so separators inside matched
/// double-quote pairs are ignored. `,` is the default; a row with no comma
/// falls back to `;`.
pub fn split_row(row: &str) -> Vec<String> {
    let sep = if row.contains(',') {
        ','
    } else if row.contains(';') {
        ';'
    } else {
        ','
    };

    // Quote parity from each position to end of row, computed right to left.
    let bytes = row.as_bytes();
    let mut even_quotes_after = vec![true; bytes.len() + 1];
    let mut even = true;
    for i in (0..bytes.len()).rev() {
        if bytes[i] == b'"' {
            even = !even;
        }
        even_quotes_after[i] = even;
    }

    let mut cells = Vec::new();
    let mut start = 0;
    for (i, ch) in row.char_indices() {
        if ch == sep && even_quotes_after[i + ch.len_utf8()] {
            cells.push(row[start..i].to_string());
            start = i + ch.len_utf8();
        }
    }
    cells.push(row[start..].to_string());
    cells
}

/// Strip surrounding quotes from a cell.
///
/// Supports `"…"` with doubled-quote escaping and bare `'…'`. The result is
/// trimmed on both sides.
pub fn strip_quotes(cell: &str) -> String {
    let s = cell.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        return s[1..s.len() - 1].replace("\"\"", "\"").trim().to_string();
    }
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        return s[1..s.len() - 1].trim().to_string();
    }
    s.to_string()
}

fn is_header_row(cells: &[String]) -> bool {
    cells
        .first()
        .map(|c| header_cell_re().is_match(&strip_quotes(c)))
        .unwrap_or(false)
}

/// Parse CSV content into rows.
///
/// The first line is treated as a header and skipped iff its first cell
/// case-insensitively matches `name`, `system` or `system name`. Rows with
/// an empty name are dropped. Column 1, when present and non-empty, is a
/// free-text category label. Columns 2..=4, when all three parse as finite
/// numbers, are literal x,y,z coordinates.
pub fn parse_csv(text: &str) -> Vec<CsvRow> {
    let mut rows = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let raw = line.trim();
        if raw.is_empty() {
            continue;
        }
        let cells = split_row(raw);
        if i == 0 && is_header_row(&cells) {
            continue;
        }
        let name = strip_quotes(cells.first().map(String::as_str).unwrap_or(""));
        if name.is_empty() {
            continue;
        }

        let category = cells
            .get(1)
            .map(|c| strip_quotes(c))
            .filter(|c| !c.is_empty());

        let coords = parse_coord_cells(&cells);

        rows.push(CsvRow {
            name,
            category,
            coords,
        });
    }
    rows
}

fn parse_coord_cells(cells: &[String]) -> Option<[f64; 3]> {
    if cells.len() < 5 {
        return None;
    }
    let x = strip_quotes(&cells[2]).parse::<f64>().ok()?;
    let y = strip_quotes(&cells[3]).parse::<f64>().ok()?;
    let z = strip_quotes(&cells[4]).parse::<f64>().ok()?;
    if x.is_finite() && y.is_finite() && z.is_finite() {
        Some([x, y, z])
    } else {
        None
    }
}

/// Extract just the name column from CSV content, deduped preserving first
/// occurrence.
pub fn csv_names(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    parse_csv(text)
        .into_iter()
        .map(|r| r.name)
        .filter(|n| seen.insert(n.clone()))
        .collect()
}

/// Dispatch on file extension: `.csv` goes through the CSV path, everything
/// else is treated as a plain name list.
pub fn extract_names(filename: &str, text: &str) -> Vec<String> {
    if filename.to_lowercase().ends_with(".csv") {
        csv_names(text)
    } else {
        parse_names(text)
    }
}
