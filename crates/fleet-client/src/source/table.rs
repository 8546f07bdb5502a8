// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tolerant HTML table extraction for the portal positions page.
//!
//! Scans locally within the first matching `<table>` block rather than
//! parsing the whole document, tolerating attribute noise, mixed tag case,
//! and whitespace. Header rows (`<th>` cells) are dropped; data rows come
//! back as plain text cells with tags stripped and common entities decoded.
//!
//! Testable offline against fixture strings; no selector library involved.

/// Case-insensitive substring search starting at a byte offset.
fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || from >= hay.len() {
        return None;
    }
    let last = hay.len().checked_sub(needle.len())?;
    (from..=last).find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Remove everything between `<` and `>`, inclusive.
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Decode the handful of entities the portal actually emits.
fn decode_entities(input: &str) -> String {
    input
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Collapse runs of whitespace into single spaces and trim.
fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn cell_text(raw: &str) -> String {
    normalize_whitespace(&decode_entities(&strip_tags(raw)))
}

/// Locate the target `<table>` block: the first one whose opening tag
/// contains `marker` (an id/class fragment), or simply the first table when
/// no marker is given. Returns the inner HTML of the table.
fn table_block<'a>(html: &'a str, marker: Option<&str>) -> Option<&'a str> {
    let mut pos = 0;
    loop {
        let start = find_ci(html, "<table", pos)?;
        let open_end = html[start..].find('>').map(|i| start + i)?;
        let open_tag = &html[start..=open_end];

        let matches = marker.is_none_or(|m| find_ci(open_tag, m, 0).is_some());
        if matches {
            let body_start = open_end + 1;
            let end = find_ci(html, "</table", body_start).unwrap_or(html.len());
            return Some(&html[body_start..end]);
        }

        pos = open_end + 1;
    }
}

/// Extract the next cell (`<td>` or `<th>`) at or after `from`.
///
/// Returns the cell text, whether it was a header cell, and the offset to
/// continue scanning from.
fn next_cell(row: &str, from: usize) -> Option<(String, bool, usize)> {
    let td = find_ci(row, "<td", from);
    let th = find_ci(row, "<th", from);

    let (start, is_header) = match (td, th) {
        (Some(t), Some(h)) if h < t => (h, true),
        (Some(t), _) => (t, false),
        (None, Some(h)) => (h, true),
        (None, None) => return None,
    };

    let open_end = row[start..].find('>').map(|i| start + i)?;
    let content_start = open_end + 1;
    let close = if is_header {
        find_ci(row, "</th", content_start)
    } else {
        find_ci(row, "</td", content_start)
    };
    // Unclosed cell: read up to the next cell or the end of the row.
    let content_end = close
        .or_else(|| find_ci(row, "<td", content_start))
        .or_else(|| find_ci(row, "<th", content_start))
        .unwrap_or(row.len());

    Some((
        cell_text(&row[content_start..content_end]),
        is_header,
        content_end,
    ))
}

/// Extract data rows from the positions table in `html`.
///
/// Returns `None` when no matching table exists (the page layout changed or
/// the portal served something unexpected); the caller decides how to
/// classify that. Header rows are dropped, data rows come back in document
/// order as normalized text cells.
pub fn extract_table_rows(html: &str, marker: Option<&str>) -> Option<Vec<Vec<String>>> {
    let table = table_block(html, marker)?;

    let mut rows = Vec::new();
    let mut pos = 0;
    while let Some(tr_start) = find_ci(table, "<tr", pos) {
        let open_end = match table[tr_start..].find('>') {
            Some(i) => tr_start + i,
            None => break,
        };
        let row_start = open_end + 1;
        let row_end = find_ci(table, "</tr", row_start)
            .or_else(|| find_ci(table, "<tr", row_start))
            .unwrap_or(table.len());
        let row = &table[row_start..row_end];

        let mut cells = Vec::new();
        let mut header_cells = 0usize;
        let mut cursor = 0;
        while let Some((text, is_header, next)) = next_cell(row, cursor) {
            if is_header {
                header_cells += 1;
            }
            cells.push(text);
            cursor = next;
        }

        // A row of <th> cells is a header, not data.
        if !cells.is_empty() && header_cells < cells.len() {
            rows.push(cells);
        }

        pos = row_end;
    }

    Some(rows)
}
