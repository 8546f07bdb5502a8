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

//! Terminal rendering for the fleet-status table.

use fleet_client::FleetStatusRow;

/// Shown when no pings have been received yet.
pub const EMPTY_PLACEHOLDER: &str = "No aircraft pings received yet.";

/// Marker prefixed to rows inside the freshness window.
const FRESH_MARKER: &str = "*";

const HEADERS: [&str; 3] = ["Tail Number", "Hangar", "Last Seen"];

/// Format the fleet view as an aligned text table.
///
/// Fresh rows carry a leading `*` marker; the row order is whatever the
/// caller rendered (fresh first, tail-number tie-break).
#[must_use]
pub fn format_table(rows: &[FleetStatusRow]) -> String {
    if rows.is_empty() {
        return EMPTY_PLACEHOLDER.to_string();
    }

    let mut widths = [HEADERS[0].len(), HEADERS[1].len(), HEADERS[2].len()];
    for row in rows {
        widths[0] = widths[0].max(row.tail_number.len());
        widths[1] = widths[1].max(row.hangar.len());
        widths[2] = widths[2].max(row.last_seen_display.len());
    }

    let mut out = String::new();
    out.push_str(&format!(
        "  {:<w0$}  {:<w1$}  {:<w2$}\n",
        HEADERS[0],
        HEADERS[1],
        HEADERS[2],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
    ));
    out.push_str(&format!(
        "  {}  {}  {}\n",
        "-".repeat(widths[0]),
        "-".repeat(widths[1]),
        "-".repeat(widths[2]),
    ));

    for row in rows {
        let marker = if row.is_fresh { FRESH_MARKER } else { " " };
        out.push_str(&format!(
            "{marker} {:<w0$}  {:<w1$}  {:<w2$}\n",
            row.tail_number,
            row.hangar,
            row.last_seen_display,
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tail: &str, hangar: &str, display: &str, fresh: bool) -> FleetStatusRow {
        FleetStatusRow {
            tail_number: tail.to_string(),
            hangar: hangar.to_string(),
            last_seen_display: display.to_string(),
            is_fresh: fresh,
        }
    }

    #[test]
    fn test_empty_rows_show_placeholder() {
        assert_eq!(format_table(&[]), EMPTY_PLACEHOLDER);
    }

    #[test]
    fn test_fresh_rows_are_marked() {
        let rows = vec![
            row("C-GABC", "Palmer Hanger 2", "NOW", true),
            row("C-GXYZ", "McCall Hanger (663847)", "2025-06-01 09:15:00 UTC", false),
        ];
        let table = format_table(&rows);
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[2].starts_with("* C-GABC"));
        assert!(lines[3].starts_with("  C-GXYZ"));
    }

    #[test]
    fn test_columns_align_to_widest_value() {
        let rows = vec![
            row("C-GABC", "Palmer Hanger 2", "NOW", true),
            row("C-GXYZ", "McCall Hanger (663847)", "NOW", true),
        ];
        let table = format_table(&rows);
        let lines: Vec<&str> = table.lines().collect();

        let now_col = lines[2].find("NOW").unwrap();
        assert_eq!(lines[3].find("NOW").unwrap(), now_col);
    }
}
