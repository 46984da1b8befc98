//! # Spreadsheet Export
//!
//! Projects sale records into a CSV document for the admin download.
//!
//! ```text
//! created_at,name,email,phone,cellphones,...,gamer,total_weight,plan,speed_mbps\r\n
//! 2026-03-01T12:00:00Z,Ana Souza,ana@example.com,'+55 11 99999-0000,2,...,true,4.20,Diamante,800\r\n
//! ```
//!
//! Quoting follows RFC 4180. Text cells that a spreadsheet would evaluate as a
//! formula (leading `=`, `+`, `-`, `@`) are prefixed with `'`.

use chrono::SecondsFormat;

use crate::plan::DeviceKind;
use crate::types::SaleRecord;

/// Column order of the export.
pub const CSV_HEADER: [&str; 13] = [
    "created_at",
    "name",
    "email",
    "phone",
    "cellphones",
    "computers",
    "smart_tvs",
    "tv_boxes",
    "others",
    "gamer",
    "total_weight",
    "plan",
    "speed_mbps",
];

const LINE_END: &str = "\r\n";

/// Renders records as CSV, in the order given.
pub fn sales_to_csv(records: &[SaleRecord]) -> Vec<u8> {
    let mut out = String::with_capacity(128 * (records.len() + 1));

    push_row(&mut out, CSV_HEADER.iter().map(|h| h.to_string()));

    for record in records {
        let mut row = Vec::with_capacity(CSV_HEADER.len());
        row.push(
            record
                .created_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        row.push(text_cell(&record.customer.name));
        row.push(text_cell(&record.customer.email));
        row.push(text_cell(&record.customer.phone));
        row.extend(
            DeviceKind::ALL
                .iter()
                .map(|&kind| record.inventory.count(kind).to_string()),
        );
        row.push(record.inventory.gamer.to_string());
        row.push(record.plan.total_weight.to_string());
        row.push(record.plan.plan.name().to_string());
        row.push(record.plan.speed_mbps.to_string());

        push_row(&mut out, row.into_iter());
    }

    out.into_bytes()
}

fn push_row(out: &mut String, cells: impl Iterator<Item = String>) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_quoted(out, &cell);
    }
    out.push_str(LINE_END);
}

/// Neutralizes formula triggers in user-entered text.
fn text_cell(value: &str) -> String {
    if value.starts_with(['=', '+', '-', '@']) {
        format!("'{value}")
    } else {
        value.to_string()
    }
}

fn push_quoted(out: &mut String, cell: &str) {
    if cell.contains([',', '"', '\r', '\n']) {
        out.push('"');
        out.push_str(&cell.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(cell);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
