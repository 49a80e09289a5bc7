//! Parser for the comma-separated output es prints with `-csv`
//!
//! The first non-blank record is the header; every later record becomes one
//! [`ResultRecord`] keyed by the header's column names. Quoted fields may
//! contain commas, doubled quotes and line breaks.

use super::types::{FieldValue, ResultRecord, ResultSet};
use tracing::warn;

/// The only column that receives integer coercion
pub const SIZE_COLUMN: &str = "Size";

/// Parse es CSV output into records.
///
/// Blank input, or a header without data rows, is an empty result set.
/// Rows shorter than the header are padded with empty text; surplus
/// trailing fields are discarded. Both are logged.
pub fn parse_csv(output: &str) -> ResultSet {
    let output = output.trim();
    if output.is_empty() {
        return ResultSet::new();
    }

    let mut records = split_records(output).into_iter();

    let header = match records.next() {
        Some(header) => header,
        None => return ResultSet::new(),
    };

    let mut results = ResultSet::new();
    for (index, mut fields) in records.enumerate() {
        let row = index + 1;
        if fields.len() < header.len() {
            warn!(
                "Row {} has {} fields, header has {}; padding with empty values",
                row,
                fields.len(),
                header.len()
            );
            fields.resize(header.len(), String::new());
        } else if fields.len() > header.len() {
            warn!(
                "Row {} has {} fields, header has {}; discarding the extra fields",
                row,
                fields.len(),
                header.len()
            );
            fields.truncate(header.len());
        }

        let mut record = ResultRecord::new();
        for (column, value) in header.iter().zip(fields) {
            record.insert(column.clone(), coerce(column, value));
        }
        results.push(record);
    }

    results
}

fn coerce(column: &str, value: String) -> FieldValue {
    if column == SIZE_COLUMN && !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = value.parse::<u64>() {
            return FieldValue::Integer(n);
        }
    }
    FieldValue::Text(value)
}

/// Split text into records of fields, honouring double-quote escaping.
///
/// Empty lines produce no record; a line holding only `""` is a record with
/// one empty field.
fn split_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                quoted = true;
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\r' | '\n' => {
                end_record(&mut records, &mut record, &mut field, &mut quoted);
            }
            _ => field.push(c),
        }
    }

    end_record(&mut records, &mut record, &mut field, &mut quoted);
    records
}

fn end_record(
    records: &mut Vec<Vec<String>>,
    record: &mut Vec<String>,
    field: &mut String,
    quoted: &mut bool,
) {
    let empty_line = record.is_empty() && field.is_empty() && !*quoted;
    record.push(std::mem::take(field));
    let record = std::mem::take(record);
    if !empty_line {
        records.push(record);
    }
    *quoted = false;
}
