//! Checkpoint table definitions
//!
//! Every table is a CSV file whose first record is a `NAME,count` line, whose
//! second record is the column header, and whose remaining records are rows.
//! Each row type has an explicit encoder and a strict decoder; only optional
//! text columns tolerate being empty.

use super::traits::{StorageError, StorageResult};
use crate::state::{ContentClass, LedgerEntry, Node};
use csv::StringRecord;

/// Layout of one persisted table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table {
    pub file_name: &'static str,
    pub count_name: &'static str,
    pub header: &'static [&'static str],
}

pub const ITEMS: Table = Table {
    file_name: "items.csv",
    count_name: "COUNT",
    header: &[
        "LEVEL",
        "TITLE",
        "URL",
        "REFERRER",
        "RESPONSE",
        "TRIGGER_ID",
        "PDF_EXPORT_LINK",
        "PROCESSED",
        "EXPANDED",
        "DATA_TYPE",
    ],
};

pub const DUPS: Table = Table {
    file_name: "dups.csv",
    count_name: "DUP_COUNT",
    header: &["URL", "TRIGGER_ID", "COUNT", "FRAGMENT_COUNT"],
};

pub const INVALIDS: Table = Table {
    file_name: "invalids.csv",
    count_name: "INVALID_COUNT",
    header: &["URL", "COUNT"],
};

pub const OUT_OF_SCOPE: Table = Table {
    file_name: "non_domain.csv",
    count_name: "NON_DOMAIN_COUNT",
    header: &["URL", "COUNT"],
};

pub const TIMEOUTS: Table = Table {
    file_name: "timeout.csv",
    count_name: "TIMEOUT_COUNT",
    header: &["URL", "COUNT"],
};

pub const ERRORS: Table = Table {
    file_name: "errors.csv",
    count_name: "ERROR_COUNT",
    header: &["URL", "COUNT"],
};

impl Table {
    pub fn is_header(&self, record: &StringRecord) -> bool {
        record.iter().eq(self.header.iter().copied())
    }

    fn malformed(&self, line: u64, reason: impl Into<String>) -> StorageError {
        StorageError::Malformed {
            table: self.file_name,
            line,
            reason: reason.into(),
        }
    }
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn optional(value: Option<&str>) -> &str {
    value.unwrap_or("")
}

/// Reads a column that may be empty
fn field_opt(record: &StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn field_required<'r>(
    table: &Table,
    record: &'r StringRecord,
    index: usize,
    line: u64,
) -> StorageResult<&'r str> {
    match record.get(index) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(table.malformed(line, format!("missing {}", table.header[index]))),
    }
}

fn parse_bool(table: &Table, value: &str, line: u64) -> StorageResult<bool> {
    match value {
        "True" | "true" => Ok(true),
        "False" | "false" => Ok(false),
        other => Err(table.malformed(line, format!("expected True/False, got '{}'", other))),
    }
}

fn parse_count(table: &Table, value: &str, line: u64) -> StorageResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| table.malformed(line, format!("expected a count, got '{}'", value)))
}

/// Parses the leading `NAME,count` line
///
/// Returns None when the record is not a well-formed count line.
pub fn parse_count_line(table: &Table, record: &StringRecord) -> Option<u64> {
    if record.get(0) != Some(table.count_name) {
        return None;
    }
    record.get(1).and_then(|value| value.trim().parse().ok())
}

pub fn encode_count_line(table: &Table, count: u64) -> [String; 2] {
    [table.count_name.to_string(), count.to_string()]
}

pub fn encode_node(node: &Node) -> [String; 10] {
    [
        node.level.to_string(),
        optional(node.title.as_deref()).to_string(),
        node.url.clone(),
        optional(node.referrer.as_deref()).to_string(),
        optional(node.response.as_deref()).to_string(),
        optional(node.trigger_id.as_deref()).to_string(),
        optional(node.pdf_export_link.as_deref()).to_string(),
        format_bool(node.processed).to_string(),
        format_bool(node.expanded).to_string(),
        node.content_class
            .map(|class| class.as_str())
            .unwrap_or("")
            .to_string(),
    ]
}

pub fn decode_node(record: &StringRecord, line: u64) -> StorageResult<Node> {
    let table = &ITEMS;
    let level = field_required(table, record, 0, line)?;
    let level = level
        .trim()
        .parse()
        .map_err(|_| table.malformed(line, format!("expected a level, got '{}'", level)))?;

    Ok(Node {
        level,
        title: field_opt(record, 1),
        url: field_required(table, record, 2, line)?.to_string(),
        referrer: field_opt(record, 3),
        response: field_opt(record, 4),
        trigger_id: field_opt(record, 5),
        pdf_export_link: field_opt(record, 6),
        processed: parse_bool(table, field_required(table, record, 7, line)?, line)?,
        expanded: parse_bool(table, field_required(table, record, 8, line)?, line)?,
        // Older tables have no DATA_TYPE column; unknown values are dropped
        content_class: field_opt(record, 9).and_then(|value| ContentClass::parse(&value)),
        dom_snapshot: None,
    })
}

pub fn encode_ledger_entry(
    url: &str,
    trigger_id: Option<&str>,
    entry: &LedgerEntry,
) -> [String; 4] {
    [
        url.to_string(),
        optional(trigger_id).to_string(),
        entry.revisit_count.to_string(),
        entry.fragment_revisit_count.to_string(),
    ]
}

pub fn decode_ledger_entry(
    record: &StringRecord,
    line: u64,
) -> StorageResult<(String, Option<String>, LedgerEntry)> {
    let table = &DUPS;
    let url = field_required(table, record, 0, line)?.to_string();
    let trigger_id = field_opt(record, 1);
    let revisit_count = parse_count(table, field_required(table, record, 2, line)?, line)?;
    let fragment_revisit_count = parse_count(table, field_required(table, record, 3, line)?, line)?;

    Ok((
        url,
        trigger_id,
        LedgerEntry {
            revisit_count,
            fragment_revisit_count,
        },
    ))
}

pub fn encode_url_count(url: &str, count: u64) -> [String; 2] {
    [url.to_string(), count.to_string()]
}

pub fn decode_url_count(table: &Table, record: &StringRecord, line: u64) -> StorageResult<(String, u64)> {
    let url = field_required(table, record, 0, line)?.to_string();
    let count = parse_count(table, field_required(table, record, 1, line)?, line)?;
    Ok((url, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn test_node_roundtrip() {
        let node = Node {
            level: 2,
            title: Some("Guide, part 1".to_string()),
            url: "https://example.com/guide".to_string(),
            referrer: Some("https://example.com".to_string()),
            response: Some("image".to_string()),
            trigger_id: None,
            pdf_export_link: None,
            content_class: Some(ContentClass::Attachment),
            processed: true,
            expanded: false,
            dom_snapshot: Some("<html/>".to_string()),
        };

        let encoded = encode_node(&node);
        let decoded = decode_node(&StringRecord::from(encoded.to_vec()), 3).unwrap();

        assert_eq!(decoded.dom_snapshot, None);
        assert_eq!(
            decoded,
            Node {
                dom_snapshot: None,
                ..node
            }
        );
    }

    #[test]
    fn test_node_without_data_type_column() {
        let row = record(&["0", "", "https://x.com", "", "", "", "", "False", "False"]);
        let node = decode_node(&row, 3).unwrap();
        assert_eq!(node.content_class, None);
        assert_eq!(node.title, None);
        assert!(!node.processed);
    }

    #[test]
    fn test_node_rejects_bad_bool() {
        let row = record(&["0", "", "https://x.com", "", "", "", "", "yes", "False", ""]);
        let err = decode_node(&row, 7).unwrap_err();
        assert!(matches!(err, StorageError::Malformed { line: 7, .. }));
    }

    #[test]
    fn test_node_rejects_missing_url() {
        let row = record(&["1", "", "", "", "", "", "", "True", "True", ""]);
        assert!(decode_node(&row, 4).is_err());
    }

    #[test]
    fn test_count_line() {
        assert_eq!(parse_count_line(&DUPS, &record(&["DUP_COUNT", "12"])), Some(12));
        assert_eq!(parse_count_line(&DUPS, &record(&["DUP_COUNT", "x"])), None);
        assert_eq!(parse_count_line(&DUPS, &record(&["COUNT", "12"])), None);
        assert_eq!(encode_count_line(&ERRORS, 4), ["ERROR_COUNT".to_string(), "4".to_string()]);
    }

    #[test]
    fn test_ledger_entry_roundtrip() {
        let entry = LedgerEntry {
            revisit_count: 3,
            fragment_revisit_count: 1,
        };
        let encoded = encode_ledger_entry("https://x.com/a", Some("tab"), &entry);
        let (url, trigger, decoded) =
            decode_ledger_entry(&StringRecord::from(encoded.to_vec()), 3).unwrap();
        assert_eq!(url, "https://x.com/a");
        assert_eq!(trigger.as_deref(), Some("tab"));
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_header_detection() {
        assert!(INVALIDS.is_header(&record(&["URL", "COUNT"])));
        assert!(!INVALIDS.is_header(&record(&["URL"])));
        assert!(!INVALIDS.is_header(&record(&["https://x.com", "1"])));
    }
}
