//! Conversion of the previous kiosk server's `tickets.json`
//!
//! That format used numeric ids (`tickets.length + 1`), `name`/`email`
//! fields, free-text statuses and plain-string comments without timestamps.
//! Numeric ids become sequence numbers and every record gets a fresh UUID.

use crate::core::{Comment, Item, Status, Ticket, TicketBuilder};
use crate::error::{LostFoundError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct LegacyItem {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LegacyTicket {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    items: Vec<LegacyItem>,
    #[serde(default)]
    comments: Vec<Value>,
    #[serde(default)]
    status: Option<String>,
}

/// Result of converting a legacy file
#[derive(Debug, Default)]
pub struct LegacyImport {
    pub tickets: Vec<Ticket>,
    /// Records that could not be converted, with the reason
    pub skipped: Vec<String>,
    /// Records converted with a lossy substitution, such as an unknown status
    pub warnings: Vec<String>,
}

/// Convert legacy JSON into tickets stamped with `imported_at`
pub fn convert(content: &str, imported_at: DateTime<Utc>) -> Result<LegacyImport> {
    let records: Vec<LegacyTicket> = serde_json::from_str(content)
        .map_err(|e| LostFoundError::Validation(format!("Not a legacy ticket file: {e}")))?;

    let mut import = LegacyImport::default();
    for (position, record) in records.into_iter().enumerate() {
        let label = match &record.id {
            Value::Null => format!("record {}", position + 1),
            id => format!("legacy id {id}"),
        };
        match convert_record(record, imported_at, &label, &mut import.warnings) {
            Some(ticket) => import.tickets.push(ticket),
            None => {
                tracing::warn!(record = %label, "skipping legacy record without named items");
                import.skipped.push(format!("{label}: no named items"));
            },
        }
    }
    Ok(import)
}

fn convert_record(
    record: LegacyTicket,
    imported_at: DateTime<Utc>,
    label: &str,
    warnings: &mut Vec<String>,
) -> Option<Ticket> {
    let items: Vec<Item> = record
        .items
        .into_iter()
        .filter_map(|item| {
            let name = item.name.map(|n| n.trim().to_string())?;
            if name.is_empty() {
                return None;
            }
            let description = item
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty());
            Some(Item::new(name, description))
        })
        .collect();

    if items.is_empty() {
        return None;
    }

    let status = match record.status.as_deref().map(str::trim) {
        None | Some("") => Status::default(),
        Some(raw) => raw.parse::<Status>().unwrap_or_else(|_| {
            tracing::warn!(record = %label, status = raw, "unknown legacy status, importing as Submitted");
            warnings.push(format!(
                "{label}: unknown status \"{raw}\", imported as {}",
                Status::default()
            ));
            Status::default()
        }),
    };

    let mut builder = TicketBuilder::new()
        .items(items)
        .status(status)
        .created_at(imported_at);

    if let Some(sequence) = legacy_sequence(&record.id) {
        builder = builder.sequence_number(sequence);
    }
    if let Some(name) = record.name.filter(|n| !n.trim().is_empty()) {
        builder = builder.reporter_name(name.trim());
    }
    if let Some(email) = record.email.filter(|e| !e.trim().is_empty()) {
        builder = builder.contact(email.trim());
    }
    for text in record.comments.iter().filter_map(comment_text) {
        if let Ok(mut comment) = Comment::new(text) {
            comment.timestamp = imported_at;
            builder = builder.comment(comment);
        }
    }

    Some(builder.build())
}

fn legacy_sequence(id: &Value) -> Option<u64> {
    match id {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn comment_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("text").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY: &str = r#"[
        {
            "id": 1,
            "name": "Alice",
            "email": "alice@example.com",
            "items": [{"name": "Wallet", "description": "brown"}],
            "comments": ["checked lobby", ""],
            "status": "Located"
        },
        {"id": 2, "name": "Bob", "items": [], "comments": [], "status": "Submitted"},
        {"id": "3", "items": [{"name": "Keys", "description": ""}], "status": "Misplaced"}
    ]"#;

    #[test]
    fn test_convert_legacy_file() {
        let now = Utc::now();
        let import = convert(LEGACY, now).unwrap();

        assert_eq!(import.tickets.len(), 2);
        assert_eq!(import.skipped.len(), 1);
        assert_eq!(import.warnings.len(), 1);

        let alice = &import.tickets[0];
        assert_eq!(alice.sequence_number, Some(1));
        assert_eq!(alice.reporter_name.as_deref(), Some("Alice"));
        assert_eq!(alice.contact.as_deref(), Some("alice@example.com"));
        assert_eq!(alice.status, Status::Located);
        assert_eq!(alice.comments.len(), 1);
        assert_eq!(alice.comments[0].timestamp, now);

        let keys = &import.tickets[1];
        assert_eq!(keys.sequence_number, Some(3));
        assert_eq!(keys.status, Status::Submitted);
        assert_eq!(keys.items[0].description, None);
    }

    #[test]
    fn test_unknown_status_is_reported() {
        let import = convert(LEGACY, Utc::now()).unwrap();
        let warning = &import.warnings[0];
        assert!(warning.starts_with("legacy id \"3\""));
        assert!(warning.contains("Misplaced"));
        assert!(warning.contains("Submitted"));

        let clean = r#"[{"id": 7, "items": [{"name": "Hat"}], "status": "closed"}, {"id": 8, "items": [{"name": "Cap"}]}]"#;
        let import = convert(clean, Utc::now()).unwrap();
        assert!(import.warnings.is_empty());
        assert_eq!(import.tickets[0].status, Status::Closed);
        assert_eq!(import.tickets[1].status, Status::Submitted);
    }

    #[test]
    fn test_rejects_non_array() {
        assert!(matches!(
            convert("{\"tickets\": []}", Utc::now()),
            Err(LostFoundError::Validation(_))
        ));
    }
}
