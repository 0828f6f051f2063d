//! ============================================================================
//! Record Codec - Envelope encoding/decoding for topic messages
//! ============================================================================
//! Every stored message is a JSON envelope tagged with a `type` field:
//! `farm_record` wraps a structured activity record, `farm_query` wraps a
//! raw query string. Decoding dispatches on the tag; messages written before
//! the tag existed are recognized by their payload field instead. Anything
//! else decodes to `Unrecognized` and is skipped by callers.
//! ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{now_rfc3339, FarmRecord};

pub const RECORD_TYPE: &str = "farm_record";
pub const QUERY_TYPE: &str = "farm_query";

/// Envelope around a structured activity record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordEnvelope {
    pub record: FarmRecord,
    pub timestamp: String,
}

/// Envelope around a persisted query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryLogEnvelope {
    pub query: String,
    pub timestamp: String,
}

/// One decoded topic message
#[derive(Debug, Clone, PartialEq)]
pub enum StoredEntry {
    Record(RecordEnvelope),
    Query(QueryLogEnvelope),
    Unrecognized,
}

impl StoredEntry {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, StoredEntry::Unrecognized)
    }
}

/// Decode a raw message payload. Never fails; malformed payloads come back
/// as `Unrecognized`.
pub fn decode(contents: &str) -> StoredEntry {
    let value: Value = match serde_json::from_str(contents) {
        Ok(value) => value,
        Err(_) => return StoredEntry::Unrecognized,
    };

    let tag = value.get("type").and_then(Value::as_str).map(str::to_string);
    match tag.as_deref() {
        Some(RECORD_TYPE) => serde_json::from_value(value)
            .map(StoredEntry::Record)
            .unwrap_or(StoredEntry::Unrecognized),
        Some(QUERY_TYPE) => serde_json::from_value(value)
            .map(StoredEntry::Query)
            .unwrap_or(StoredEntry::Unrecognized),
        // Messages written before the type tag carry only the payload field
        _ => {
            if value.get("record").is_some() {
                serde_json::from_value(value)
                    .map(StoredEntry::Record)
                    .unwrap_or(StoredEntry::Unrecognized)
            } else if value.get("query").is_some() {
                serde_json::from_value(value)
                    .map(StoredEntry::Query)
                    .unwrap_or(StoredEntry::Unrecognized)
            } else {
                StoredEntry::Unrecognized
            }
        }
    }
}

#[derive(Serialize)]
struct TaggedRecord<'a> {
    record: &'a FarmRecord,
    timestamp: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct TaggedQuery<'a> {
    query: &'a str,
    timestamp: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Encode a record into its canonical envelope with a server-assigned
/// timestamp.
pub fn encode_record(record: &FarmRecord) -> String {
    serde_json::to_string(&TaggedRecord {
        record,
        timestamp: now_rfc3339(),
        kind: RECORD_TYPE,
    })
    .expect("record envelope serializes")
}

/// Encode a query-log entry into its canonical envelope.
pub fn encode_query(query: &str) -> String {
    serde_json::to_string(&TaggedQuery {
        query,
        timestamp: now_rfc3339(),
        kind: QUERY_TYPE,
    })
    .expect("query envelope serializes")
}
