//! ============================================================================
//! Core Types for the AgroLedger Assistant
//! ============================================================================
//! Defines the data structures for topics, stored envelopes, classification
//! and query results. These types serialize to the same JSON shapes the
//! frontend and the ledger messages use.
//! ============================================================================

use serde::{Deserialize, Serialize};

/// Hedera account credentials, passed per request or taken from the
/// process-wide default pair. Never cached anywhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorCredentials {
    pub account_id: String,
    pub private_key: String,
}

/// A consensus topic associated with an account.
///
/// `is_current` is set for at most one topic per discovery result, and that
/// topic is always first in the returned ordering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub topic_id: String,
    pub memo: String,
    /// RFC 3339 creation timestamp (mirror node value, or discovery time for
    /// synthesized placeholders)
    pub created: String,
    #[serde(default)]
    pub is_created_by_you: bool,
    #[serde(default)]
    pub is_current: bool,
}

impl Topic {
    /// Minimal placeholder for a topic the mirror node could not describe
    pub fn placeholder(topic_id: &str) -> Self {
        Self {
            topic_id: topic_id.to_string(),
            memo: format!("Topic #{}", topic_id),
            created: now_rfc3339(),
            is_created_by_you: true,
            is_current: false,
        }
    }
}

/// A message retrieved from a topic: consensus timestamp plus the payload
/// already decoded from its base64 transport encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerMessage {
    pub timestamp: String,
    pub contents: String,
}

/// A structured farm activity record, as extracted by the completion model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FarmRecord {
    pub activity_type: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub crops: String,
    /// Activity date, YYYY-MM-DD
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Intent label for an incoming query.
///
/// Evaluation order is a behavioral contract: Help beats everything,
/// RecordCreation beats RecordAnalysis, and RecordAnalysis only applies when
/// decoded records are available in context. See `classify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Help,
    RecordCreation,
    RecordAnalysis,
    Generic,
}

/// Result of processing one query end-to-end.
///
/// Serialized field names match the JSON contract consumed by the frontend;
/// flags are omitted entirely when they were never set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedResult {
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_help: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_record_analysis: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_record: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_blockchain_storage: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_record: Option<FarmRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_in_blockchain: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_topic_available: Option<bool>,
}

impl ProcessedResult {
    pub fn with_answer(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            ..Self::default()
        }
    }
}

/// Error types for the assistant core
#[derive(Debug, thiserror::Error)]
pub enum AgroError {
    #[error("Missing required input: {0}")]
    MissingInput(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No topic has been established")]
    NoTopic,

    #[error("Mirror node unavailable: {0}")]
    MirrorUnavailable(String),

    #[error("Completion service unavailable: {0}")]
    CompletionUnavailable(String),

    #[error("Ledger submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Malformed payload: {0}")]
    Decode(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(&'static str),
}

impl AgroError {
    /// HTTP status an API front-end should answer with for this error.
    ///
    /// Completion and submission failures map to 503 so a client relying on
    /// `storedInBlockchain` never sees a false positive dressed as a 500.
    pub fn status_code(&self) -> u16 {
        match self {
            AgroError::MissingInput(_) | AgroError::InvalidInput(_) => 400,
            AgroError::NoTopic => 404,
            AgroError::CompletionUnavailable(_) | AgroError::SubmissionFailed(_) => 503,
            AgroError::MirrorUnavailable(_)
            | AgroError::Decode(_)
            | AgroError::MissingCredentials(_) => 500,
        }
    }
}

/// Current UTC time as an RFC 3339 millisecond timestamp
pub fn now_rfc3339() -> String {
    chrono::Utc::now()
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
