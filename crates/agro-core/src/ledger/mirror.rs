//! ============================================================================
//! Mirror Node Client - Read-only Hedera REST queries
//! ============================================================================
//! Wraps the mirror node REST API used for topic discovery and message
//! retrieval:
//! - transaction listings by account (optionally filtered by kind)
//! - topic detail and existence probes
//! - topic messages (consensus timestamp + base64 payload)
//! - account lookup for credential verification
//! ============================================================================

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::types::LedgerMessage;

/// Transaction kind submitted when a topic is created
pub const TOPIC_CREATE_KIND: &str = "CONSENSUSCREATETOPIC";

/// Transaction kind submitted when a message is sent to a topic
pub const TOPIC_MESSAGE_KIND: &str = "CONSENSUSSUBMITMESSAGE";

/// Timeout raced against any single verification call
pub const VERIFY_TIMEOUT: Duration = Duration::from_secs(15);

/// One entry from a mirror node transaction listing
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionSummary {
    pub name: String,
    #[serde(default)]
    pub entity_id: Option<String>,
}

/// Topic detail from the mirror node
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopicInfo {
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub created_timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    #[serde(default)]
    transactions: Vec<TransactionSummary>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<MirrorMessage>,
}

#[derive(Debug, Deserialize)]
struct MirrorMessage {
    consensus_timestamp: String,
    message: String,
}

/// Read-only index queries consumed by the reconciliation engine and the
/// record listing paths. Implemented by `MirrorNodeClient`; tests substitute
/// fakes.
#[async_trait]
pub trait MirrorIndex: Send + Sync {
    /// Recent transactions involving the account, newest first
    async fn account_transactions(
        &self,
        account_id: &str,
        limit: u32,
    ) -> Result<Vec<TransactionSummary>>;

    /// Transactions narrowed to the topic-creation kind
    async fn topic_creation_transactions(
        &self,
        account_id: &str,
        limit: u32,
    ) -> Result<Vec<TransactionSummary>>;

    /// Topic detail (memo, creation timestamp)
    async fn topic_info(&self, topic_id: &str) -> Result<TopicInfo>;

    /// Whether the topic exists on the ledger
    async fn topic_exists(&self, topic_id: &str) -> Result<bool>;

    /// Messages submitted to a topic, payloads transport-decoded
    async fn topic_messages(&self, topic_id: &str, limit: u32) -> Result<Vec<LedgerMessage>>;

    /// Whether the account exists on the ledger
    async fn account_exists(&self, account_id: &str) -> Result<bool>;
}

/// REST client against one mirror node base URL
pub struct MirrorNodeClient {
    client: reqwest::Client,
    base_url: String,
}

impl MirrorNodeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("Mirror query: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("Mirror node request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Mirror node error {}: {}", status, body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| anyhow!("Failed to parse mirror node response: {}", e))
    }

    /// Existence probe: success is true, 4xx is false, transport failure is
    /// an error.
    async fn probe(&self, url: &str) -> Result<bool> {
        debug!("Mirror probe: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("Mirror node request failed: {}", e))?;

        Ok(response.status().is_success())
    }
}

#[async_trait]
impl MirrorIndex for MirrorNodeClient {
    async fn account_transactions(
        &self,
        account_id: &str,
        limit: u32,
    ) -> Result<Vec<TransactionSummary>> {
        let url = format!(
            "{}/api/v1/transactions?account.id={}&limit={}",
            self.base_url, account_id, limit
        );
        let response: TransactionsResponse = self.get_json(&url).await?;
        Ok(response.transactions)
    }

    async fn topic_creation_transactions(
        &self,
        account_id: &str,
        limit: u32,
    ) -> Result<Vec<TransactionSummary>> {
        let url = format!(
            "{}/api/v1/transactions?account.id={}&type=consensuscreatetopic&limit={}",
            self.base_url, account_id, limit
        );
        let response: TransactionsResponse = self.get_json(&url).await?;
        Ok(response.transactions)
    }

    async fn topic_info(&self, topic_id: &str) -> Result<TopicInfo> {
        let url = format!("{}/api/v1/topics/{}", self.base_url, topic_id);
        self.get_json(&url).await
    }

    async fn topic_exists(&self, topic_id: &str) -> Result<bool> {
        let url = format!("{}/api/v1/topics/{}", self.base_url, topic_id);
        self.probe(&url).await
    }

    async fn topic_messages(&self, topic_id: &str, limit: u32) -> Result<Vec<LedgerMessage>> {
        let url = format!(
            "{}/api/v1/topics/{}/messages?limit={}",
            self.base_url, topic_id, limit
        );
        let response: MessagesResponse = self.get_json(&url).await?;
        Ok(response
            .messages
            .into_iter()
            .map(|m| LedgerMessage {
                timestamp: m.consensus_timestamp,
                contents: decode_payload(&m.message),
            })
            .collect())
    }

    async fn account_exists(&self, account_id: &str) -> Result<bool> {
        let url = format!("{}/api/v1/accounts/{}", self.base_url, account_id);
        self.probe(&url).await
    }
}

/// Decode a base64 transport payload into text. Payloads that are not valid
/// base64 are passed through untouched; invalid UTF-8 is replaced lossily.
fn decode_payload(encoded: &str) -> String {
    match BASE64.decode(encoded) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => encoded.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = MirrorNodeClient::new("https://testnet.mirrornode.hedera.com///");
        assert_eq!(client.base_url(), "https://testnet.mirrornode.hedera.com");
    }

    #[test]
    fn decodes_base64_payload() {
        let encoded = BASE64.encode(r#"{"query":"hola","type":"farm_query"}"#);
        assert_eq!(decode_payload(&encoded), r#"{"query":"hola","type":"farm_query"}"#);
    }

    #[test]
    fn non_base64_payload_passes_through() {
        assert_eq!(decode_payload("!!not-base64!!"), "!!not-base64!!");
    }

    #[test]
    fn parses_transaction_listing() {
        let raw = r#"{
            "transactions": [
                {"name": "CONSENSUSCREATETOPIC", "entity_id": "0.0.111"},
                {"name": "CRYPTOTRANSFER", "entity_id": null},
                {"name": "CONSENSUSSUBMITMESSAGE", "entity_id": "0.0.222"}
            ]
        }"#;
        let parsed: TransactionsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.transactions.len(), 3);
        assert_eq!(parsed.transactions[0].name, TOPIC_CREATE_KIND);
        assert_eq!(parsed.transactions[0].entity_id.as_deref(), Some("0.0.111"));
        assert_eq!(parsed.transactions[1].entity_id, None);
    }

    #[test]
    fn parses_empty_listing_without_transactions_field() {
        let parsed: TransactionsResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.transactions.is_empty());
    }

    #[test]
    fn parses_message_listing() {
        let raw = r#"{
            "messages": [
                {"consensus_timestamp": "1700000000.000000001", "message": "eyJxIjoxfQ=="}
            ]
        }"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.messages.len(), 1);
        assert_eq!(decode_payload(&parsed.messages[0].message), r#"{"q":1}"#);
    }
}
