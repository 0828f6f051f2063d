//! ============================================================================
//! Ledger Writer - Write-side collaborator interface
//! ============================================================================
//! Topic creation and message submission go through the Hedera network
//! client, which lives outside this crate. The trait is the contract the
//! service consumes; front-ends wire in a real network client, tests use
//! capturing fakes, and `UnconfiguredWriter` stands in when no client is
//! available so write attempts fail loudly instead of faking success.
//! ============================================================================

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::types::OperatorCredentials;

/// Write operations against the consensus service. Credentials are supplied
/// per call; `None` means the implementation's process-wide default pair.
#[async_trait]
pub trait LedgerWriter: Send + Sync {
    /// Create a topic with the given memo, returning its identifier
    async fn create_topic(
        &self,
        memo: &str,
        credentials: Option<&OperatorCredentials>,
    ) -> Result<String>;

    /// Submit a message payload to a topic, returning the delivery status
    async fn submit_message(
        &self,
        topic_id: &str,
        payload: &[u8],
        credentials: Option<&OperatorCredentials>,
    ) -> Result<String>;
}

/// Placeholder writer for deployments without a wired network client.
/// Every call fails with a configuration message.
pub struct UnconfiguredWriter;

#[async_trait]
impl LedgerWriter for UnconfiguredWriter {
    async fn create_topic(
        &self,
        _memo: &str,
        _credentials: Option<&OperatorCredentials>,
    ) -> Result<String> {
        bail!("No ledger write client configured")
    }

    async fn submit_message(
        &self,
        _topic_id: &str,
        _payload: &[u8],
        _credentials: Option<&OperatorCredentials>,
    ) -> Result<String> {
        bail!("No ledger write client configured")
    }
}
