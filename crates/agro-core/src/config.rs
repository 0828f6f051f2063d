//! ============================================================================
//! Configuration - Environment-backed settings
//! ============================================================================
//! All settings come from the environment (a `.env` file is loaded by the
//! binary before this runs). Nothing here performs network calls.
//! ============================================================================

use std::collections::HashMap;

use crate::types::OperatorCredentials;

/// Default mirror node for the Hedera testnet
pub const DEFAULT_MIRROR_URL: &str = "https://testnet.mirrornode.hedera.com";

/// Default completion model on OpenRouter
pub const DEFAULT_COMPLETION_MODEL: &str = "gryphe/mythomax-l2-13b";

/// Legacy account that predates transaction-based topic discovery. Its topic
/// is only reachable through the fallback mapping.
const LEGACY_FALLBACK: (&str, &str) = ("0.0.5171369", "0.0.5637147");

/// Process-wide configuration
#[derive(Debug, Clone)]
pub struct AgroConfig {
    /// Mirror node REST base URL
    pub mirror_base_url: String,
    /// Default operator credentials for ledger writes, if configured
    pub operator: Option<OperatorCredentials>,
    /// Bearer credential for the completion endpoint
    pub openrouter_api_key: Option<String>,
    /// Completion model identifier
    pub completion_model: String,
    /// Account -> topic fallback mapping checked when transaction scanning
    /// finds nothing (compatibility shim, see `reconcile`)
    pub fallback_topics: HashMap<String, String>,
}

impl AgroConfig {
    /// Read configuration from the environment.
    ///
    /// `AGRO_FALLBACK_TOPICS` accepts comma-separated `account=topic` pairs
    /// and replaces the built-in legacy mapping when set.
    pub fn from_env() -> Self {
        let operator = match (
            std::env::var("HEDERA_ACCOUNT_ID").ok(),
            std::env::var("HEDERA_PRIVATE_KEY").ok(),
        ) {
            (Some(account_id), Some(private_key)) => Some(OperatorCredentials {
                account_id,
                private_key,
            }),
            _ => None,
        };

        Self {
            mirror_base_url: std::env::var("HEDERA_MIRROR_URL")
                .unwrap_or_else(|_| DEFAULT_MIRROR_URL.to_string()),
            operator,
            openrouter_api_key: std::env::var("OPENROUTER_API_KEY").ok(),
            completion_model: std::env::var("AGRO_COMPLETION_MODEL")
                .unwrap_or_else(|_| DEFAULT_COMPLETION_MODEL.to_string()),
            fallback_topics: std::env::var("AGRO_FALLBACK_TOPICS")
                .map(|raw| parse_fallback_topics(&raw))
                .unwrap_or_else(|_| default_fallback_topics()),
        }
    }
}

impl Default for AgroConfig {
    fn default() -> Self {
        Self {
            mirror_base_url: DEFAULT_MIRROR_URL.to_string(),
            operator: None,
            openrouter_api_key: None,
            completion_model: DEFAULT_COMPLETION_MODEL.to_string(),
            fallback_topics: default_fallback_topics(),
        }
    }
}

fn default_fallback_topics() -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert(LEGACY_FALLBACK.0.to_string(), LEGACY_FALLBACK.1.to_string());
    map
}

fn parse_fallback_topics(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (account, topic) = pair.split_once('=')?;
            let account = account.trim();
            let topic = topic.trim();
            if account.is_empty() || topic.is_empty() {
                return None;
            }
            Some((account.to_string(), topic.to_string()))
        })
        .collect()
}
