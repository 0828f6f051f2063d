//! ============================================================================
//! Topic Reconciliation Engine - Best-effort topic discovery
//! ============================================================================
//! The ledger has no authoritative "topics owned by account" index, so
//! ownership is reconstructed from transaction history in staged fallback
//! probes, each stage running only when the previous one found nothing:
//!
//! 1. Broad transaction scan: collect entity ids from topic-creation and
//!    message-submission transactions.
//! 2. Narrow scan filtered to the topic-creation kind.
//! 3. Configured legacy fallback mapping, verified by an existence probe.
//!
//! Collected ids are deduplicated in insertion order, enriched with topic
//! detail (degrading to placeholders per topic), and the caller-supplied
//! current topic is surfaced first. The engine never fails the caller.
//! ============================================================================

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::ledger::mirror::{
    MirrorIndex, TOPIC_CREATE_KIND, TOPIC_MESSAGE_KIND, VERIFY_TIMEOUT,
};
use crate::types::{now_rfc3339, Topic};

/// Page size for the broad transaction scan
const BROAD_SCAN_LIMIT: u32 = 100;

/// Page size for the creation-filtered scan
const CREATION_SCAN_LIMIT: u32 = 25;

/// Discovers the topics an account plausibly owns or has used
pub struct TopicReconciler {
    mirror: Arc<dyn MirrorIndex>,
    /// Account -> topic compatibility mapping for accounts that predate
    /// transaction-based discovery
    fallback_topics: HashMap<String, String>,
}

impl TopicReconciler {
    pub fn new(mirror: Arc<dyn MirrorIndex>, fallback_topics: HashMap<String, String>) -> Self {
        Self {
            mirror,
            fallback_topics,
        }
    }

    /// Discover the topics linked to `account_id`.
    ///
    /// Never returns an error: probe failures degrade to partial results,
    /// and total failure yields the empty list (or the single current-topic
    /// placeholder when one was supplied). When `current_topic` is given it
    /// is always first in the result and flagged `is_current`, whether or
    /// not it was independently discovered.
    pub async fn discover_topics(
        &self,
        account_id: &str,
        current_topic: Option<&str>,
    ) -> Vec<Topic> {
        info!("Searching for topics linked to account {}", account_id);

        let topic_ids = self.collect_topic_ids(account_id).await;
        info!(
            "Identified {} topics related to account {}",
            topic_ids.len(),
            account_id
        );

        let mut topics = Vec::with_capacity(topic_ids.len());
        for topic_id in &topic_ids {
            topics.push(self.describe_topic(topic_id).await);
        }

        if let Some(current) = current_topic {
            match topics.iter().position(|t| t.topic_id == current) {
                Some(position) => {
                    // Independently discovered: keep its detail, surface first
                    let mut topic = topics.remove(position);
                    topic.is_current = true;
                    topics.insert(0, topic);
                }
                None => {
                    topics.insert(0, self.describe_current_topic(current).await);
                }
            }
        }

        topics
    }

    /// Staged probes, early-exiting once any stage yields data. Returns the
    /// deduplicated ids in first-seen order.
    async fn collect_topic_ids(&self, account_id: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();

        // Stage 1: broad transaction scan
        match self
            .mirror
            .account_transactions(account_id, BROAD_SCAN_LIMIT)
            .await
        {
            Ok(transactions) => {
                debug!("Broad scan returned {} transactions", transactions.len());
                for tx in transactions {
                    if tx.name == TOPIC_CREATE_KIND || tx.name == TOPIC_MESSAGE_KIND {
                        if let Some(entity_id) = tx.entity_id {
                            if seen.insert(entity_id.clone()) {
                                ordered.push(entity_id);
                            }
                        }
                    }
                }
            }
            Err(e) => warn!("Broad transaction scan failed: {}", e),
        }

        // Stage 2: narrow scan, creation transactions only
        if ordered.is_empty() {
            match self
                .mirror
                .topic_creation_transactions(account_id, CREATION_SCAN_LIMIT)
                .await
            {
                Ok(transactions) => {
                    debug!(
                        "Creation-filtered scan returned {} transactions",
                        transactions.len()
                    );
                    for tx in transactions {
                        if let Some(entity_id) = tx.entity_id {
                            if seen.insert(entity_id.clone()) {
                                ordered.push(entity_id);
                            }
                        }
                    }
                }
                Err(e) => warn!("Creation-filtered scan failed: {}", e),
            }
        }

        // Stage 3: configured legacy fallback, verified before use
        if ordered.is_empty() {
            if let Some(fallback) = self.fallback_topics.get(account_id) {
                debug!("Checking fallback topic {} for {}", fallback, account_id);
                match timeout(VERIFY_TIMEOUT, self.mirror.topic_exists(fallback)).await {
                    Ok(Ok(true)) => {
                        if seen.insert(fallback.clone()) {
                            ordered.push(fallback.clone());
                        }
                    }
                    Ok(Ok(false)) => debug!("Fallback topic {} not found", fallback),
                    Ok(Err(e)) => warn!("Fallback topic check failed: {}", e),
                    Err(_) => warn!("Fallback topic check timed out"),
                }
            }
        }

        ordered
    }

    /// Enrich one discovered id with topic detail, degrading to a
    /// placeholder on failure.
    async fn describe_topic(&self, topic_id: &str) -> Topic {
        match self.mirror.topic_info(topic_id).await {
            Ok(info) => Topic {
                topic_id: topic_id.to_string(),
                memo: info
                    .memo
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| format!("Topic #{}", topic_id)),
                created: info.created_timestamp.unwrap_or_else(now_rfc3339),
                is_created_by_you: true,
                is_current: false,
            },
            Err(e) => {
                warn!("Failed to fetch detail for topic {}: {}", topic_id, e);
                Topic::placeholder(topic_id)
            }
        }
    }

    /// Describe the caller-supplied current topic when discovery did not
    /// surface it on its own.
    async fn describe_current_topic(&self, topic_id: &str) -> Topic {
        let (memo, created) = match self.mirror.topic_info(topic_id).await {
            Ok(info) => (
                info.memo.filter(|m| !m.is_empty()),
                info.created_timestamp,
            ),
            Err(e) => {
                warn!("Failed to fetch detail for current topic {}: {}", topic_id, e);
                (None, None)
            }
        };

        Topic {
            topic_id: topic_id.to_string(),
            memo: memo.unwrap_or_else(|| "Current Topic".to_string()),
            created: created.unwrap_or_else(now_rfc3339),
            is_created_by_you: false,
            is_current: true,
        }
    }
}
