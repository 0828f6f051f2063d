//! ============================================================================
//! Assistant Service - End-to-end query processing
//! ============================================================================
//! Orchestrates one request at a time: classification, optional record
//! retrieval, prompt assembly, the completion call, reply interpretation and
//! the persistence decision. Each outbound hop runs sequentially; failures
//! degrade per stage except ledger submission, which always surfaces.
//! ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use tokio::time::timeout;
use tracing::{info, warn};

use crate::classify;
use crate::codec::{self, StoredEntry};
use crate::completion::CompletionBackend;
use crate::ledger::mirror::{MirrorIndex, VERIFY_TIMEOUT};
use crate::ledger::writer::LedgerWriter;
use crate::prompts;
use crate::reconcile::TopicReconciler;
use crate::types::{
    AgroError, FarmRecord, Intent, LedgerMessage, OperatorCredentials, ProcessedResult, Topic,
};

/// Messages fetched per topic when building analysis context
const MESSAGE_FETCH_LIMIT: u32 = 100;

/// Memo used when a topic is created without one
const DEFAULT_TOPIC_MEMO: &str = "AgroConsults";

/// One inbound query plus its per-request context. The topic is a snapshot
/// taken by the caller (see `TopicSession`); credentials pass through and
/// are never cached.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub query: String,
    pub topic_id: Option<String>,
    pub credentials: Option<OperatorCredentials>,
}

/// The assistant core consumed by front-ends
pub struct AgroService<C: CompletionBackend, W: LedgerWriter> {
    mirror: Arc<dyn MirrorIndex>,
    reconciler: TopicReconciler,
    completion: C,
    writer: W,
}

impl<C: CompletionBackend, W: LedgerWriter> AgroService<C, W> {
    pub fn new(
        mirror: Arc<dyn MirrorIndex>,
        fallback_topics: HashMap<String, String>,
        completion: C,
        writer: W,
    ) -> Self {
        let reconciler = TopicReconciler::new(mirror.clone(), fallback_topics);
        Self {
            mirror,
            reconciler,
            completion,
            writer,
        }
    }

    /// Validate credentials: format checks first, then an account lookup on
    /// the mirror node raced against the verification timeout.
    pub async fn verify_credentials(
        &self,
        account_id: &str,
        private_key: &str,
    ) -> Result<(), AgroError> {
        if account_id.trim().is_empty() {
            return Err(AgroError::MissingInput("accountId"));
        }
        if !is_entity_id(account_id) {
            return Err(AgroError::InvalidInput(format!(
                "Invalid account ID: {}",
                account_id
            )));
        }
        if private_key.trim().is_empty() {
            return Err(AgroError::MissingInput("privateKey"));
        }
        if !looks_like_private_key(private_key) {
            return Err(AgroError::InvalidInput(
                "Invalid private key format".to_string(),
            ));
        }

        match timeout(VERIFY_TIMEOUT, self.mirror.account_exists(account_id)).await {
            Ok(Ok(true)) => {
                info!("Credentials verified for account {}", account_id);
                Ok(())
            }
            Ok(Ok(false)) => Err(AgroError::InvalidInput(format!(
                "Unable to verify account {}",
                account_id
            ))),
            Ok(Err(e)) => Err(AgroError::MirrorUnavailable(e.to_string())),
            Err(_) => Err(AgroError::MirrorUnavailable("Connection timeout".to_string())),
        }
    }

    /// Topics linked to the account, current topic first. Never fails.
    pub async fn discover_topics(
        &self,
        account_id: &str,
        current_topic: Option<&str>,
    ) -> Vec<Topic> {
        self.reconciler.discover_topics(account_id, current_topic).await
    }

    /// Create a topic through the write client and return its identifier
    pub async fn create_topic(
        &self,
        memo: Option<&str>,
        credentials: Option<&OperatorCredentials>,
    ) -> Result<String, AgroError> {
        let memo = memo
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_TOPIC_MEMO);

        let topic_id = self
            .writer
            .create_topic(memo, credentials)
            .await
            .map_err(|e| AgroError::SubmissionFailed(e.to_string()))?;
        info!("Topic created with ID: {}", topic_id);
        Ok(topic_id)
    }

    /// Raw messages stored on a topic
    pub async fn list_records(
        &self,
        topic_id: &str,
        limit: u32,
    ) -> Result<Vec<LedgerMessage>, AgroError> {
        if topic_id.trim().is_empty() {
            return Err(AgroError::MissingInput("topicId"));
        }
        self.mirror
            .topic_messages(topic_id, limit)
            .await
            .map_err(|e| AgroError::MirrorUnavailable(e.to_string()))
    }

    /// Decoded record and query-log entries stored on a topic; unrecognized
    /// payloads are dropped.
    pub async fn list_entries(
        &self,
        topic_id: &str,
        limit: u32,
    ) -> Result<Vec<StoredEntry>, AgroError> {
        let messages = self.list_records(topic_id, limit).await?;
        Ok(messages
            .iter()
            .map(|m| codec::decode(&m.contents))
            .filter(StoredEntry::is_recognized)
            .collect())
    }

    /// Process one query end-to-end
    pub async fn process_query(
        &self,
        request: &QueryRequest,
    ) -> Result<ProcessedResult, AgroError> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(AgroError::MissingInput("query"));
        }

        // Help short-circuits everything else, including record retrieval
        if classify::classify(query, false) == Intent::Help {
            return Ok(help_result());
        }

        // Pull stored entries only when a topic is known and the query looks
        // like it targets them
        let mut entries: Vec<StoredEntry> = Vec::new();
        if let Some(topic_id) = &request.topic_id {
            if classify::is_analysis_query(query) {
                match self.mirror.topic_messages(topic_id, MESSAGE_FETCH_LIMIT).await {
                    Ok(messages) => {
                        entries = messages
                            .iter()
                            .map(|m| codec::decode(&m.contents))
                            .filter(StoredEntry::is_recognized)
                            .collect();
                        info!("{} entries retrieved for analysis", entries.len());
                    }
                    Err(e) => warn!("Failed to retrieve records for analysis: {}", e),
                }
            }
        }

        let has_records = !entries.is_empty();
        let mut result = match classify::classify(query, has_records) {
            Intent::Help => help_result(),
            Intent::RecordCreation => self.run_record_creation(query).await?,
            Intent::RecordAnalysis => self.run_record_analysis(query, &entries).await?,
            Intent::Generic => self.run_generic(query, has_records).await?,
        };

        self.apply_persistence(request, query, &mut result).await?;
        Ok(result)
    }

    async fn run_record_creation(&self, query: &str) -> Result<ProcessedResult, AgroError> {
        let instruction = prompts::record_creation_instruction(query);
        let reply = self.complete(&instruction, query).await?;
        let cleaned = prompts::strip_code_fences(&reply);

        Ok(match serde_json::from_str::<FarmRecord>(&cleaned) {
            Ok(record) => {
                let mut result =
                    ProcessedResult::with_answer(prompts::record_confirmation(&record));
                result.create_record = Some(true);
                result.formatted_record = Some(record);
                result
            }
            Err(e) => {
                warn!("Completion reply was not a parsable record: {}", e);
                let mut result = ProcessedResult::with_answer(prompts::RETRY_GUIDANCE);
                result.create_record = Some(false);
                result
            }
        })
    }

    async fn run_record_analysis(
        &self,
        query: &str,
        entries: &[StoredEntry],
    ) -> Result<ProcessedResult, AgroError> {
        let digest = prompts::format_entries(entries);
        let instruction = prompts::record_analysis_instruction(query, &digest);
        let answer = self.complete(&instruction, query).await?;

        let mut result = ProcessedResult::with_answer(answer);
        result.is_record_analysis = Some(true);
        Ok(result)
    }

    async fn run_generic(
        &self,
        query: &str,
        has_records: bool,
    ) -> Result<ProcessedResult, AgroError> {
        let instruction = prompts::generic_instruction(has_records);
        let answer = self.complete(&instruction, query).await?;

        let mut result = ProcessedResult::with_answer(answer);
        result.needs_blockchain_storage = Some(classify::needs_ledger_storage(query));
        Ok(result)
    }

    /// Persistence decision over (classification flags, topic availability).
    /// Submission failure surfaces; a missing topic is annotated, never an
    /// error.
    async fn apply_persistence(
        &self,
        request: &QueryRequest,
        query: &str,
        result: &mut ProcessedResult,
    ) -> Result<(), AgroError> {
        let create_record = result.create_record == Some(true);
        let store_query = result.needs_blockchain_storage == Some(true);

        match &request.topic_id {
            Some(topic_id) if create_record => {
                if let Some(record) = &result.formatted_record {
                    let payload = codec::encode_record(record);
                    self.submit(topic_id, &payload, request.credentials.as_ref())
                        .await?;
                    result.stored_in_blockchain = Some(true);
                    result.topic_id = Some(topic_id.clone());
                }
            }
            Some(topic_id) if store_query => {
                let payload = codec::encode_query(query);
                self.submit(topic_id, &payload, request.credentials.as_ref())
                    .await?;
                result.stored_in_blockchain = Some(true);
                result.topic_id = Some(topic_id.clone());
            }
            None if create_record || store_query => {
                result.no_topic_available = Some(true);
            }
            _ => {}
        }
        Ok(())
    }

    async fn submit(
        &self,
        topic_id: &str,
        payload: &str,
        credentials: Option<&OperatorCredentials>,
    ) -> Result<(), AgroError> {
        let status = self
            .writer
            .submit_message(topic_id, payload.as_bytes(), credentials)
            .await
            .map_err(|e| AgroError::SubmissionFailed(e.to_string()))?;
        info!("Message sent to topic {}, status: {}", topic_id, status);
        Ok(())
    }

    async fn complete(&self, instruction: &str, query: &str) -> Result<String, AgroError> {
        self.completion
            .complete(instruction, query)
            .await
            .map_err(|e| AgroError::CompletionUnavailable(e.to_string()))
    }
}

fn help_result() -> ProcessedResult {
    let mut result = ProcessedResult::with_answer(prompts::help_text());
    result.is_help = Some(true);
    result
}

/// Entity identifiers are `shard.realm.num` with numeric segments
pub fn is_entity_id(value: &str) -> bool {
    let mut segments = 0;
    for segment in value.split('.') {
        if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        segments += 1;
    }
    segments == 3
}

/// Hedera private keys arrive as hex, raw or DER-encoded, optionally
/// 0x-prefixed; anything shorter than a raw 32-byte key is rejected.
fn looks_like_private_key(key: &str) -> bool {
    let hex = key.strip_prefix("0x").unwrap_or(key);
    hex.len() >= 64 && hex.chars().all(|c| c.is_ascii_hexdigit())
}
