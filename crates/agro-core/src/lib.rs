//! ============================================================================
//! AGRO-CORE: Farm Assistant Backend
//! ============================================================================
//! This crate handles all backend logic for the AgroLedger assistant:
//! - Topic reconciliation against the Hedera mirror node
//! - Intent classification and prompt assembly for the completion endpoint
//! - Envelope codec for records stored on consensus topics
//! - Persistence decisions over the ledger write client
//! ============================================================================

pub mod classify;
pub mod codec;
pub mod completion;
pub mod config;
pub mod ledger;
pub mod prompts;
pub mod reconcile;
pub mod service;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use codec::StoredEntry;
pub use completion::{CompletionBackend, OpenRouterClient};
pub use config::AgroConfig;
pub use ledger::{LedgerWriter, MirrorIndex, MirrorNodeClient, UnconfiguredWriter};
pub use reconcile::TopicReconciler;
pub use service::{AgroService, QueryRequest};
pub use session::TopicSession;
pub use types::*;
