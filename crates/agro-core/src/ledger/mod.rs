//! Ledger collaborators: the read-only mirror node client and the
//! write-side interface.

pub mod mirror;
pub mod writer;

pub use mirror::{
    MirrorIndex, MirrorNodeClient, TopicInfo, TransactionSummary, TOPIC_CREATE_KIND,
    TOPIC_MESSAGE_KIND, VERIFY_TIMEOUT,
};
pub use writer::{LedgerWriter, UnconfiguredWriter};
