//! Shared "current topic" store.
//!
//! The active topic is a single process-wide value with last-write-wins
//! semantics. Callers take one `snapshot()` at the start of a request and
//! work against that value; a concurrent `set` does not retroactively change
//! a request already in flight.

use std::sync::RwLock;

use tracing::info;

use crate::types::AgroError;

/// Guarded single-writer store for the active topic
#[derive(Debug, Default)]
pub struct TopicSession {
    current: RwLock<Option<String>>,
}

impl TopicSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active topic
    pub fn set(&self, topic_id: impl Into<String>) {
        let topic_id = topic_id.into();
        info!("Topic set: {}", topic_id);
        *self.current.write().expect("topic session lock poisoned") = Some(topic_id);
    }

    /// Clear the active topic
    pub fn clear(&self) {
        *self.current.write().expect("topic session lock poisoned") = None;
    }

    /// Snapshot of the active topic for one request
    pub fn snapshot(&self) -> Option<String> {
        self.current
            .read()
            .expect("topic session lock poisoned")
            .clone()
    }

    /// Snapshot, or the not-established error when no topic is set
    pub fn require(&self) -> Result<String, AgroError> {
        self.snapshot().ok_or(AgroError::NoTopic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_none_until_set() {
        let session = TopicSession::new();
        assert_eq!(session.snapshot(), None);

        session.set("0.0.111");
        assert_eq!(session.snapshot(), Some("0.0.111".to_string()));
    }

    #[test]
    fn last_write_wins() {
        let session = TopicSession::new();
        session.set("0.0.111");
        session.set("0.0.222");
        assert_eq!(session.snapshot(), Some("0.0.222".to_string()));
    }

    #[test]
    fn snapshot_survives_later_writes() {
        let session = TopicSession::new();
        session.set("0.0.111");
        let snapshot = session.snapshot();
        session.set("0.0.222");
        assert_eq!(snapshot, Some("0.0.111".to_string()));
    }

    #[test]
    fn clear_resets_to_none() {
        let session = TopicSession::new();
        session.set("0.0.111");
        session.clear();
        assert_eq!(session.snapshot(), None);
    }

    #[test]
    fn require_maps_unset_topic_to_not_established() {
        let session = TopicSession::new();
        let err = session.require().unwrap_err();
        assert!(matches!(err, AgroError::NoTopic));
        assert_eq!(err.status_code(), 404);

        session.set("0.0.111");
        assert_eq!(session.require().unwrap(), "0.0.111");
    }
}
