//! Readiness gate between ingestion and queries.

use super::VectorIndex;
use crate::error::{ConceptMapError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};

enum GateState {
    Building,
    Ready { index: Arc<VectorIndex>, built_at: DateTime<Utc> },
    Failed(String),
}

/// Snapshot of the gate for health reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IndexStatus {
    Building,
    Ready {
        chunks: usize,
        dimensions: usize,
        built_at: DateTime<Utc>,
    },
    Failed {
        reason: String,
    },
}

/// Holds the index once ingestion has published it.
///
/// Moves from `Building` to either `Ready` or `Failed` exactly once.
pub struct IndexGate {
    state: RwLock<GateState>,
}

impl IndexGate {
    /// A gate whose index is still being built.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(GateState::Building),
        }
    }

    /// A gate that is ready immediately.
    pub fn ready_with(index: VectorIndex) -> Self {
        let gate = Self::new();
        *gate.state.write().unwrap_or_else(PoisonError::into_inner) = GateState::Ready {
            index: Arc::new(index),
            built_at: Utc::now(),
        };
        gate
    }

    /// Make a finished index available to queries.
    pub fn publish(&self, index: VectorIndex) -> Result<Arc<VectorIndex>> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !matches!(*state, GateState::Building) {
            return Err(ConceptMapError::Ingestion("Index was already finalized".to_string()));
        }
        let index = Arc::new(index);
        *state = GateState::Ready {
            index: index.clone(),
            built_at: Utc::now(),
        };
        Ok(index)
    }

    /// Record that ingestion failed; queries keep getting "not ready".
    pub fn fail(&self, reason: impl Into<String>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, GateState::Building) {
            *state = GateState::Failed(reason.into());
        }
    }

    /// The built index, or a not-ready error.
    pub fn ready(&self) -> Result<Arc<VectorIndex>> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            GateState::Ready { index, .. } => Ok(index.clone()),
            GateState::Building => Err(ConceptMapError::NotReady(
                "the document index is still being built, retry shortly".to_string(),
            )),
            GateState::Failed(reason) => Err(ConceptMapError::NotReady(format!(
                "document ingestion failed: {}",
                reason
            ))),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready().is_ok()
    }

    pub fn status(&self) -> IndexStatus {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            GateState::Building => IndexStatus::Building,
            GateState::Ready { index, built_at } => IndexStatus::Ready {
                chunks: index.len(),
                dimensions: index.dimensions(),
                built_at: *built_at,
            },
            GateState::Failed(reason) => IndexStatus::Failed {
                reason: reason.clone(),
            },
        }
    }
}

impl Default for IndexGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_index() -> VectorIndex {
        VectorIndex::from_vectors(Vec::new(), 4).unwrap()
    }

    #[test]
    fn test_not_ready_while_building() {
        let gate = IndexGate::new();
        assert!(matches!(gate.ready(), Err(ConceptMapError::NotReady(_))));
        assert_eq!(gate.status(), IndexStatus::Building);
    }

    #[test]
    fn test_publish_once() {
        let gate = IndexGate::new();
        gate.publish(empty_index()).unwrap();
        assert!(gate.is_ready());
        assert!(matches!(gate.status(), IndexStatus::Ready { chunks: 0, dimensions: 4, .. }));

        assert!(gate.publish(empty_index()).is_err());
        gate.fail("late failure");
        assert!(gate.is_ready());
    }

    #[test]
    fn test_failed_gate_stays_not_ready() {
        let gate = IndexGate::new();
        gate.fail("embedding quota exceeded");

        match gate.ready() {
            Err(ConceptMapError::NotReady(msg)) => assert!(msg.contains("embedding quota exceeded")),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(gate.publish(empty_index()).is_err());
    }

    #[test]
    fn test_status_serializes_with_state_tag() {
        let gate = IndexGate::new();
        gate.fail("boom");
        let json = serde_json::to_value(gate.status()).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["reason"], "boom");
    }
}
