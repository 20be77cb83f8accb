//! Event sink adapters

use crate::events::GovernanceEvent;
use crate::ports::GovernanceEventSink;
use async_trait::async_trait;
use tracing::info;

/// In-memory event sink adapter for testing
#[derive(Default)]
pub struct InMemoryEventSink {
    events: parking_lot::RwLock<Vec<GovernanceEvent>>,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_events(&self) -> Vec<GovernanceEvent> {
        self.events.read().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.read().len()
    }
}

#[async_trait]
impl GovernanceEventSink for InMemoryEventSink {
    async fn publish(&self, event: GovernanceEvent) -> Result<(), String> {
        self.events.write().push(event);
        Ok(())
    }
}

/// Writes every event to the log
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingEventSink;

#[async_trait]
impl GovernanceEventSink for LoggingEventSink {
    async fn publish(&self, event: GovernanceEvent) -> Result<(), String> {
        match &event {
            GovernanceEvent::Decided {
                proposal, outcome, ..
            } => info!(event = event.name(), proposal = %proposal, outcome = %outcome, "Proposal decided"),
            other => info!(event = other.name(), detail = ?other, "Governance event"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MemberId, ProposalKey};

    #[tokio::test]
    async fn test_in_memory_event_sink() {
        let sink = InMemoryEventSink::new();

        let result = sink
            .publish(GovernanceEvent::DraftCreated {
                proposal: ProposalKey::generate(),
                author: MemberId::generate(),
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(sink.event_count(), 1);
        assert_eq!(sink.get_events()[0].name(), "draft_created");
    }

    #[tokio::test]
    async fn test_logging_sink_never_fails() {
        let sink = LoggingEventSink;
        let result = sink
            .publish(GovernanceEvent::Edited {
                proposal: ProposalKey::generate(),
            })
            .await;
        assert!(result.is_ok());
    }
}
