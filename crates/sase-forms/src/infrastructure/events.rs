//! Event publisher adapters

use async_trait::async_trait;
use tracing::info;

use crate::domain::events::DomainEvent;
use crate::ports::outbound::{EventPublisher, RepositoryError};

/// Writes each event to the log.
#[derive(Default)]
pub struct LoggingEventPublisher;

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), RepositoryError> {
        for event in &events {
            info!(event = event.name(), form_id = %event.form_id(), "domain event");
        }
        Ok(())
    }
}

/// No-op event publisher for testing
#[derive(Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish(&self, _events: Vec<DomainEvent>) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::FormSchema;

    #[tokio::test]
    async fn test_publishers_accept_events() {
        let mut form = FormSchema::create("Logged");
        form.rename("Renamed");
        let events = form.take_events();
        assert_eq!(events.len(), 2);

        LoggingEventPublisher.publish(events.clone()).await.unwrap();
        NoOpEventPublisher.publish(events).await.unwrap();
    }
}
