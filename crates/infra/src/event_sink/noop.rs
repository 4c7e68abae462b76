//! Noop イベント配信実装
//!
//! イベントを配信せず、ログ出力のみ行う。

use async_trait::async_trait;
use shoninflow_domain::event::WorkflowEvent;

use super::{EventSink, EventSinkError};

/// Noop イベント配信（ログ出力のみ）
#[derive(Debug, Clone, Default)]
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn publish(&self, event: &WorkflowEvent) -> Result<(), EventSinkError> {
        tracing::debug!(
            event_type = %event.event_type(),
            workflow_id = %event.workflow_id(),
            "Noop: イベント配信をスキップ"
        );
        Ok(())
    }
}
