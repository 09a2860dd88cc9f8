//! Event handler trait and its tri-state outcome.

use crate::context::EventContext;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// What a handler did with the event. Recorded for logging; the dispatcher
/// does not use it to suppress sibling observer handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Handled the event.
    Done,
    /// Looked at the event and declined it.
    Skip,
    /// Handled the event and nothing further should be sent.
    Stop,
}

/// A handler bound to a trigger (command, pattern, action payload) or
/// registered as a generic observer for an event kind.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, ctx: &Arc<EventContext>) -> Result<Outcome>;
}
