//! # middleware-chain
//!
//! Runs an ordered list of async interceptors over one event context. Each
//! interceptor receives the context and a [`Next`] continuation; invoking the
//! continuation runs the remainder of the chain, dropping it short-circuits
//! every later interceptor for that event. Errors anywhere in the chain are
//! trapped centrally and routed to a single optional [`ErrorHandler`].

pub mod logging;

pub use logging::LoggingMiddleware;

use async_trait::async_trait;
use mbot_core::{EventContext, MbotError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// One interceptor in the chain.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Runs this stage. Call `next.run(ctx)` to continue downstream; dropping
    /// `next` without running it ends processing of this event here.
    async fn handle(&self, ctx: &Arc<EventContext>, next: Next) -> Result<()>;
}

/// Global per-event error sink. Receiving the error consumes it; the chain
/// reports success to the caller afterward.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn handle(&self, ctx: &Arc<EventContext>, error: &MbotError);
}

/// Continuation over the remaining chain. Cloneable; a shared cursor makes
/// re-running a stage that already started a no-op, so invoking a clone twice
/// cannot execute downstream interceptors twice.
#[derive(Clone)]
pub struct Next {
    stack: Arc<Vec<Arc<dyn Middleware>>>,
    index: usize,
    cursor: Arc<AtomicUsize>,
}

impl Next {
    pub async fn run(self, ctx: &Arc<EventContext>) -> Result<()> {
        if self.cursor.fetch_max(self.index + 1, Ordering::SeqCst) > self.index {
            debug!(index = self.index, "step: proceed re-invoked, skipping");
            return Ok(());
        }
        match self.stack.get(self.index).cloned() {
            Some(mw) => {
                let next = Next {
                    stack: self.stack.clone(),
                    index: self.index + 1,
                    cursor: self.cursor,
                };
                mw.handle(ctx, next).await
            }
            // Past the last stage; nothing left to run.
            None => Ok(()),
        }
    }
}

/// Ordered chain of interceptors with centralized error trapping.
#[derive(Clone, Default)]
pub struct Chain {
    stack: Vec<Arc<dyn Middleware>>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
}

impl Chain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interceptor (runs in registration order).
    pub fn add(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.stack.push(middleware);
        self
    }

    /// Registers the global error handler for this chain.
    pub fn on_error(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Runs the whole chain for one event. An error from any stage is routed
    /// to the registered error handler if present, otherwise returned; either
    /// way the failure is scoped to this event.
    #[instrument(skip(self, ctx))]
    pub async fn run(&self, ctx: &Arc<EventContext>) -> Result<()> {
        info!(
            user_id = %ctx.user_id(),
            stages = self.stack.len(),
            "step: middleware chain started"
        );

        let next = Next {
            stack: Arc::new(self.stack.clone()),
            index: 0,
            cursor: Arc::new(AtomicUsize::new(0)),
        };

        match next.run(ctx).await {
            Ok(()) => {
                info!(user_id = %ctx.user_id(), "step: middleware chain finished");
                Ok(())
            }
            Err(e) => match &self.error_handler {
                Some(handler) => {
                    error!(
                        user_id = %ctx.user_id(),
                        error = %e,
                        "step: chain error routed to error handler"
                    );
                    handler.handle(ctx, &e).await;
                    Ok(())
                }
                None => Err(e),
            },
        }
    }
}
