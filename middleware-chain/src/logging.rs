//! Observer middleware that logs every inbound event and proceeds.

use crate::{Middleware, Next};
use async_trait::async_trait;
use mbot_core::{EventContext, Result};
use std::sync::Arc;
use tracing::{info, instrument};

pub struct LoggingMiddleware;

#[async_trait]
impl Middleware for LoggingMiddleware {
    #[instrument(skip(self, ctx, next))]
    async fn handle(&self, ctx: &Arc<EventContext>, next: Next) -> Result<()> {
        info!(
            user_id = %ctx.user_id(),
            kind = ?ctx.event().kind(),
            text = %ctx.text().unwrap_or(""),
            "Received event"
        );
        next.run(ctx).await
    }
}
