//! A scene: a named, ordered sequence of step handlers with a cursor kept in
//! the session.
//!
//! The advance rule after a step runs: if the step did not itself move the
//! cursor, the inbound event carried text, and the step did not return
//! [`StepOutcome::Stay`], the cursor moves forward by one. A cursor at or
//! past the step count exits the scene when the next event resumes it.

use async_trait::async_trait;
use mbot_core::{EventContext, Result, SceneHandle};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// What a step did with the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step finished; the cursor may auto-advance.
    Advance,
    /// Validation failed; stay on this step so the next event re-runs it.
    Stay,
}

/// One step of a scene.
#[async_trait]
pub trait SceneStep: Send + Sync {
    async fn run(&self, ctx: &Arc<EventContext>) -> Result<StepOutcome>;
}

/// Named multi-step conversation flow. Immutable once registered.
pub struct Scene {
    name: String,
    steps: Vec<Arc<dyn SceneStep>>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Appends a step (steps run in registration order).
    pub fn step(mut self, step: Arc<dyn SceneStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Handle attached to contexts while this scene drives them.
    pub(crate) fn handle_ref(&self) -> Arc<dyn SceneHandle> {
        Arc::new(SceneRef {
            name: self.name.clone(),
            step_count: self.steps.len(),
        })
    }

    /// Activates this scene for the context's session: cursor to step 0,
    /// scene attached, then step 0 runs immediately under the normal advance
    /// rule.
    #[instrument(skip(self, ctx), fields(scene = %self.name))]
    pub async fn enter(&self, ctx: &Arc<EventContext>) -> Result<()> {
        info!(user_id = %ctx.user_id(), "step: scene entered");
        {
            let mut session = ctx.session();
            session.set_scene_name(&self.name);
            session.set_step(0);
        }
        ctx.attach_scene(self.handle_ref());
        self.handle(ctx).await
    }

    /// Runs the current step for one event and applies the advance rule.
    #[instrument(skip(self, ctx), fields(scene = %self.name))]
    pub async fn handle(&self, ctx: &Arc<EventContext>) -> Result<()> {
        let index = ctx.session().step();
        if index >= self.steps.len() {
            return self.leave(ctx).await;
        }

        debug!(user_id = %ctx.user_id(), index, "step: running scene step");
        let outcome = self.steps[index].run(ctx).await?;

        // The step left the scene; the cursor no longer exists.
        if ctx.scene_stopped() {
            return Ok(());
        }

        // Advance only when the step did not move the cursor itself. A cursor
        // pushed past the last step stays in the session until the next event
        // resumes the scene and hits the bounds check above.
        let current = ctx.session().step();
        if current == index && ctx.text().is_some() && outcome != StepOutcome::Stay {
            ctx.session().set_step(index + 1);
        }
        Ok(())
    }

    /// Deactivates the scene: the session is emptied entirely, the scene is
    /// detached from the context, and resumption is suppressed for the rest
    /// of this event.
    pub async fn leave(&self, ctx: &Arc<EventContext>) -> Result<()> {
        info!(user_id = %ctx.user_id(), scene = %self.name, "step: scene left");
        ctx.leave_scene();
        Ok(())
    }
}

struct SceneRef {
    name: String,
    step_count: usize,
}

impl SceneHandle for SceneRef {
    fn name(&self) -> &str {
        &self.name
    }

    fn step_count(&self) -> usize {
        self.step_count
    }
}
