//! Scene registry plus the session-loading middleware that resumes active
//! scenes.

use crate::scene::Scene;
use async_trait::async_trait;
use mbot_core::{EventContext, EventHandler, Outcome, Result};
use middleware_chain::{Middleware, Next};
use session_store::SessionStore;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{error, info, instrument, warn};

/// Registry of named scenes owning the process-wide session store handle.
/// Cheap to clone; clones share the registry and the store.
#[derive(Clone)]
pub struct SceneManager {
    scenes: Arc<RwLock<HashMap<String, Arc<Scene>>>>,
    store: Arc<dyn SessionStore>,
}

impl SceneManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            scenes: Arc::new(RwLock::new(HashMap::new())),
            store,
        }
    }

    /// Adds a scene to the registry. Registering a name twice replaces the
    /// prior entry; last write wins.
    pub fn register(&self, scene: Scene) {
        let name = scene.name().to_string();
        let prev = self
            .scenes
            .write()
            .expect("scene registry lock poisoned")
            .insert(name.clone(), Arc::new(scene));
        if prev.is_some() {
            warn!(scene = %name, "Scene re-registered, previous definition replaced");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Scene>> {
        self.scenes
            .read()
            .expect("scene registry lock poisoned")
            .get(name)
            .cloned()
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Chain interceptor that loads the session, resumes a recorded scene
    /// (consuming the event) or falls through to the rest of the chain, and
    /// persists the session afterward in either case.
    pub fn middleware(&self) -> Arc<dyn Middleware> {
        Arc::new(SceneMiddleware {
            manager: self.clone(),
        })
    }

    /// Handler that enters the named scene, suitable for registration as a
    /// command or action handler. An unknown name logs a warning and skips.
    pub fn enter(&self, name: impl Into<String>) -> Arc<dyn EventHandler> {
        Arc::new(EnterSceneHandler {
            manager: self.clone(),
            name: name.into(),
        })
    }
}

struct EnterSceneHandler {
    manager: SceneManager,
    name: String,
}

#[async_trait]
impl EventHandler for EnterSceneHandler {
    async fn handle(&self, ctx: &Arc<EventContext>) -> Result<Outcome> {
        match self.manager.get(&self.name) {
            Some(scene) => {
                scene.enter(ctx).await?;
                Ok(Outcome::Done)
            }
            None => {
                warn!(scene = %self.name, "Cannot enter unregistered scene");
                Ok(Outcome::Skip)
            }
        }
    }
}

struct SceneMiddleware {
    manager: SceneManager,
}

#[async_trait]
impl Middleware for SceneMiddleware {
    #[instrument(skip(self, ctx, next))]
    async fn handle(&self, ctx: &Arc<EventContext>, next: Next) -> Result<()> {
        let user_id = ctx.user_id().to_string();
        let session = self.manager.store.get(&user_id).await?;
        ctx.replace_session(session);

        let active = ctx.session().scene_name();
        let result = match active {
            Some(name) if !ctx.scene_stopped() => match self.manager.get(&name) {
                Some(scene) => {
                    info!(user_id = %user_id, scene = %name, "step: resuming active scene");
                    ctx.attach_scene(scene.handle_ref());
                    // The scene consumes the event; the rest of the chain and
                    // handler dispatch are skipped.
                    scene.handle(ctx).await
                }
                None => {
                    warn!(
                        user_id = %user_id,
                        scene = %name,
                        "Recorded scene is not registered, falling through"
                    );
                    next.run(ctx).await
                }
            },
            _ => next.run(ctx).await,
        };

        // Persist whatever the pass left behind, even when it failed; a save
        // failure is logged, not raised.
        let snapshot = ctx.session_snapshot();
        if let Err(e) = self.manager.store.set(&user_id, &snapshot).await {
            error!(user_id = %user_id, error = %e, "Failed to persist session");
        }

        result
    }
}
