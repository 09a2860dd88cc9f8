//! The bot façade: registration API, chain composition, and per-event entry
//! points.
//!
//! One `Bot` is built up front (builder style), then drives every inbound
//! event through the same chain: scene middleware first, user middleware in
//! registration order, handler dispatch as the terminal stage.

use crate::config::BotConfig;
use crate::dispatcher::{Dispatcher, Trigger};
use crate::graph::GraphApi;
use crate::webhook;
use async_trait::async_trait;
use mbot_core::{Event, EventContext, EventHandler, EventKind, Outbound, Result};
use middleware_chain::{Chain, ErrorHandler, Middleware, Next};
use scenes::{Scene, SceneManager};
use session_store::SessionStore;
use std::sync::{Arc, OnceLock};
use tracing::{error, info, instrument, warn};

pub struct Bot {
    dispatcher: Dispatcher,
    middleware: Vec<Arc<dyn Middleware>>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
    scenes: SceneManager,
    outbound: Arc<dyn Outbound>,
    verify_token: Option<String>,
    chain: OnceLock<Chain>,
}

impl Bot {
    /// Creates a bot with the given transport and session store. Register
    /// handlers, middleware, and scenes before handling the first event.
    pub fn new(outbound: Arc<dyn Outbound>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            dispatcher: Dispatcher::new(),
            middleware: Vec::new(),
            error_handler: None,
            scenes: SceneManager::new(store),
            outbound,
            verify_token: None,
            chain: OnceLock::new(),
        }
    }

    /// Creates a bot wired to the Graph API using the given config.
    pub fn from_config(config: &BotConfig, store: Arc<dyn SessionStore>) -> Self {
        let mut api = GraphApi::new(config.page_access_token.clone());
        if let Some(url) = &config.api_url {
            api = api.with_api_url(url.clone());
        }
        let bot = Self::new(Arc::new(api), store);
        match &config.verify_token {
            Some(token) => bot.verify_token(token.clone()),
            None => bot,
        }
    }

    /// Sets the token expected by the verification handshake.
    pub fn verify_token(mut self, token: String) -> Self {
        self.verify_token = Some(token);
        self
    }

    /// Registers a generic observer for an event kind. Observers run even
    /// when a command/hears/action handler already matched.
    pub fn on(mut self, kind: EventKind, handler: Arc<dyn EventHandler>) -> Self {
        self.dispatcher.on(kind, handler);
        self
    }

    /// Registers a command handler (full-text exact or regex match).
    pub fn command(mut self, trigger: impl Into<Trigger>, handler: Arc<dyn EventHandler>) -> Self {
        self.dispatcher.command(trigger.into(), handler);
        self
    }

    /// Registers one handler for several command triggers.
    pub fn commands(
        mut self,
        triggers: Vec<Trigger>,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        for trigger in triggers {
            self.dispatcher.command(trigger, handler.clone());
        }
        self
    }

    /// Registers a hears handler (substring or regex match).
    pub fn hears(mut self, trigger: impl Into<Trigger>, handler: Arc<dyn EventHandler>) -> Self {
        self.dispatcher.hears(trigger.into(), handler);
        self
    }

    /// Registers one handler for several hears triggers.
    pub fn hears_any(mut self, triggers: Vec<Trigger>, handler: Arc<dyn EventHandler>) -> Self {
        for trigger in triggers {
            self.dispatcher.hears(trigger, handler.clone());
        }
        self
    }

    /// Registers an action handler for an exact payload.
    pub fn action(mut self, payload: impl Into<String>, handler: Arc<dyn EventHandler>) -> Self {
        self.dispatcher.action(payload, handler);
        self
    }

    /// Registers one handler for several action payloads.
    pub fn actions(mut self, payloads: Vec<String>, handler: Arc<dyn EventHandler>) -> Self {
        for payload in payloads {
            self.dispatcher.action(payload, handler.clone());
        }
        self
    }

    /// Appends a user middleware; runs after the scene middleware, before
    /// handler dispatch, in registration order.
    pub fn use_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Registers the global per-event error handler.
    pub fn catch(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// First-match-wins compatibility mode: observers stop firing once a
    /// specific handler matched.
    pub fn stop_on_match(mut self, stop: bool) -> Self {
        self.dispatcher.set_stop_on_match(stop);
        self
    }

    /// Registers a scene. Same-name registration replaces the prior scene.
    pub fn scene(self, scene: Scene) -> Self {
        self.scenes.register(scene);
        self
    }

    /// The scene manager, for wiring `enter` handlers.
    pub fn scene_manager(&self) -> &SceneManager {
        &self.scenes
    }

    /// Handler entering the named scene; register it as a command or action
    /// handler.
    pub fn enter_scene(&self, name: impl Into<String>) -> Arc<dyn EventHandler> {
        self.scenes.enter(name)
    }

    fn chain(&self) -> &Chain {
        self.chain.get_or_init(|| {
            let mut chain = Chain::new().add(self.scenes.middleware());
            for middleware in &self.middleware {
                chain = chain.add(middleware.clone());
            }
            chain = chain.add(Arc::new(DispatchStage {
                dispatcher: Arc::new(self.dispatcher.clone()),
            }));
            if let Some(handler) = &self.error_handler {
                chain = chain.on_error(handler.clone());
            }
            chain
        })
    }

    /// Processes one parsed inbound event end to end.
    #[instrument(skip(self, event))]
    pub async fn handle_event(&self, event: Event) -> Result<()> {
        let ctx = Arc::new(EventContext::new(event, self.outbound.clone()));
        info!(user_id = %ctx.user_id(), kind = ?ctx.event().kind(), "step: event received");
        self.chain().run(&ctx).await
    }

    /// Processes one raw webhook POST body and returns the HTTP status to
    /// acknowledge with: 200 after processing, 404 for a malformed container.
    /// Per-event failures are logged (or routed to `catch`); the delivery is
    /// still acknowledged.
    pub async fn handle_update(&self, body: &serde_json::Value) -> u16 {
        match webhook::parse_update(body) {
            Ok(events) => {
                for event in events {
                    if let Err(e) = self.handle_event(event).await {
                        error!(error = %e, "Event processing failed");
                    }
                }
                200
            }
            Err(e) => {
                warn!(error = %e, "Rejected webhook update");
                404
            }
        }
    }

    /// GET verification handshake. Returns the challenge to echo with 200;
    /// `None` means the transport should answer 403.
    pub fn verify(&self, mode: &str, verify_token: &str, challenge: &str) -> Option<String> {
        let expected = self.verify_token.as_deref()?;
        webhook::verify_subscription(expected, mode, verify_token, challenge)
    }
}

/// Terminal chain stage running the handler dispatcher.
struct DispatchStage {
    dispatcher: Arc<Dispatcher>,
}

#[async_trait]
impl Middleware for DispatchStage {
    async fn handle(&self, ctx: &Arc<EventContext>, next: Next) -> Result<()> {
        self.dispatcher.dispatch(ctx).await?;
        next.run(ctx).await
    }
}
