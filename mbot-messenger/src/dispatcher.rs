//! Handler registries and the fixed-precedence matching over one event.
//!
//! For a message: action handlers keyed by the quick-reply payload, then
//! command handlers (full-text match), then hears handlers (substring match),
//! then every generic message observer. For a postback: action handlers keyed
//! by the postback payload, then every generic postback observer. The first
//! match wins within the action/command/hears group; observers run regardless
//! of a prior match unless `stop_on_match` is set.

use mbot_core::{EventContext, EventHandler, EventKind, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Trigger for command and hears registrations.
#[derive(Debug, Clone)]
pub enum Trigger {
    Exact(String),
    Pattern(Regex),
}

impl Trigger {
    pub fn exact(text: impl Into<String>) -> Self {
        Trigger::Exact(text.into())
    }

    pub fn pattern(re: Regex) -> Self {
        Trigger::Pattern(re)
    }

    /// Command matching: the whole text equals the literal, or the regex
    /// matches.
    fn matches_command(&self, text: &str) -> bool {
        match self {
            Trigger::Exact(s) => text == s,
            Trigger::Pattern(re) => re.is_match(text),
        }
    }

    /// Hears matching: the literal occurs anywhere in the text, or the regex
    /// matches.
    fn matches_substring(&self, text: &str) -> bool {
        match self {
            Trigger::Exact(s) => text.contains(s.as_str()),
            Trigger::Pattern(re) => re.is_match(text),
        }
    }
}

impl From<&str> for Trigger {
    fn from(text: &str) -> Self {
        Trigger::Exact(text.to_string())
    }
}

impl From<String> for Trigger {
    fn from(text: String) -> Self {
        Trigger::Exact(text)
    }
}

impl From<Regex> for Trigger {
    fn from(re: Regex) -> Self {
        Trigger::Pattern(re)
    }
}

/// Registries for action, command, hears, and observer handlers.
#[derive(Clone, Default)]
pub struct Dispatcher {
    actions: HashMap<String, Arc<dyn EventHandler>>,
    commands: Vec<(Trigger, Arc<dyn EventHandler>)>,
    patterns: Vec<(Trigger, Arc<dyn EventHandler>)>,
    message_observers: Vec<Arc<dyn EventHandler>>,
    postback_observers: Vec<Arc<dyn EventHandler>>,
    stop_on_match: bool,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a generic observer for an event kind. Observers run even
    /// when a specific handler already matched.
    pub fn on(&mut self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        match kind {
            EventKind::Message => self.message_observers.push(handler),
            EventKind::Postback => self.postback_observers.push(handler),
        }
    }

    /// Registers a command handler matched against the full text. First
    /// registered match wins.
    pub fn command(&mut self, trigger: Trigger, handler: Arc<dyn EventHandler>) {
        self.commands.push((trigger, handler));
    }

    /// Registers a hears handler matched by substring or regex against the
    /// text. First registered match wins.
    pub fn hears(&mut self, trigger: Trigger, handler: Arc<dyn EventHandler>) {
        self.patterns.push((trigger, handler));
    }

    /// Registers an action handler for an exact payload string. Matching is a
    /// key lookup, not an ordered scan.
    pub fn action(&mut self, payload: impl Into<String>, handler: Arc<dyn EventHandler>) {
        self.actions.insert(payload.into(), handler);
    }

    /// When set, observers are skipped once a specific handler matched
    /// (first-match-wins compatibility mode). Off by default.
    pub fn set_stop_on_match(&mut self, stop: bool) {
        self.stop_on_match = stop;
    }

    /// Matches one event against the registries in precedence order.
    #[instrument(skip(self, ctx))]
    pub async fn dispatch(&self, ctx: &Arc<EventContext>) -> Result<()> {
        match ctx.event().kind() {
            EventKind::Postback => self.dispatch_postback(ctx).await,
            EventKind::Message => self.dispatch_message(ctx).await,
        }
    }

    async fn dispatch_postback(&self, ctx: &Arc<EventContext>) -> Result<()> {
        let mut matched = false;

        if let Some(payload) = ctx.event().postback_payload() {
            if let Some(handler) = self.actions.get(payload) {
                info!(user_id = %ctx.user_id(), payload = %payload, "step: action matched");
                let outcome = handler.handle(ctx).await?;
                debug!(?outcome, "step: action handler done");
                matched = true;
            }
        }

        if !(self.stop_on_match && matched) {
            for handler in &self.postback_observers {
                let outcome = handler.handle(ctx).await?;
                debug!(?outcome, "step: postback observer done");
            }
        }
        Ok(())
    }

    async fn dispatch_message(&self, ctx: &Arc<EventContext>) -> Result<()> {
        let mut matched = false;

        if let Some(payload) = ctx.event().quick_reply() {
            if let Some(handler) = self.actions.get(payload) {
                info!(user_id = %ctx.user_id(), payload = %payload, "step: quick-reply action matched");
                let outcome = handler.handle(ctx).await?;
                debug!(?outcome, "step: action handler done");
                matched = true;
            }
        }

        if let Some(text) = ctx.text() {
            if !matched {
                for (trigger, handler) in &self.commands {
                    if trigger.matches_command(text) {
                        info!(user_id = %ctx.user_id(), ?trigger, "step: command matched");
                        let outcome = handler.handle(ctx).await?;
                        debug!(?outcome, "step: command handler done");
                        matched = true;
                        break;
                    }
                }
            }
            if !matched {
                for (trigger, handler) in &self.patterns {
                    if trigger.matches_substring(text) {
                        info!(user_id = %ctx.user_id(), ?trigger, "step: hears matched");
                        let outcome = handler.handle(ctx).await?;
                        debug!(?outcome, "step: hears handler done");
                        matched = true;
                        break;
                    }
                }
            }
        }

        if !(self.stop_on_match && matched) {
            for handler in &self.message_observers {
                let outcome = handler.handle(ctx).await?;
                debug!(?outcome, "step: message observer done");
            }
        }
        Ok(())
    }
}
