//! Per-event context: the raw event, derived fields, the live session, the
//! attached scene, and the reply capability bound to the sender.
//!
//! One context is constructed per inbound event and owned by that processing
//! pass; it is never retained afterward. The session and scene slots use
//! interior mutability so middleware and handlers can share the context
//! behind an `Arc`. Guards returned by [`EventContext::session`] must not be
//! held across an await.

use crate::event::{Attachment, AttachmentKind, Event};
use crate::outbound::{Outbound, OutgoingPayload};
use crate::session::Session;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::error;

/// Session id used when the inbound event carries no resolvable sender.
pub const ANONYMOUS_SENDER: &str = "anonymous";

/// Backreference from a context to the conversation flow currently driving it.
pub trait SceneHandle: Send + Sync {
    fn name(&self) -> &str;
    fn step_count(&self) -> usize;
}

pub struct EventContext {
    event: Event,
    user_id: String,
    session: Mutex<Session>,
    scene: Mutex<Option<Arc<dyn SceneHandle>>>,
    scene_stopped: AtomicBool,
    outbound: Arc<dyn Outbound>,
}

impl EventContext {
    pub fn new(event: Event, outbound: Arc<dyn Outbound>) -> Self {
        let user_id = if event.sender_id.trim().is_empty() {
            ANONYMOUS_SENDER.to_string()
        } else {
            event.sender_id.clone()
        };
        Self {
            event,
            user_id,
            session: Mutex::new(Session::new()),
            scene: Mutex::new(None),
            scene_stopped: AtomicBool::new(false),
            outbound,
        }
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Session key for this event's sender.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn text(&self) -> Option<&str> {
        self.event.text()
    }

    /// Attachments of one kind.
    pub fn attachments(&self, kind: AttachmentKind) -> Vec<Attachment> {
        self.event
            .attachments()
            .iter()
            .filter(|a| a.kind == kind)
            .cloned()
            .collect()
    }

    pub fn images(&self) -> Vec<Attachment> {
        self.attachments(AttachmentKind::Image)
    }

    pub fn files(&self) -> Vec<Attachment> {
        self.attachments(AttachmentKind::File)
    }

    pub fn audio(&self) -> Vec<Attachment> {
        self.attachments(AttachmentKind::Audio)
    }

    pub fn video(&self) -> Vec<Attachment> {
        self.attachments(AttachmentKind::Video)
    }

    /// File attachments whose URL path ends in `.pdf`.
    pub fn pdfs(&self) -> Vec<Attachment> {
        self.event
            .attachments()
            .iter()
            .filter(|a| {
                a.kind == AttachmentKind::File
                    && a.url.as_deref().map(url_is_pdf).unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Locks and returns the live session. Do not hold the guard across an
    /// await; take what you need and drop it.
    pub fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().expect("session lock poisoned")
    }

    /// Swaps in the session loaded from the store at the start of the pass.
    pub fn replace_session(&self, session: Session) {
        *self.session() = session;
    }

    /// Clones the current session for persisting at the end of the pass.
    pub fn session_snapshot(&self) -> Session {
        self.session().clone()
    }

    pub fn attach_scene(&self, scene: Arc<dyn SceneHandle>) {
        *self.scene.lock().expect("scene lock poisoned") = Some(scene);
    }

    pub fn scene(&self) -> Option<Arc<dyn SceneHandle>> {
        self.scene.lock().expect("scene lock poisoned").clone()
    }

    pub fn detach_scene(&self) {
        *self.scene.lock().expect("scene lock poisoned") = None;
    }

    /// Marks the scene as stopped for the remainder of this event. Suppresses
    /// scene resumption and the step auto-advance for this pass only.
    pub fn mark_scene_stopped(&self) {
        self.scene_stopped.store(true, Ordering::SeqCst);
    }

    pub fn scene_stopped(&self) -> bool {
        self.scene_stopped.load(Ordering::SeqCst)
    }

    /// Abandons the active scene: empties the whole session, detaches the
    /// scene, and marks it stopped for the remainder of this event. Step
    /// handlers call this to bail out of a flow early.
    pub fn leave_scene(&self) {
        self.session().clear();
        self.detach_scene();
        self.mark_scene_stopped();
    }

    /// Sends a payload back to this event's sender. Delivery failures are
    /// logged and swallowed; the event still counts as handled.
    pub async fn reply(&self, payload: impl Into<OutgoingPayload>) {
        let payload = payload.into();
        if let Err(e) = self.outbound.send_message(&self.user_id, &payload).await {
            error!(
                user_id = %self.user_id,
                error = %e,
                "Failed to deliver reply"
            );
        }
    }
}

fn url_is_pdf(url: &str) -> bool {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url);
    path.to_ascii_lowercase().ends_with(".pdf")
}
