//! # mbot-core
//!
//! Core types and traits for the Messenger bot framework: the inbound
//! [`Event`] model, the per-event [`EventContext`], the typed [`Session`]
//! bag, the [`EventHandler`] and [`Outbound`] traits, error types, and
//! tracing initialization. Transport-agnostic; used by every other crate in
//! the workspace.

pub mod context;
pub mod error;
pub mod event;
pub mod handler;
pub mod logger;
pub mod outbound;
pub mod session;

pub use context::{EventContext, SceneHandle, ANONYMOUS_SENDER};
pub use error::{HandlerError, MbotError, Result};
pub use event::{Attachment, AttachmentKind, Event, EventKind, IncomingMessage, Postback};
pub use handler::{EventHandler, Outcome};
pub use logger::init_tracing;
pub use outbound::{Button, OutgoingPayload, Outbound, QuickReply};
pub use session::{Session, SCENE_KEY, STEP_KEY};
