//! # scenes
//!
//! Multi-step conversation flows. A [`Scene`] is a named ordered list of
//! [`SceneStep`]s with its cursor kept in the per-user session; the
//! [`SceneManager`] owns the scene registry and the session store, and
//! provides the chain middleware that loads sessions and resumes active
//! scenes.

pub mod manager;
pub mod scene;

pub use manager::SceneManager;
pub use scene::{Scene, SceneStep, StepOutcome};
