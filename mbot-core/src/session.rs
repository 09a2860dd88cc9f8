//! Per-user session bag and the scene cursor embedded in it.
//!
//! A session is an open string-keyed mapping of JSON values, created lazily as
//! an empty mapping and persisted as-is by the session store. The scene cursor
//! lives under two reserved keys: [`SCENE_KEY`] (active scene name) and
//! [`STEP_KEY`] (zero-based step index).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Session key holding the active scene name.
pub const SCENE_KEY: &str = "__scene";

/// Session key holding the zero-based step index of the active scene.
pub const STEP_KEY: &str = "step";

/// String-keyed bag of JSON values scoped to one user id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session {
    entries: HashMap<String, Value>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Removes every key. The only primitive that empties a session outright;
    /// leaving a scene goes through this.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Name of the active scene, if one is recorded in this session.
    pub fn scene_name(&self) -> Option<String> {
        self.entries
            .get(SCENE_KEY)
            .and_then(Value::as_str)
            .map(str::to_owned)
    }

    pub fn set_scene_name(&mut self, name: &str) {
        self.entries
            .insert(SCENE_KEY.to_string(), Value::from(name));
    }

    /// Current step index. Absent or non-numeric values read as 0.
    pub fn step(&self) -> usize {
        self.entries
            .get(STEP_KEY)
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize
    }

    pub fn set_step(&mut self, step: usize) {
        self.entries
            .insert(STEP_KEY.to_string(), Value::from(step as u64));
    }
}
