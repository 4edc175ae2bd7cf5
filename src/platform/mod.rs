//! Host-injected collaborators
//!
//! The game core never touches a real window, DOM or storage backend. The
//! host hands in these seams at construction, which keeps the state machine
//! and generator testable headless.

use glam::Vec2;
use serde_json::Value;
use std::collections::HashMap;

use crate::consts::{REF_HEIGHT, REF_WIDTH};

/// Current render scale and reference canvas size.
///
/// Client pointer coordinates divide by `scale()` to land in simulation
/// space; the host uses `reference_size()` to size its canvas backing store.
pub trait Viewport {
    fn scale(&self) -> f32;
    fn reference_size(&self) -> Vec2;
}

/// Fixed-scale viewport (native demo and tests)
#[derive(Debug, Clone, Copy)]
pub struct FixedViewport {
    pub scale: f32,
}

impl Default for FixedViewport {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl Viewport for FixedViewport {
    fn scale(&self) -> f32 {
        self.scale
    }

    fn reference_size(&self) -> Vec2 {
        Vec2::new(REF_WIDTH, REF_HEIGHT)
    }
}

/// Persistent key-value store with JSON-serializable values
pub trait Storage {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value);
}

/// In-memory storage (demo, tests; hosts back this with LocalStorage or disk)
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, Value>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }
}

/// Target-glyph display surface (the HUD element and its glyph sub-element)
pub trait HudDisplay {
    fn set_glyph(&mut self, glyph: char);
    fn set_visible(&mut self, visible: bool);
}

/// HUD that renders nowhere (headless tests)
#[derive(Debug, Default)]
pub struct NullHud;

impl HudDisplay for NullHud {
    fn set_glyph(&mut self, _glyph: char) {}
    fn set_visible(&mut self, _visible: bool) {}
}
