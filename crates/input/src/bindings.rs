use crate::intent::Intent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A physical key, named the way the windowing host names key codes
/// (`KeyW`, `Space`, `ShiftLeft`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(pub String);

impl Key {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key-to-intent table. Several keys may map to one intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBindings {
    map: BTreeMap<Key, Intent>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut b = Self::empty();
        b.bind(Key::new("KeyW"), Intent::MoveForward);
        b.bind(Key::new("KeyS"), Intent::MoveBackward);
        b.bind(Key::new("KeyA"), Intent::MoveLeft);
        b.bind(Key::new("KeyD"), Intent::MoveRight);
        b.bind(Key::new("Space"), Intent::Jump);
        b.bind(Key::new("ShiftLeft"), Intent::Crouch);
        b.bind(Key::new("ShiftRight"), Intent::Crouch);
        b.bind(Key::new("KeyX"), Intent::Attack);
        b
    }
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    /// Bind `key` to `intent`, replacing any previous binding of that key.
    pub fn bind(&mut self, key: Key, intent: Intent) {
        self.map.insert(key, intent);
    }

    pub fn intent(&self, key: &Key) -> Option<Intent> {
        self.map.get(key).copied()
    }

    /// All keys bound to `intent`.
    pub fn keys_for(&self, intent: Intent) -> impl Iterator<Item = &Key> {
        self.map
            .iter()
            .filter(move |(_, i)| **i == intent)
            .map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
