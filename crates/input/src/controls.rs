use crate::bindings::{Key, KeyBindings};
use crate::intent::{InputState, Intent};
use std::collections::BTreeSet;
use std::sync::mpsc::{self, Receiver, Sender};

/// An edge-triggered key event sent by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    Pressed(Key),
    Released(Key),
    /// Forget every held key, e.g. when the host window loses focus and
    /// key-up events will never arrive.
    ReleaseAll,
}

/// Sending half handed to the host's key listeners.
///
/// Cheap to clone and `Send`, so listeners on any thread can feed it.
#[derive(Debug, Clone)]
pub struct ControlsSender {
    tx: Sender<KeyEvent>,
}

impl ControlsSender {
    pub fn send(&self, event: KeyEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("controls receiver dropped; key event discarded");
        }
    }

    pub fn press(&self, key: Key) {
        self.send(KeyEvent::Pressed(key));
    }

    pub fn release(&self, key: Key) {
        self.send(KeyEvent::Released(key));
    }

    pub fn release_all(&self) {
        self.send(KeyEvent::ReleaseAll);
    }
}

/// Owner of the held-key set and the resulting `InputState`.
///
/// Key events are queued by `ControlsSender` and applied in one batch by
/// `drain`, so readers see a stable snapshot between drains.
pub struct Controls {
    bindings: KeyBindings,
    held: BTreeSet<Key>,
    state: InputState,
    channel: Option<(Sender<KeyEvent>, Receiver<KeyEvent>)>,
}

impl Controls {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            held: BTreeSet::new(),
            state: InputState::default(),
            channel: None,
        }
    }

    /// Open the key-event channel and return a sender for the host listeners.
    ///
    /// Calling this again hands out another sender on the same channel.
    pub fn enable(&mut self) -> ControlsSender {
        let (tx, _) = self.channel.get_or_insert_with(|| {
            tracing::info!(bindings = self.bindings.len(), "controls enabled");
            mpsc::channel()
        });
        ControlsSender { tx: tx.clone() }
    }

    pub fn is_enabled(&self) -> bool {
        self.channel.is_some()
    }

    /// Apply every queued key event. Returns how many were applied.
    pub fn drain(&mut self) -> usize {
        let Some((_, rx)) = &self.channel else {
            return 0;
        };
        let pending: Vec<KeyEvent> = rx.try_iter().collect();
        for event in &pending {
            self.apply(event);
        }
        pending.len()
    }

    /// Apply a single key event immediately.
    pub fn apply(&mut self, event: &KeyEvent) {
        match event {
            KeyEvent::Pressed(key) => {
                if let Some(intent) = self.bindings.intent(key) {
                    self.held.insert(key.clone());
                    self.refresh(intent);
                }
            }
            KeyEvent::Released(key) => {
                if let Some(intent) = self.bindings.intent(key) {
                    self.held.remove(key);
                    self.refresh(intent);
                }
            }
            KeyEvent::ReleaseAll => {
                self.held.clear();
                if self.state != InputState::default() {
                    tracing::debug!("all intents released");
                }
                self.state = InputState::default();
            }
        }
    }

    pub fn state(&self) -> InputState {
        self.state
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    fn refresh(&mut self, intent: Intent) {
        let held = self
            .bindings
            .keys_for(intent)
            .any(|k| self.held.contains(k));
        if self.state.get(intent) != held {
            tracing::debug!(%intent, held, "intent changed");
        }
        self.state.set(intent, held);
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::new(KeyBindings::default())
    }
}
