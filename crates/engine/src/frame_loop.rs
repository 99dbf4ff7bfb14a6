use std::cell::Cell;
use std::rc::Rc;

/// Host hook asked, at the start of every tick, for the next one.
pub trait FrameScheduler {
    fn request_frame(&mut self);
}

/// Scheduler for hosts that drive ticks themselves; it only counts requests.
///
/// Clones share the count.
#[derive(Debug, Clone, Default)]
pub struct CountingScheduler {
    requested: Rc<Cell<u64>>,
}

impl CountingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requested(&self) -> u64 {
        self.requested.get()
    }
}

impl FrameScheduler for CountingScheduler {
    fn request_frame(&mut self) {
        self.requested.set(self.requested.get() + 1);
    }
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    pub tick: u64,
    pub key_events: usize,
    pub moving: bool,
    pub directed: bool,
    pub rendered_primary: bool,
    pub rendered_secondary: bool,
}
