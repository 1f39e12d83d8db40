//! Buffered client → UI event channel.
//!
//! Single-threaded (WASM main thread), shared through `Rc<RefCell<..>>`.
//! The UI drains it once per frame. egui stops repainting while the tab is
//! hidden, so the buffer is bounded and drops its oldest events when full.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use mailcal_types::event::ClientEvent;

const DEFAULT_CAPACITY: usize = 1024;

/// Shared event bus: clone-cheap via Rc.
#[derive(Clone)]
pub struct EventBus {
    inner: Rc<RefCell<Buffer>>,
}

struct Buffer {
    events: VecDeque<ClientEvent>,
    capacity: usize,
    dropped: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Buffer {
                events: VecDeque::new(),
                capacity: capacity.max(1),
                dropped: 0,
            })),
        }
    }

    pub fn emit(&self, event: ClientEvent) {
        let mut buf = self.inner.borrow_mut();
        if buf.events.len() == buf.capacity {
            buf.events.pop_front();
            buf.dropped += 1;
        }
        buf.events.push_back(event);
    }

    /// Take every buffered event, oldest first.
    pub fn drain(&self) -> Vec<ClientEvent> {
        self.inner.borrow_mut().events.drain(..).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().events.is_empty()
    }

    /// Events discarded because nobody drained in time
    pub fn dropped(&self) -> u64 {
        self.inner.borrow().dropped
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
