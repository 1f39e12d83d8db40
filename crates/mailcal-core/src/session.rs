//! Session identity: the one opaque token the backend groups a
//! conversation under.
//!
//! The id is generated lazily, persisted through a [`StoragePort`] under a
//! fixed key, and survives reloads. `reset()` swaps in a new id and notifies
//! registered dependents (the request queue drops its backlog).

use std::cell::RefCell;
use std::rc::Rc;

use mailcal_types::event::ClientEvent;
use crate::event_bus::EventBus;
use crate::ports::StoragePort;

type ResetListener = Box<dyn Fn(&str)>;

/// Shared handle: clone-cheap via Rc, single writer.
#[derive(Clone)]
pub struct SessionIdentity {
    inner: Rc<SessionInner>,
}

struct SessionInner {
    storage: Rc<dyn StoragePort>,
    key: String,
    current: RefCell<Option<String>>,
    listeners: RefCell<Vec<ResetListener>>,
    event_bus: EventBus,
}

impl SessionIdentity {
    pub fn new(storage: Rc<dyn StoragePort>, key: impl Into<String>, event_bus: EventBus) -> Self {
        Self {
            inner: Rc::new(SessionInner {
                storage,
                key: key.into(),
                current: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
                event_bus,
            }),
        }
    }

    /// The active id, loading it from storage or generating one on first use.
    pub fn current_id(&self) -> String {
        if let Some(id) = self.inner.current.borrow().as_ref() {
            return id.clone();
        }

        let stored = match self.inner.storage.get(&self.inner.key) {
            Ok(value) => value.filter(|v| !v.trim().is_empty()),
            Err(e) => {
                log::warn!("Could not read session id ({}), generating a new one", e);
                None
            }
        };

        let id = match stored {
            Some(id) => {
                log::info!("Using existing session ID: {}", id);
                id
            }
            None => {
                let id = generate_session_id();
                self.persist(&id);
                log::info!("Created new session ID: {}", id);
                id
            }
        };
        *self.inner.current.borrow_mut() = Some(id.clone());
        id
    }

    /// Replace the id with a fresh one and notify dependents.
    pub fn reset(&self) -> String {
        let id = generate_session_id();
        self.persist(&id);
        let previous = self.inner.current.borrow_mut().replace(id.clone());
        log::info!(
            "Session reset: {} -> {}",
            previous.as_deref().unwrap_or("<none>"),
            id
        );

        for listener in self.inner.listeners.borrow().iter() {
            listener(&id);
        }
        self.inner.event_bus.emit(ClientEvent::SessionReset {
            session_id: id.clone(),
        });
        id
    }

    /// Forget the id entirely; the next `current_id()` generates a new one.
    pub fn clear(&self) {
        self.inner.current.borrow_mut().take();
        if let Err(e) = self.inner.storage.delete(&self.inner.key) {
            log::warn!("Could not remove persisted session id: {}", e);
        }
    }

    /// Register a callback run after every `reset()` with the new id.
    pub fn on_reset(&self, listener: impl Fn(&str) + 'static) {
        self.inner.listeners.borrow_mut().push(Box::new(listener));
    }

    fn persist(&self, id: &str) {
        if let Err(e) = self.inner.storage.set(&self.inner.key, id) {
            log::warn!(
                "Could not persist session id to {} storage: {}",
                self.inner.storage.backend_name(),
                e
            );
        }
    }
}

/// Random 128-bit id rendered as a v4 UUID.
fn generate_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
