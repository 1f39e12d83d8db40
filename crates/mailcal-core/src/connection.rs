//! Connection monitor: owns the backend connectivity state and the
//! reconnect loop.
//!
//! A failed probe or transport error moves to `Disconnected` and schedules
//! one reconnect task: sleep the fixed delay, probe, repeat until a probe
//! succeeds. The task is `Abortable` and is cancelled on success, on
//! `teardown()` and when the monitor is dropped. Teardown is terminal: later
//! probes and transport failures are ignored.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use futures::future::{AbortHandle, Abortable};
use futures::FutureExt;

use mailcal_types::{
    connection::{ConnectionSignal, ConnectionState},
    event::ClientEvent,
};
use crate::event_bus::EventBus;
use crate::ports::{BackendPort, SpawnPort, TimerPort};

/// Shared handle: clone-cheap via Rc.
#[derive(Clone)]
pub struct ConnectionMonitor {
    inner: Rc<MonitorInner>,
}

struct MonitorInner {
    state: Cell<ConnectionState>,
    backend: Rc<dyn BackendPort>,
    timer: Rc<dyn TimerPort>,
    spawner: Rc<dyn SpawnPort>,
    retry_delay_ms: u64,
    reconnect: RefCell<Option<AbortHandle>>,
    torn_down: Cell<bool>,
    event_bus: EventBus,
}

impl ConnectionMonitor {
    pub fn new(
        backend: Rc<dyn BackendPort>,
        timer: Rc<dyn TimerPort>,
        spawner: Rc<dyn SpawnPort>,
        retry_delay_ms: u64,
        event_bus: EventBus,
    ) -> Self {
        Self {
            inner: Rc::new(MonitorInner {
                state: Cell::new(ConnectionState::Disconnected),
                backend,
                timer,
                spawner,
                retry_delay_ms,
                reconnect: RefCell::new(None),
                torn_down: Cell::new(false),
                event_bus,
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state.get()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.get()
    }

    /// Whether a reconnect task is currently scheduled
    pub fn reconnect_pending(&self) -> bool {
        self.inner.reconnect.borrow().is_some()
    }

    /// Run the health call once and update the state from its result.
    pub async fn probe(&self) -> bool {
        if self.is_torn_down() {
            return false;
        }
        self.inner.apply(ConnectionSignal::ProbeStarted);
        let result = self.inner.backend.health_check().await;
        if self.is_torn_down() {
            log::debug!("Ignoring health check result after teardown");
            return false;
        }
        match result {
            Ok(_) => {
                log::info!("Backend connection successful");
                self.inner.apply(ConnectionSignal::ProbeSucceeded);
                self.inner.cancel_reconnect();
                true
            }
            Err(e) => {
                log::error!("Backend connection failed: {}", e);
                self.inner.apply(ConnectionSignal::ProbeFailed);
                self.schedule_reconnect();
                false
            }
        }
    }

    /// A request failed at the transport level.
    pub fn report_transport_failure(&self) {
        if self.is_torn_down() {
            return;
        }
        self.inner.apply(ConnectionSignal::TransportFailed);
        self.schedule_reconnect();
    }

    /// Spawn the reconnect loop unless one is already scheduled.
    pub fn schedule_reconnect(&self) {
        if self.reconnect_pending() || self.is_torn_down() {
            return;
        }
        let (handle, registration) = AbortHandle::new_pair();
        *self.inner.reconnect.borrow_mut() = Some(handle);

        let weak = Rc::downgrade(&self.inner);
        let timer = self.inner.timer.clone();
        let delay = self.inner.retry_delay_ms;
        log::info!("Reconnect scheduled every {}ms", delay);

        let task = Abortable::new(reconnect_loop(weak, timer, delay), registration);
        self.inner.spawner.spawn_local(task.map(|_| ()).boxed_local());
    }

    /// Stop reconnecting and mark the connection closed.
    pub fn teardown(&self) {
        self.inner.torn_down.set(true);
        self.inner.cancel_reconnect();
        self.inner.apply(ConnectionSignal::Closed);
    }
}

impl MonitorInner {
    fn apply(&self, signal: ConnectionSignal) {
        let previous = self.state.get();
        let next = previous.transition(signal);
        if next != previous {
            self.state.set(next);
            self.event_bus.emit(ClientEvent::ConnectionChanged { state: next });
        }
    }

    fn cancel_reconnect(&self) {
        if let Some(handle) = self.reconnect.borrow_mut().take() {
            handle.abort();
        }
    }
}

impl Drop for MonitorInner {
    fn drop(&mut self) {
        self.cancel_reconnect();
    }
}

async fn reconnect_loop(weak: Weak<MonitorInner>, timer: Rc<dyn TimerPort>, delay: u64) {
    loop {
        timer.sleep(delay).await;
        let Some(inner) = weak.upgrade() else {
            return;
        };
        log::info!("Reconnecting...");
        if (ConnectionMonitor { inner }).probe().await {
            return;
        }
    }
}
