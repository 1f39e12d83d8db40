//! Scheduling adapters: browser timers and the `spawn_local` executor.

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use gloo_timers::future::TimeoutFuture;

use mailcal_core::ports::{SpawnPort, TimerPort};

/// `setTimeout`-backed sleep
#[derive(Default)]
pub struct GlooTimer;

#[async_trait(?Send)]
impl TimerPort for GlooTimer {
    async fn sleep(&self, ms: u64) {
        let ms = u32::try_from(ms).unwrap_or(u32::MAX);
        TimeoutFuture::new(ms).await;
    }
}

/// Runs tasks on the page's microtask queue.
#[derive(Default)]
pub struct WasmSpawner;

impl SpawnPort for WasmSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}
