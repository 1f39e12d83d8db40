//! Main egui application: owns the chat client and renders the chat panel.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use egui::{self, CentralPanel, RichText, TopBottomPanel};

use mailcal_core::event_bus::EventBus;
use mailcal_core::ports::SpawnPort;
use mailcal_core::{ChatClient, ClientPorts, SubmitOutcome};
use mailcal_platform::storage::auto_detect_storage;
use mailcal_platform::{build_backend, GlooTimer, WasmSpawner};
use mailcal_types::config::ClientConfig;
use mailcal_ui::panels::{chat_panel, ChatAction};
use mailcal_ui::state::UiState;
use mailcal_ui::theme;

/// Poll interval while something is happening off-frame (reconnect, reply)
const BACKGROUND_REPAINT: Duration = Duration::from_millis(250);

thread_local! {
    /// Transcripts pushed from the page, applied on the next frame
    static TRANSCRIPTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    static REPAINT: RefCell<Option<egui::Context>> = const { RefCell::new(None) };
}

/// Queue speech-to-text output for the input field and wake the UI.
pub fn queue_transcript(text: String) {
    TRANSCRIPTS.with(|queue| queue.borrow_mut().push(text));
    REPAINT.with(|ctx| {
        if let Some(ctx) = ctx.borrow().as_ref() {
            ctx.request_repaint();
        }
    });
}

/// The main application state
pub struct MailcalApp {
    ui_state: UiState,
    client: ChatClient,
    event_bus: EventBus,
    first_frame: bool,
}

impl MailcalApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: ClientConfig) -> Self {
        let event_bus = EventBus::new();
        let spawner: Rc<dyn SpawnPort> = Rc::new(WasmSpawner);

        let ports = ClientPorts {
            backend: build_backend(&config, spawner.clone()),
            storage: auto_detect_storage(),
            timer: Rc::new(GlooTimer),
            spawner,
        };
        let client = ChatClient::new(config, ports, event_bus.clone());
        client.start();

        let mut ui_state = UiState::new();
        ui_state.refresh(&client.status(), &client.messages());

        Self {
            ui_state,
            client,
            event_bus,
            first_frame: true,
        }
    }

    fn sync_from_client(&mut self) {
        self.ui_state.refresh(&self.client.status(), &self.client.messages());
    }

    fn dispatch(&mut self, action: ChatAction, ctx: &egui::Context) {
        match action {
            ChatAction::Submit(text) => self.dispatch_message(text, ctx),
            ChatAction::NewChat => {
                self.client.new_chat();
            }
            ChatAction::Retry => {
                let client = self.client.clone();
                let ctx = ctx.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    if !client.check_backend().await {
                        log::warn!("Backend still unreachable");
                    }
                    ctx.request_repaint();
                });
            }
            ChatAction::Clear => {
                let client = self.client.clone();
                let ctx = ctx.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(e) = client.clear_chat().await {
                        log::warn!("Backend did not clear the previous session: {}", e);
                    }
                    ctx.request_repaint();
                });
            }
        }
        self.sync_from_client();
    }

    /// Submit a user message; refusals put the text back in the input.
    fn dispatch_message(&mut self, text: String, ctx: &egui::Context) {
        let submission = match self.client.submit(&text) {
            Ok(submission) => submission,
            Err(e) => {
                log::warn!("Submission refused: {}", e);
                self.ui_state.status_text = e.to_string();
                self.ui_state.input_text = text;
                return;
            }
        };

        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match submission.await {
                SubmitOutcome::Replied(reply) => {
                    log::debug!("Reply {} received", reply.id);
                }
                SubmitOutcome::Failed { error, .. } => {
                    log::error!("Message failed: {}", error);
                }
                SubmitOutcome::Orphaned { request_id } => {
                    log::debug!("Reply for {} arrived after the chat was reset", request_id);
                }
            }
            ctx.request_repaint();
        });
    }
}

impl eframe::App for MailcalApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            theme::apply_theme(ctx);
            REPAINT.with(|repaint| *repaint.borrow_mut() = Some(ctx.clone()));
            self.first_frame = false;
        }

        for transcript in TRANSCRIPTS.with(|queue| std::mem::take(&mut *queue.borrow_mut())) {
            self.ui_state.append_transcript(&transcript);
        }

        // Drain events from the chat client
        let events = self.event_bus.drain();
        if !events.is_empty() {
            self.ui_state.process_events(events);
            self.sync_from_client();
            ctx.request_repaint();
        }

        if self.ui_state.is_busy() || !self.ui_state.connection.is_connected() {
            ctx.request_repaint_after(BACKGROUND_REPAINT);
        }

        // ── Top bar ──────────────────────────────────────────
        TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new("Mail & Calendar Assistant")
                        .strong()
                        .color(theme::ACCENT)
                        .size(16.0),
                );
                ui.separator();
                let config = self.client.config();
                ui.label(
                    RichText::new(format!(
                        "Backend: {} | Transport: {}",
                        config.base_url(),
                        config.transport.label()
                    ))
                    .color(theme::TEXT_SECONDARY)
                    .small(),
                );
            });
        });

        // ── Main content ─────────────────────────────────────
        let mut action = None;
        CentralPanel::default().show(ctx, |ui| {
            action = chat_panel(ui, &mut self.ui_state);
        });
        if let Some(action) = action {
            self.dispatch(action, ctx);
        }
    }
}

impl Drop for MailcalApp {
    fn drop(&mut self) {
        REPAINT.with(|repaint| repaint.borrow_mut().take());
        self.client.shutdown();
    }
}
