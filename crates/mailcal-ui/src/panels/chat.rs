//! Chat panel: header with client status, message log with lifecycle
//! badges, and the input row.

use egui::{self, Align, Layout, RichText, ScrollArea, Vec2};
use mailcal_types::{connection::ConnectionState, message::Role};
use crate::state::{ChatEntry, UiState};
use crate::theme::*;

/// What the user asked for this frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
    Submit(String),
    Clear,
    NewChat,
    Retry,
}

/// Render the chat panel. Returns an action when the user submits input or
/// presses one of the header buttons.
pub fn chat_panel(ui: &mut egui::Ui, state: &mut UiState) -> Option<ChatAction> {
    let mut action = None;

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                // Header
                ui.horizontal(|ui| {
                    ui.heading(
                        RichText::new("Mail & Calendar Assistant")
                            .color(TEXT_PRIMARY)
                            .strong(),
                    );
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if ui.button("New chat").clicked() {
                            action = Some(ChatAction::NewChat);
                        }
                        if ui.button("Clear").clicked() {
                            action = Some(ChatAction::Clear);
                        }
                        if state.connection == ConnectionState::Disconnected
                            && ui.button("Retry").clicked()
                        {
                            action = Some(ChatAction::Retry);
                        }
                        ui.label(
                            RichText::new(state.connection.label())
                                .color(connection_color(state.connection))
                                .small(),
                        );
                    });
                });

                ui.label(
                    RichText::new(format!(
                        "{} msgs | {} pending | queue {} | session {}",
                        state.message_count,
                        state.pending_count,
                        state.queue_length,
                        state.session_prefix(),
                    ))
                    .color(TEXT_SECONDARY)
                    .small(),
                );

                ui.horizontal(|ui| {
                    let status_color = if state.is_busy() { WARNING } else { TEXT_SECONDARY };
                    ui.label(RichText::new(&state.status_text).color(status_color).small());
                    if let Some(warning) = &state.last_warning {
                        ui.label(RichText::new(warning).color(WARNING).small());
                    }
                });

                ui.separator();

                // Messages area
                let available_height = ui.available_height() - 60.0;
                ScrollArea::vertical()
                    .max_height(available_height)
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for entry in &state.messages {
                            render_message(ui, entry);
                            ui.add_space(4.0);
                        }
                    });

                ui.add_space(8.0);

                // Input area
                let enabled = state.input_enabled();
                let hint = state.placeholder();
                ui.horizontal(|ui| {
                    let input = egui::TextEdit::singleline(&mut state.input_text)
                        .hint_text(hint)
                        .desired_width(ui.available_width() - 70.0)
                        .font(egui::FontId::proportional(14.0));

                    let response = ui.add_enabled(enabled, input);

                    let send_enabled = enabled && !state.input_text.trim().is_empty();
                    let send_btn = ui.add_enabled(
                        send_enabled,
                        egui::Button::new(RichText::new("Send").color(TEXT_PRIMARY))
                            .fill(if send_enabled { ACCENT } else { BG_SURFACE })
                            .corner_radius(PANEL_ROUNDING)
                            .min_size(Vec2::new(60.0, 0.0)),
                    );

                    // Submit on Enter or button click
                    let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if send_enabled && (enter || send_btn.clicked()) {
                        if let Some(text) = state.take_input() {
                            action = Some(ChatAction::Submit(text));
                            response.request_focus();
                        }
                    }
                });
            });
        });

    action
}

fn render_message(ui: &mut egui::Ui, entry: &ChatEntry) {
    let (label, label_color, bg) = match (entry.role, entry.is_error_notice) {
        (Role::User, _) => ("You", ACCENT, BG_SECONDARY),
        (Role::Assistant, false) => ("Assistant", SUCCESS, BG_SECONDARY),
        (Role::Assistant, true) => ("Error", ERROR, BG_ERROR),
    };

    egui::Frame::default()
        .fill(bg)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(label).color(label_color).strong().small());
                if entry.role == Role::User {
                    ui.label(
                        RichText::new(entry.state.label())
                            .color(lifecycle_color(entry.state))
                            .small(),
                    );
                }
            });
            ui.label(RichText::new(&entry.content).color(TEXT_PRIMARY));
            if let (Role::User, Some(detail)) = (entry.role, &entry.error_detail) {
                ui.label(RichText::new(detail).color(ERROR).small());
            }
        });
}
