//! Mail & Calendar Assistant: WASM entry point.
//!
//! This crate is the composition root (DI wiring layer).
//! It assembles the platform adapters, builds the chat client and hands
//! both to the egui UI.

mod app;

use mailcal_types::config::ClientConfig;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const CONFIG_META_SELECTOR: &str = "meta[name=\"mailcal-config\"]";

/// WASM entry point: called from index.html
#[wasm_bindgen(start)]
pub async fn main() {
    // Initialize logging
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Mail & Calendar Assistant starting...");

    let config = load_config();
    let web_options = eframe::WebOptions::default();

    // Get the canvas element by ID
    let document = web_sys::window()
        .expect("No window")
        .document()
        .expect("No document");
    let canvas = document
        .get_element_by_id("mailcal_canvas")
        .expect("No canvas element with id 'mailcal_canvas'")
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .expect("Element is not a canvas");

    wasm_bindgen_futures::spawn_local(async move {
        eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| Ok(Box::new(app::MailcalApp::new(cc, config)))),
            )
            .await
            .expect("Failed to start eframe");
    });
}

/// Speech-to-text hook for the page: appends `text` to the chat input.
#[wasm_bindgen]
pub fn push_transcript(text: &str) {
    app::queue_transcript(text.to_string());
}

/// Defaults, overridden by a JSON `<meta name="mailcal-config">` tag.
fn load_config() -> ClientConfig {
    let override_json = gloo_utils::document()
        .query_selector(CONFIG_META_SELECTOR)
        .ok()
        .flatten()
        .and_then(|meta| meta.get_attribute("content"));

    let Some(json) = override_json else {
        return ClientConfig::default();
    };
    match ClientConfig::from_json(&json) {
        Ok(config) => {
            log::info!("Config loaded from page: backend {}", config.base_url());
            config
        }
        Err(e) => {
            log::warn!("Ignoring invalid page config ({}), using defaults", e);
            ClientConfig::default()
        }
    }
}
