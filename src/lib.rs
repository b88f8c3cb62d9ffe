use wasm_bindgen::prelude::*;

use crate::domain::logging::LogComponent;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod time_utils;

/// Installs the panic hook, console logger and browser clock.
#[wasm_bindgen(start)]
pub fn initialize() {
    console_error_panic_hook::set_once();

    let logger = if cfg!(debug_assertions) {
        infrastructure::ConsoleLogger::new_development()
    } else {
        infrastructure::ConsoleLogger::new_production()
    };
    domain::logging::init_logger(Box::new(logger));
    domain::logging::init_time_provider(Box::new(infrastructure::BrowserTimeProvider::new()));

    log_info!(LogComponent::Presentation("Initialize"), "account dashboard initialized");
}
