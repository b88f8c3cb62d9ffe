#![allow(dead_code)]

use std::rc::Rc;
use std::time::Duration;

use account_dashboard_wasm::application::pages::PageServices;
use account_dashboard_wasm::domain::Envelope;
use account_dashboard_wasm::infrastructure::memory::{
    ManualRuntime, MemorySurface, RecordingNotifications, ScriptedApiClient,
};

/// In-memory page environment.
pub struct Harness {
    pub client: Rc<ScriptedApiClient>,
    pub surface: Rc<MemorySurface>,
    pub toasts: Rc<RecordingNotifications>,
    pub runtime: Rc<ManualRuntime>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            client: ScriptedApiClient::new(),
            surface: MemorySurface::new(),
            toasts: RecordingNotifications::new(),
            runtime: ManualRuntime::new(),
        }
    }

    pub fn services(&self) -> PageServices {
        PageServices {
            client: self.client.clone(),
            surface: self.surface.clone(),
            notifications: self.toasts.clone(),
            runtime: self.runtime.clone(),
        }
    }

    pub fn settle(&self) {
        self.runtime.run_until_stalled();
    }
}

pub fn envelope(value: serde_json::Value) -> Envelope {
    serde_json::from_value(value).expect("valid envelope")
}

pub fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

pub fn millis(n: u64) -> Duration {
    Duration::from_millis(n)
}
