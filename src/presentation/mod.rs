pub mod toasts;
pub mod wasm_api;

pub use toasts::{LeptosNotificationSurface, toast_style};
