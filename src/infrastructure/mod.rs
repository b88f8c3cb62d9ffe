pub mod csrf;
pub mod dom;
pub mod http;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod runtime;
pub mod services;

pub use dom::DomSurface;
pub use http::GlooApiClient;
pub use runtime::BrowserRuntime;
pub use services::{BrowserTimeProvider, ConsoleLogger};
