pub mod notifier;
pub mod pages;
pub mod polling;
pub mod ports;
pub mod render;

pub use notifier::Notifier;
pub use polling::{EndpointFetcher, PollingController, StreamBinding, StreamFetcher, StreamView};
pub use ports::{ApiClient, BusyIndicator, Field, NotificationSurface, Runtime, Surface, TimerHandle};
