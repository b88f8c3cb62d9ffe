//! Seams between the refresh logic and the browser.
//!
//! Everything the controllers touch (HTTP, timers, task spawning, the DOM,
//! the toast overlay) goes through these traits so the lifecycle can run
//! against in-memory doubles.

use std::time::Duration;

use futures::future::LocalBoxFuture;

use crate::domain::{ApiRequest, AppResult, Envelope, Notification, NotificationId, TransportError};

pub type TaskFuture = LocalBoxFuture<'static, ()>;
pub type EnvelopeFuture = LocalBoxFuture<'static, Result<Envelope, TransportError>>;

/// POSTs to the dashboard API and decodes the envelope.
pub trait ApiClient {
    fn post(&self, request: ApiRequest) -> EnvelopeFuture;
}

/// An armed repeating timer. Cancelling (or dropping) it stops further ticks.
pub trait TimerHandle {
    fn cancel(self: Box<Self>);
}

/// Event loop services: timers and local task spawning.
pub trait Runtime {
    fn every(&self, period: Duration, tick: Box<dyn FnMut()>) -> Box<dyn TimerHandle>;
    fn after(&self, delay: Duration, callback: Box<dyn FnOnce()>);
    fn spawn(&self, task: TaskFuture);
    fn now_ms(&self) -> u64;
}

/// How a stream shows that a request is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusyIndicator {
    /// Disable the trigger button and spin its `.refresh-icon`.
    Spinner { trigger: String },
    /// Disable the trigger button and swap its label.
    Label { trigger: String, busy_text: String, idle_text: String },
    /// Show a loading overlay.
    Overlay { overlay: String },
    None,
}

impl BusyIndicator {
    pub fn spinner(trigger: impl Into<String>) -> Self {
        BusyIndicator::Spinner { trigger: trigger.into() }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            BusyIndicator::Spinner { trigger } | BusyIndicator::Label { trigger, .. } => Some(trigger),
            BusyIndicator::Overlay { overlay } => Some(overlay),
            BusyIndicator::None => None,
        }
    }
}

/// A value read from each element matched by [`Surface::read_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field<'a> {
    /// Attribute of the element itself.
    Attribute(&'a str),
    /// Attribute of its first descendant matching `selector`.
    ChildAttribute { selector: &'a str, name: &'a str },
    /// Trimmed text of its first descendant matching `selector`.
    ChildText(&'a str),
}

/// Renderable node tree addressed by CSS selectors.
///
/// Mutations on a selector that matches nothing are silently skipped, the
/// page simply doesn't have that widget.
pub trait Surface {
    fn set_html(&self, selector: &str, html: &str) -> AppResult<()>;
    fn set_text(&self, selector: &str, text: &str) -> AppResult<()>;
    fn set_attribute(&self, selector: &str, name: &str, value: &str) -> AppResult<()>;
    /// Adds or removes `class` on every element matching `selector`.
    fn toggle_class(&self, selector: &str, class: &str, on: bool) -> AppResult<()>;
    fn set_busy(&self, indicator: &BusyIndicator, busy: bool);
    /// One row of `fields` per element matching `selector`, in document order.
    fn read_all(&self, selector: &str, fields: &[Field<'_>]) -> AppResult<Vec<Vec<Option<String>>>>;
}

/// Where toasts live. The notifier decides *when* each call happens.
pub trait NotificationSurface {
    fn mount(&self, notification: &Notification);
    fn reveal(&self, id: NotificationId);
    fn dismiss(&self, id: NotificationId);
    fn remove(&self, id: NotificationId);
}
