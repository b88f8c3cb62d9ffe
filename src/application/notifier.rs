use std::cell::Cell;
use std::rc::Rc;

use crate::application::ports::{NotificationSurface, Runtime};
use crate::domain::logging::LogComponent;
use crate::domain::{Notification, NotificationId, NotificationTiming, Severity};
use crate::log_debug;

/// Shared toast notifier.
///
/// Every call produces a new toast: no deduplication and no throttling.
/// Each toast is revealed after `entry_delay`, starts fading at `hold` and
/// is removed `fade_out` later.
pub struct Notifier {
    surface: Rc<dyn NotificationSurface>,
    runtime: Rc<dyn Runtime>,
    timing: NotificationTiming,
    next_id: Cell<u64>,
}

impl Notifier {
    pub fn new(surface: Rc<dyn NotificationSurface>, runtime: Rc<dyn Runtime>) -> Self {
        Self::with_timing(surface, runtime, NotificationTiming::default())
    }

    pub fn with_timing(
        surface: Rc<dyn NotificationSurface>,
        runtime: Rc<dyn Runtime>,
        timing: NotificationTiming,
    ) -> Self {
        Self { surface, runtime, timing, next_id: Cell::new(1) }
    }

    pub fn timing(&self) -> NotificationTiming {
        self.timing
    }

    pub fn notify(&self, message: impl Into<String>, severity: Severity) -> NotificationId {
        let id = NotificationId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let notification = Notification {
            id,
            message: message.into(),
            severity,
            created_at: self.runtime.now_ms(),
        };
        log_debug!(
            LogComponent::Application("Notifier"),
            "[{}] {}: {}",
            severity,
            id,
            notification.message
        );
        self.surface.mount(&notification);

        let surface = Rc::clone(&self.surface);
        self.runtime.after(self.timing.entry_delay, Box::new(move || surface.reveal(id)));

        let surface = Rc::clone(&self.surface);
        let runtime = Rc::clone(&self.runtime);
        let fade_out = self.timing.fade_out;
        self.runtime.after(
            self.timing.hold,
            Box::new(move || {
                surface.dismiss(id);
                runtime.after(fade_out, Box::new(move || surface.remove(id)));
            }),
        );

        id
    }

    pub fn success(&self, message: impl Into<String>) -> NotificationId {
        self.notify(message, Severity::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> NotificationId {
        self.notify(message, Severity::Error)
    }

    pub fn info(&self, message: impl Into<String>) -> NotificationId {
        self.notify(message, Severity::Info)
    }

    pub fn warning(&self, message: impl Into<String>) -> NotificationId {
        self.notify(message, Severity::Warning)
    }
}
