use std::time::Duration;

use strum::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    #[default]
    Info,
    Warning,
}

impl Severity {
    /// Unrecognized names fall back to `Info`.
    pub fn parse_or_info(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }

    pub fn color(self) -> &'static str {
        match self {
            Severity::Success => "#28a745",
            Severity::Error => "#dc3545",
            Severity::Info => "#17a2b8",
            Severity::Warning => "#ffc107",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display(fmt = "notification#{}", _0)]
pub struct NotificationId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
    pub created_at: u64,
}

/// On-screen state of a mounted toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastPhase {
    /// Mounted, still transparent and off to the right.
    Entering,
    Visible,
    /// Fading out, removal pending.
    Leaving,
}

/// Toast lifecycle, measured from creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationTiming {
    /// Hidden -> visible.
    pub entry_delay: Duration,
    /// Creation -> start of fade-out.
    pub hold: Duration,
    /// Fade-out -> removal.
    pub fade_out: Duration,
}

impl NotificationTiming {
    pub const fn total(&self) -> Duration {
        self.hold.saturating_add(self.fade_out)
    }
}

impl Default for NotificationTiming {
    fn default() -> Self {
        Self {
            entry_delay: Duration::from_millis(100),
            hold: Duration::from_millis(3000),
            fade_out: Duration::from_millis(300),
        }
    }
}
