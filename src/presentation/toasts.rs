use leptos::*;

use crate::application::ports::NotificationSurface;
use crate::domain::{Notification, NotificationId, ToastPhase};

/// Inline style of one toast in the given phase.
pub fn toast_style(background: &str, phase: ToastPhase) -> String {
    let (opacity, offset) = match phase {
        ToastPhase::Visible => (1, "0"),
        ToastPhase::Entering | ToastPhase::Leaving => (0, "100%"),
    };
    format!(
        "background: {background}; color: white; padding: 12px 20px; border-radius: 4px; \
         box-shadow: 0 2px 8px rgba(0, 0, 0, 0.15); max-width: 350px; word-wrap: break-word; \
         opacity: {opacity}; transform: translateX({offset}); transition: all 0.3s ease;"
    )
}

#[derive(Clone)]
struct Toast {
    id: NotificationId,
    message: String,
    background: &'static str,
    phase: RwSignal<ToastPhase>,
}

/// Top-right column of toasts; each one animates on its own phase signal.
#[component]
fn NotificationStack(toasts: RwSignal<Vec<Toast>>) -> impl IntoView {
    view! {
        <div
            class="notification-stack"
            style="position: fixed; top: 20px; right: 20px; z-index: 10000; display: flex; flex-direction: column; gap: 10px;"
        >
            <For
                each=move || toasts.get()
                key=|toast| toast.id
                children=move |toast| {
                    let Toast { message, background, phase, .. } = toast;
                    view! {
                        <div class="notification" style=move || toast_style(background, phase.get())>
                            {message}
                        </div>
                    }
                }
            />
        </div>
    }
}

/// [`NotificationSurface`] rendered by leptos into `<body>`.
pub struct LeptosNotificationSurface {
    toasts: RwSignal<Vec<Toast>>,
}

impl LeptosNotificationSurface {
    pub fn mount() -> Self {
        let toasts = create_rw_signal(Vec::<Toast>::new());
        mount_to_body(move || view! { <NotificationStack toasts=toasts/> });
        Self { toasts }
    }

    fn set_phase(&self, id: NotificationId, phase: ToastPhase) {
        let signal = self
            .toasts
            .with_untracked(|toasts| toasts.iter().find(|t| t.id == id).map(|t| t.phase));
        if let Some(signal) = signal {
            signal.set(phase);
        }
    }
}

impl NotificationSurface for LeptosNotificationSurface {
    fn mount(&self, notification: &Notification) {
        let toast = Toast {
            id: notification.id,
            message: notification.message.clone(),
            background: notification.severity.color(),
            phase: create_rw_signal(ToastPhase::Entering),
        };
        self.toasts.update(|toasts| toasts.push(toast));
    }

    fn reveal(&self, id: NotificationId) {
        self.set_phase(id, ToastPhase::Visible);
    }

    fn dismiss(&self, id: NotificationId) {
        self.set_phase(id, ToastPhase::Leaving);
    }

    fn remove(&self, id: NotificationId) {
        self.toasts.update(|toasts| toasts.retain(|t| t.id != id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;

    #[test]
    fn only_visible_toasts_are_opaque() {
        let color = Severity::Warning.color();
        assert!(toast_style(color, ToastPhase::Visible).contains("opacity: 1; transform: translateX(0);"));
        assert!(toast_style(color, ToastPhase::Entering).contains("opacity: 0; transform: translateX(100%);"));
        assert_eq!(toast_style(color, ToastPhase::Entering), toast_style(color, ToastPhase::Leaving));
        assert!(toast_style(color, ToastPhase::Leaving).starts_with("background: #ffc107;"));
    }
}
