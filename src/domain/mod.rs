pub mod envelope;
pub mod errors;
pub mod logging;
pub mod notification;
pub mod records;
pub mod stream;

pub use envelope::Envelope;
pub use errors::{AppError, AppResult, TransportError};
pub use notification::{Notification, NotificationId, NotificationTiming, Severity, ToastPhase};
pub use stream::{ApiRequest, Endpoint, StreamKey, ViewKey};
