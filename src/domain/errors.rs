use derive_more::Display;

/// Failure below the envelope: the request never produced a readable JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum TransportError {
    #[display(fmt = "{}", _0)]
    Request(String),
    #[display(fmt = "HTTP {} {}", status, status_text)]
    Status { status: u16, status_text: String },
    #[display(fmt = "invalid JSON response: {}", _0)]
    Decode(String),
}

impl std::error::Error for TransportError {}

/// Application error. The `Display` text is what ends up in an error toast.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum AppError {
    #[display(fmt = "Network error: {}", _0)]
    Transport(TransportError),
    #[display(fmt = "Refresh failed: {}", _0)]
    Server(String),
    #[display(fmt = "Unexpected payload: {}", _0)]
    Payload(String),
    #[display(fmt = "DOM error: {}", _0)]
    Dom(String),
    #[display(fmt = "Invalid page config: {}", _0)]
    Config(String),
}

impl AppError {
    /// The message without its kind prefix, for in-page error blocks.
    pub fn detail(&self) -> String {
        match self {
            AppError::Transport(err) => err.to_string(),
            AppError::Server(msg)
            | AppError::Payload(msg)
            | AppError::Dom(msg)
            | AppError::Config(msg) => msg.clone(),
        }
    }
}

impl std::error::Error for AppError {}

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        AppError::Transport(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Payload(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
