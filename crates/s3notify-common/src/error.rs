use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("failed to serialize webhook payload: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to reach webhook endpoint: {}", source_chain(.0))]
    Transport(#[source] BoxError),
    #[error("webhook returned unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("invalid event document: {0}")]
    InvalidEvent(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl NotifyError {
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Transport(err.into())
    }

    /// Stable label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Serialization(_) => "serialization",
            Self::Transport(_) => "transport",
            Self::UnexpectedStatus { .. } => "unexpected_status",
            Self::InvalidEvent(_) => "invalid_event",
            Self::Io(_) => "io",
        }
    }
}

/// `outer: cause: root cause`. HTTP client errors keep the interesting part
/// (timeout, refused connection, dns) in their sources.
fn source_chain(err: &BoxError) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

pub type Result<T> = std::result::Result<T, NotifyError>;
