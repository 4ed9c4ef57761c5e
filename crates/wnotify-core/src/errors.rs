/// Core error type for the weather notifier.
///
/// Adapter crates map their specific failures into this type so the poller and
/// the HTTP layer can decide consistently what is fatal and what is not.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("delivery via {channel} failed: {reason}")]
    Delivery { channel: String, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn delivery(channel: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Delivery {
            channel: channel.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
