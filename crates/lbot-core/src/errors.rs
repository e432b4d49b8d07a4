/// Core error type for the link bot.
///
/// Adapter crates should map their specific errors into this type so the
/// consumer loop can log every failure the same way.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("no saved pages")]
    NotFound,

    #[error("unknown event kind")]
    UnknownEventKind,

    #[error("event carries no addressing metadata")]
    MalformedMeta,
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
