use thiserror::Error;

/// Fatal conditions only. Per-request trouble (a provider timing out, a
/// candidate failing to decode) degrades to an empty list or `None` instead
/// of surfacing here.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(
        "missing contact email: the Wikimedia Commons usage policy requires a contact address in the User-Agent"
    )]
    MissingContactEmail,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ImageError>;
