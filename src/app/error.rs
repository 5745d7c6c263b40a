use thiserror::Error;

#[derive(Error, Debug)]
pub enum TributaryError {
    #[error("{0}")]
    Usage(String),

    #[error("unexpected status code: {0}")]
    UnexpectedStatus(u16),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("feed task failed: {0}")]
    Task(String),
}

impl TributaryError {
    /// Classifies a reqwest failure, keeping timeouts apart from other
    /// transport errors.
    pub fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, TributaryError>;
