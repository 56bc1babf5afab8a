use thiserror::Error;

// * Unified Error type for the Network Layer.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Blocked page detected: {0}")]
    SoftBan(String),

    #[error("HTTP {0} Forbidden/Blocked")]
    HardBan(u16),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("No readable text on page")]
    NoContent,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    // * Short label for log fields and metric tags
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Reqwest(e) if e.is_timeout() => "timeout",
            Self::Reqwest(_) => "request",
            Self::SoftBan(_) => "soft_ban",
            Self::HardBan(_) => "hard_ban",
            Self::Status(_) => "status",
            Self::NoContent => "no_content",
            Self::InvalidUrl(_) => "invalid_url",
        }
    }
}
