use std::fmt;

#[derive(Debug)]
pub enum FinderError {
    Network(reqwest::Error),
    Json(serde_json::Error),
    Status { status: u16, url: String },
    InvalidUrl(String),
    Cache(String),
    InvalidCard(String),
    Io(std::io::Error),
}

impl fmt::Display for FinderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinderError::Network(e) => write!(f, "Network error: {}", e),
            FinderError::Json(e) => write!(f, "JSON parsing error: {}", e),
            FinderError::Status { status, url } => {
                write!(f, "Unexpected HTTP status {} from {}", status, url)
            }
            FinderError::InvalidUrl(e) => write!(f, "Invalid URL: {}", e),
            FinderError::Cache(e) => write!(f, "Cache error: {}", e),
            FinderError::InvalidCard(e) => write!(f, "Invalid card: {}", e),
            FinderError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for FinderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FinderError::Network(e) => Some(e),
            FinderError::Json(e) => Some(e),
            FinderError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FinderError {
    fn from(err: reqwest::Error) -> Self {
        FinderError::Network(err)
    }
}

impl From<serde_json::Error> for FinderError {
    fn from(err: serde_json::Error) -> Self {
        FinderError::Json(err)
    }
}

impl From<std::io::Error> for FinderError {
    fn from(err: std::io::Error) -> Self {
        FinderError::Io(err)
    }
}
