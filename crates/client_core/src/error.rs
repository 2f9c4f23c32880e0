use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{endpoint} returned {status}")]
    BadStatus {
        endpoint: String,
        status: StatusCode,
    },
    #[error("malformed {resource}: {source}")]
    Decode {
        resource: String,
        source: serde_json::Error,
    },
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("item name is empty; cannot address its metadata")]
    EmptyItemName,
    #[error("Please select an item first!")]
    NoSelection,
    #[error("parameters for '{item}' are still loading")]
    SelectionPending { item: String },
    #[error("not connected to a table server")]
    NotConnected,
    #[error("invalid client settings: {0}")]
    Settings(String),
}

impl ClientError {
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::BadStatus { .. } | Self::NotConnected
        )
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
