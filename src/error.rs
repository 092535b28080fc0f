use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OddsError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("upstream {endpoint} returned http {status}: {body}")]
    Upstream {
        status: StatusCode,
        endpoint: String,
        body: String,
    },

    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid upstream json: {0}")]
    Decode(serde_json::Error),

    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid include pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl OddsError {
    /// True for failures attributable to the upstream API rather than local state.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            OddsError::Upstream { .. } | OddsError::Transport(_) | OddsError::Decode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, OddsError>;
