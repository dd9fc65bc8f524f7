use thiserror::Error;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("unknown stage '{0}'")]
    UnknownStage(String),
    #[error("failed to parse stage: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize stage: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("stage '{stage}': {reason}")]
    Invalid { stage: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssetError {
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("failed to decode {url}: {reason}")]
    Decode { url: String, reason: String },
    #[error("load was cancelled before it finished")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    #[error("sound '{0}' is still loading")]
    NotReady(String),
    #[error("unknown sound '{0}'")]
    Unknown(String),
    #[error("audio backend error: {0}")]
    Backend(String),
}
