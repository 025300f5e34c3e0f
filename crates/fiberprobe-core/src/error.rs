use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("no search criteria configured")]
    ConfigMissing,

    #[error("root element not found for selector: {0}")]
    RootNotFound(String),

    #[error("render graph entry point not found on root element")]
    EntryPointNotFound,

    #[error("property access denied: {0}")]
    AccessDenied(String),

    #[error("retries exhausted after {0} attempts")]
    RetriesExhausted(u32),

    #[error("invalid criterion: {0}")]
    InvalidCriterion(String),

    #[error("call failed: {0}")]
    CallFailed(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProbeError>;
