use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown stage name: {0}")]
    UnknownStepName(String),
    #[error("unknown file role: {0}")]
    UnknownFileRole(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
