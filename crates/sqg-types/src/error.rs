use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqgError {
    #[error("Unsupported grid size Nx={nx}, expected one of {supported:?}")]
    UnsupportedResolution {
        nx: usize,
        supported: &'static [usize],
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Trajectory store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SqgResult<T> = Result<T, SqgError>;
