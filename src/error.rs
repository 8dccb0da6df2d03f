use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Errors that end an execution quietly, with no result
    pub fn aborts_without_result(&self) -> bool {
        matches!(self, ServiceError::Input(_) | ServiceError::Remote(_))
    }
}
