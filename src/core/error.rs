use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrewlogError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Store error: {0}")]
    Store(#[from] crate::db::StoreError),

    #[error("Rewrite error: {0}")]
    Rewrite(#[from] crate::lookup::rewrite::RewriteError),

    #[error("Deletion error: {0}")]
    Deletion(#[from] crate::lookup::deletion::DeletionError),

    #[error("Validation error: {0}")]
    Validation(#[from] crate::lookup::models::InvalidLookup),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<config::ConfigError> for BrewlogError {
    fn from(e: config::ConfigError) -> Self {
        Self::Configuration(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BrewlogError>;
