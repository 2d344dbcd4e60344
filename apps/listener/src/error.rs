use thiserror::Error;

use canvas_studio_core::errors::Error as CoreError;

#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("Missing required setting {0}")]
    MissingSetting(&'static str),
    #[error("Invalid value for {name}: {value}")]
    InvalidSetting { name: &'static str, value: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Firebase returned {status} for {path}")]
    Status { status: u16, path: String },
    #[error("Change feed closed: {0}")]
    FeedClosed(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ListenerResult<T> = Result<T, ListenerError>;
