use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Browser configuration rejected: {0}")]
    BadConfig(String),

    #[error("Browser error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("Navigation timed out after {0:?}")]
    NavigationTimeout(std::time::Duration),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, RenderError>;
