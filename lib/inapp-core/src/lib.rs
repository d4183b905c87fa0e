use thiserror::Error;

pub mod bridge;
pub mod config;
pub mod coordinator;
pub mod geometry;
pub mod message;
pub mod paths;
pub mod platform;
pub mod retry;

pub use config::Config;
pub use coordinator::{DisplayContext, DisplayCoordinator, Phase, ShowHandle, ShowOutcome};
pub use message::{Message, MessageContent, Position};

use config::ConfigError;
use platform::SurfaceError;

pub fn version() -> &'static str {
    option_env!("VERSION").unwrap_or("v0.0.0-dev")
}

#[derive(Debug, Error)]
pub enum InAppError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("The UI thread dropped a task before running it")]
    UiThreadGone,
    #[error("Show task failed: {0}")]
    Task(String),
}

pub type InAppResult<T> = Result<T, InAppError>;
