use thiserror::Error;
use wb_05_session::SessionError;

use crate::config::ConfigError;

/// Failures of the service manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The P2P session could not be initialised.
    #[error("Session initialization failed: {0}")]
    Session(#[from] SessionError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `cleanup()` ran while initialisation was still in progress.
    #[error("Initialization cancelled by cleanup")]
    Cancelled,
}
