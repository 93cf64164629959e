//! Error types for Latchkey core services.

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// The main error type for Latchkey core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Timer-related error.
    #[error("timer error: {0}")]
    Timer(#[from] TimerError),
}

/// Timer-specific errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    /// The timer ID is invalid, cancelled, or has already fired.
    #[error("invalid or expired timer ID")]
    InvalidTimerId,
}
