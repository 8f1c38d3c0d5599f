use thiserror::Error;

/// Generator-boundary failures. All recoverable: the correction loop
/// consumes each as one failed attempt.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("generator timed out")]
    Timeout,

    #[error("generator unavailable: {0}")]
    Unavailable(String),

    #[error("generator authentication failed")]
    Auth,

    #[error("generator protocol error: {0}")]
    Protocol(String),
}
