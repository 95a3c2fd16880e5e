use thiserror::Error;

/// Failure modes of a single poll. None of these are fatal; the coordinator
/// logs them and retries on the next eligible tick.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The meter did not answer within the configured receive timeout.
    #[error("Timeout - No response from meter")]
    Timeout,

    /// Socket-level failure sending the request or receiving the reply.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The reply arrived but could not be decoded as a meter frame.
    #[error("decode error: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout)
    }
}
