use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SmokeError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Server not reachable at {0}")]
    ServerUnavailable(String),

    #[error("Verification failed: {0}")]
    VerificationFailed(String),
}

impl SmokeError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            SmokeError::VerificationFailed(_) => 1,
            SmokeError::InvalidConfig(_) | SmokeError::ServerUnavailable(_) => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(SmokeError::VerificationFailed("none".into()).exit_code(), 1);
        assert_eq!(SmokeError::InvalidConfig("bad".into()).exit_code(), 2);
        assert_eq!(
            SmokeError::ServerUnavailable("http://localhost:8080/".into()).exit_code(),
            2
        );
    }

    #[test]
    fn test_display() {
        let err = SmokeError::InvalidConfig("card_selector must not be empty".into());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: card_selector must not be empty"
        );
    }
}
