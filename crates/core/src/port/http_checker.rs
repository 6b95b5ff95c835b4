// HTTP Checker Port
// One GET against a URL, reporting the status code

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// HTTP check errors (transport level; any status code is a successful check)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpCheckError {
    #[error("HTTP request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP transport error: {0}")]
    Transport(String),
}

/// HTTP Checker trait
#[async_trait]
pub trait HttpChecker: Send + Sync {
    /// GET `url` within `timeout` and return the final status code
    async fn get_status(&self, url: &str, timeout: Duration) -> Result<u16, HttpCheckError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;

    /// Mock HTTP checker behavior
    #[derive(Debug, Clone)]
    pub enum MockHttpBehavior {
        Status(u16),
        Error(HttpCheckError),
        /// Panic inside the check (for fault isolation testing)
        Panic(String),
    }

    pub struct MockHttpChecker {
        behavior: MockHttpBehavior,
    }

    impl MockHttpChecker {
        pub fn new(behavior: MockHttpBehavior) -> Self {
            Self { behavior }
        }

        pub fn status(code: u16) -> Self {
            Self::new(MockHttpBehavior::Status(code))
        }
    }

    #[async_trait]
    impl HttpChecker for MockHttpChecker {
        async fn get_status(&self, _url: &str, _timeout: Duration) -> Result<u16, HttpCheckError> {
            match &self.behavior {
                MockHttpBehavior::Status(code) => Ok(*code),
                MockHttpBehavior::Error(e) => Err(e.clone()),
                MockHttpBehavior::Panic(msg) => panic!("{}", msg),
            }
        }
    }
}
