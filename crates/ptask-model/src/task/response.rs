use std::fmt;

use serde::{Deserialize, Serialize};

/// Successful firing; nothing is reported upstream.
pub const CODE_OK: u16 = 200;
/// Synthesized when a firing exceeds its timeout.
pub const CODE_TIMEOUT: u16 = 408;
/// Synthesized when an executor fails with an error or panics.
pub const CODE_INTERNAL: u16 = 500;

/// Outcome of one `run_once` call, using HTTP-like status codes.
///
/// Only `200` counts as success. The code is taken at face value: a `200` whose
/// message describes a failure is still a success as far as reporting goes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub code: u16,
    pub message: String,
}

impl Response {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(CODE_OK, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(CODE_TIMEOUT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(CODE_INTERNAL, message)
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.code == CODE_OK
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_200_is_success() {
        assert!(Response::ok("fine").is_success());
        assert!(!Response::timeout("slow").is_success());
        assert!(!Response::internal("boom").is_success());
        assert!(!Response::new(404, "gone").is_success());
    }

    #[test]
    fn code_is_taken_at_face_value() {
        let r = Response::ok("failed to reach cluster");
        assert!(r.is_success());
    }

    #[test]
    fn display_shows_code_and_message() {
        assert_eq!(Response::timeout("late").to_string(), "408: late");
    }
}
