//! The `{code, message, data}` wrapper every REST response is sent in.

use crate::error::HttpError;
use serde::{Deserialize, Serialize};

/// Envelope code of a successful response.
pub const SUCCESS_CODE: i32 = 200;

/// Used when a non-2xx body is not JSON.
pub const GENERIC_ERROR_MESSAGE: &str = "An unknown error occurred";

/// Used when a non-2xx JSON body has no `message`.
pub const REQUEST_FAILED_MESSAGE: &str = "API request failed";

/// Used when a failed login response has no `message`.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";

/// Standard response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: i32,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Fails with `ApplicationFailure` when `code != 200`. The payload may still be absent.
    pub fn into_result(self) -> Result<Option<T>, HttpError> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(HttpError::ApplicationFailure {
                code: self.code,
                message: self
                    .message
                    .unwrap_or_else(|| REQUEST_FAILED_MESSAGE.to_string()),
            })
        }
    }

    /// Like [`into_result`](Self::into_result), but a missing payload is a decode error.
    pub fn into_data(self) -> Result<T, HttpError> {
        self.into_result()?
            .ok_or_else(|| HttpError::Decode("response envelope has no data".to_string()))
    }
}

/// Body of a non-2xx response, when it is JSON at all.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// How a non-2xx body is turned into a failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureFallback {
    /// Authenticated API calls: generic text for non-JSON bodies.
    Api,
    /// Login: anything without a server message reads "Login failed".
    Login,
}

impl FailureFallback {
    pub fn message(self, body: &str) -> String {
        let (missing, unparseable) = match self {
            FailureFallback::Api => (REQUEST_FAILED_MESSAGE, GENERIC_ERROR_MESSAGE),
            FailureFallback::Login => (LOGIN_FAILED_MESSAGE, LOGIN_FAILED_MESSAGE),
        };
        // Any JSON counts as parsed; only an object can carry a message.
        let value = match serde_json::from_str::<serde_json::Value>(body) {
            Ok(value) => value,
            Err(_) => return unparseable.to_string(),
        };
        match serde_json::from_value::<ErrorBody>(value) {
            Ok(ErrorBody { message: Some(m) }) if !m.is_empty() => m,
            _ => missing.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_yields_data() {
        let env: Envelope<Vec<u32>> =
            serde_json::from_str(r#"{"code":200,"message":"success","data":[1,2]}"#).unwrap();
        assert!(env.is_success());
        assert_eq!(env.into_data().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_non_success_code_is_application_failure() {
        let env: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"code":1001,"message":"Insufficient balance","data":null}"#)
                .unwrap();
        match env.into_result() {
            Err(HttpError::ApplicationFailure { code, message }) => {
                assert_eq!(code, 1001);
                assert_eq!(message, "Insufficient balance");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_missing_data_is_decode_error_only_when_required() {
        let env: Envelope<u32> = serde_json::from_str(r#"{"code":200}"#).unwrap();
        assert!(matches!(env.clone().into_result(), Ok(None)));
        assert!(matches!(env.into_data(), Err(HttpError::Decode(_))));
    }

    #[test]
    fn test_failure_message_fallbacks() {
        let api = FailureFallback::Api;
        assert_eq!(api.message(r#"{"message":"Token expired"}"#), "Token expired");
        assert_eq!(api.message(r#"{"code":500}"#), REQUEST_FAILED_MESSAGE);
        assert_eq!(api.message("<html>Bad Gateway</html>"), GENERIC_ERROR_MESSAGE);
        assert_eq!(api.message(""), GENERIC_ERROR_MESSAGE);
        assert_eq!(api.message(r#""oops""#), REQUEST_FAILED_MESSAGE);
        assert_eq!(api.message("[]"), REQUEST_FAILED_MESSAGE);
        assert_eq!(api.message(r#"{"message":42}"#), REQUEST_FAILED_MESSAGE);

        let login = FailureFallback::Login;
        assert_eq!(login.message(r#"{"message":"Invalid credentials"}"#), "Invalid credentials");
        assert_eq!(login.message("{}"), LOGIN_FAILED_MESSAGE);
        assert_eq!(login.message("oops"), LOGIN_FAILED_MESSAGE);
    }
}
