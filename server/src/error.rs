use serde::Serialize;
use thiserror::Error;
use warp::http::StatusCode;

/// Errors raised by the lookup pipeline components.
#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("geocoding provider error: {0}")]
    Provider(String),
    #[error("transform error: {0}")]
    Transform(String),
    #[error("no turbines to search")]
    Empty,
}

impl From<reqwest::Error> for LocatorError {
    fn from(e: reqwest::Error) -> Self {
        LocatorError::Provider(e.to_string())
    }
}

impl From<csv::Error> for LocatorError {
    fn from(e: csv::Error) -> Self {
        LocatorError::Parse(e.to_string())
    }
}

/// A terminal request failure: what the client sees, and what goes to the log.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub status: StatusCode,
    pub public: String,
    pub detail: String,
}

impl Failure {
    pub fn bad_request(public: &str, detail: impl Into<String>) -> Self {
        Failure {
            status: StatusCode::BAD_REQUEST,
            public: public.to_string(),
            detail: detail.into(),
        }
    }

    pub fn internal(public: &str, detail: impl Into<String>) -> Self {
        Failure {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            public: public.to_string(),
            detail: detail.into(),
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            success: false,
            error: self.public.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_body_hides_detail() {
        let failure = Failure::internal("Something broke.", "socket closed by peer");
        let json = serde_json::to_value(failure.body()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "error": "Something broke."})
        );
    }

    #[test]
    fn test_failure_status() {
        assert_eq!(
            Failure::bad_request("a", "b").status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Failure::internal("a", "b").status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
