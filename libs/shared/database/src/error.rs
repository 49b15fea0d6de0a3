use serde::Deserialize;
use thiserror::Error;

/// SQLSTATE raised by Postgres when a row violates an exclusion constraint.
pub const EXCLUSION_VIOLATION: &str = "23P01";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),
}

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

impl DatabaseError {
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<PostgrestErrorBody>(body) {
            Ok(parsed) => {
                let message = match (parsed.message, parsed.details) {
                    (Some(message), Some(details)) => format!("{} ({})", message, details),
                    (Some(message), None) => message,
                    (None, _) => body.to_string(),
                };
                DatabaseError::Api { status, code: parsed.code, message }
            }
            Err(_) => DatabaseError::Api {
                status,
                code: None,
                message: body.to_string(),
            },
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            DatabaseError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn is_exclusion_violation(&self) -> bool {
        self.code() == Some(EXCLUSION_VIOLATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_postgrest_error_body() {
        let body = r#"{"code":"23P01","details":"Key conflicts with existing key.","hint":null,"message":"conflicting key value violates exclusion constraint"}"#;
        let err = DatabaseError::from_response(409, body);

        assert!(err.is_exclusion_violation());
        assert_matches!(err, DatabaseError::Api { status: 409, ref message, .. } if message.contains("exclusion constraint"));
    }

    #[test]
    fn keeps_raw_body_when_not_json() {
        let err = DatabaseError::from_response(502, "Bad Gateway");

        assert!(!err.is_exclusion_violation());
        assert_matches!(err, DatabaseError::Api { status: 502, code: None, ref message } if message == "Bad Gateway");
    }
}
