use serde::Deserialize;
use thiserror::Error;

/// Errors returned by the Supabase HTTP clients.
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("Supabase is not configured: {0} is missing")]
    NotConfigured(&'static str),

    #[error("invalid Supabase URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl SupabaseError {
    /// PostgREST / Postgres error code, when the API returned one.
    pub fn code(&self) -> Option<&str> {
        match self {
            SupabaseError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            SupabaseError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error says the target table or object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404)) || matches!(self.code(), Some("42P01" | "PGRST205"))
    }

    /// Build an API error from a non-success response body.
    ///
    /// Understands PostgREST (`code`/`message`/`details`/`hint`) and Storage
    /// (`statusCode`/`error`/`message`) error documents; anything else is
    /// reported verbatim.
    pub(crate) fn from_body(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            #[serde(default)]
            code: Option<serde_json::Value>,
            #[serde(default)]
            message: Option<String>,
            #[serde(default)]
            error: Option<String>,
            #[serde(default)]
            details: Option<String>,
        }

        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => {
                let message = parsed
                    .message
                    .or(parsed.error)
                    .unwrap_or_else(|| body.to_string());
                let message = match parsed.details {
                    Some(details) if !details.is_empty() => format!("{} ({})", message, details),
                    _ => message,
                };
                let code = parsed.code.map(|c| match c {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                });
                SupabaseError::Api {
                    status,
                    code,
                    message,
                }
            }
            Err(_) => SupabaseError::Api {
                status,
                code: None,
                message: if body.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.to_string()
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgrest_error_body() {
        let err = SupabaseError::from_body(
            404,
            r#"{"code":"42P01","message":"relation \"public.videos\" does not exist","details":null,"hint":null}"#,
        );
        assert_eq!(err.code(), Some("42P01"));
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_storage_error_body() {
        let err = SupabaseError::from_body(
            400,
            r#"{"statusCode":"404","error":"Bucket not found","message":"Bucket not found"}"#,
        );
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("Bucket not found"));
    }

    #[test]
    fn test_plain_text_error_body() {
        let err = SupabaseError::from_body(502, "Bad Gateway");
        assert_eq!(err.to_string(), "API error (HTTP 502): Bad Gateway");
        assert!(!err.is_not_found());
    }
}
