use serde_json::Value;
use thiserror::Error;

use crate::document::ErrorObject;

/// Result type for Fastly API calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors raised by the Fastly TLS API client
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Fastly API transport error - {url} - {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Fastly API returned an unreadable response - {url} - {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}", render_http_error(.url, .status, .status_text, .body))]
    Http {
        url: String,
        status: u16,
        status_text: String,
        /// Decoded response body, when it was valid JSON
        body: Option<Value>,
    },
}

impl ApiError {
    /// HTTP status of a remote rejection
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Every entry of the structured `errors` list of a remote rejection
    pub fn error_entries(&self) -> Vec<ErrorObject> {
        match self {
            ApiError::Http { body: Some(body), .. } => error_entries(body),
            _ => Vec::new(),
        }
    }
}

fn error_entries(body: &Value) -> Vec<ErrorObject> {
    body.get("errors")
        .and_then(|errors| serde_json::from_value::<Vec<ErrorObject>>(errors.clone()).ok())
        .unwrap_or_default()
}

fn render_http_error(url: &str, status: &u16, status_text: &str, body: &Option<Value>) -> String {
    let mut message = format!(
        "Fastly API request error - {} - code: {} {}",
        url, status, status_text
    );
    if let Some(body) = body {
        for entry in error_entries(body) {
            message.push('\n');
            message.push_str(&entry.to_string());
        }
    }
    message.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rejection(body: Option<Value>) -> ApiError {
        ApiError::Http {
            url: "https://api.fastly.com/tls/subscriptions".to_string(),
            status: 422,
            status_text: "Unprocessable Entity".to_string(),
            body,
        }
    }

    #[test]
    fn test_http_error_lists_every_entry() {
        let error = rejection(Some(json!({
            "errors": [
                {"title": "Invalid domain", "detail": "www.example.org is not on an active service"},
                {"title": "Plan limit", "detail": "No TLS domains left on this plan"}
            ]
        })));

        assert_eq!(
            error.to_string(),
            "Fastly API request error - https://api.fastly.com/tls/subscriptions - code: 422 Unprocessable Entity\n\
             Invalid domain - www.example.org is not on an active service\n\
             Plan limit - No TLS domains left on this plan"
        );
        assert_eq!(error.error_entries().len(), 2);
        assert_eq!(error.status(), Some(422));
    }

    #[test]
    fn test_http_error_without_body() {
        let error = rejection(None);
        assert_eq!(
            error.to_string(),
            "Fastly API request error - https://api.fastly.com/tls/subscriptions - code: 422 Unprocessable Entity"
        );
        assert!(error.error_entries().is_empty());
    }

    #[test]
    fn test_http_error_with_unstructured_body() {
        let error = rejection(Some(json!({"msg": "nope"})));
        assert!(error.error_entries().is_empty());
        assert!(!error.to_string().contains('\n'));
    }
}
