//! Remote embedding service clients.

use reqwest::blocking::Response;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{RagError, Result};

pub mod huggingface;
pub mod openai;

pub use huggingface::HuggingFaceEmbedder;
pub use openai::OpenAiEmbedder;

/// JSON headers carrying a bearer token; an empty token is a configuration error.
pub(crate) fn bearer_headers(token: &str, service: &str) -> Result<HeaderMap> {
    let token = token.trim();
    if token.is_empty() {
        return Err(RagError::config(format!("missing {service} API token")));
    }
    let mut headers = HeaderMap::new();
    let auth = format!("Bearer {token}");
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&auth)
            .map_err(|_| RagError::config(format!("invalid {service} API token")))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Describes a non-success response as `"<status>: <body>"`.
pub(crate) fn describe_failure(response: Response) -> String {
    let status = response.status();
    let body = response
        .text()
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    format!("{status}: {}", body.trim())
}
