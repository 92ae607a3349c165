use serde::{Deserialize, Serialize};

/// Body of `POST /analyze`.
///
/// The username comes from the caller's session layer; the gateway trusts it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub username: String,
    #[serde(default)]
    pub text: String,
}

/// JSON error payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    /// Whether the same request may succeed if repeated.
    #[serde(default)]
    pub retryable: bool,
}
