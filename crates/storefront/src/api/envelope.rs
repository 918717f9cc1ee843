//! Response envelope shared by every backend endpoint.

use serde::Deserialize;

/// `{ "success": bool, "message": string?, "data": T? }`
#[derive(Debug, Deserialize)]
pub(super) struct ApiEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

const fn default_success() -> bool {
    true
}

/// Keep error bodies short enough for a log line.
pub(super) fn truncate(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

/// Pull a human-readable message out of an error body, falling back to the
/// raw text.
pub(super) fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiEnvelope<serde::de::IgnoredAny>>(body)
        .ok()
        .and_then(|envelope| envelope.message)
        .unwrap_or_else(|| truncate(body, 200))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_with_data() {
        let envelope: ApiEnvelope<Vec<u32>> =
            serde_json::from_str(r#"{"success":true,"message":"ok","data":[1,2]}"#).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data, Some(vec![1, 2]));
    }

    #[test]
    fn test_envelope_without_data() {
        let envelope: ApiEnvelope<Vec<u32>> =
            serde_json::from_str(r#"{"success":false,"message":"Customer not found"}"#).unwrap();
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.message.as_deref(), Some("Customer not found"));
    }

    #[test]
    fn test_error_message_prefers_envelope() {
        assert_eq!(
            error_message(r#"{"success":false,"message":"Failed to add to cart: Product not found"}"#),
            "Failed to add to cart: Product not found"
        );
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }
}
