use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tripdesk_core::GatewayError;

/// Wrapper the backend puts around every response body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope {
    #[serde(default)]
    pub value: Value,
    pub success: bool,
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub result_message: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub exception_message: Option<String>,
}

impl ApiEnvelope {
    pub fn ok(value: Value) -> Self {
        Self {
            value,
            success: true,
            status_code: 200,
            result_message: Some("Success".to_owned()),
            error_message: None,
            exception_message: None,
        }
    }

    pub fn failure(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            value: Value::Null,
            success: false,
            status_code,
            result_message: None,
            error_message: Some(message.into()),
            exception_message: None,
        }
    }

    /// Unwraps `value`, raising the backend's `errorMessage` (or `fallback`)
    /// when the call was not successful.
    pub fn into_value<T>(self, fallback: &str) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
    {
        if !self.success {
            return Err(GatewayError::Rejected {
                message: non_blank(self.error_message).unwrap_or_else(|| fallback.to_owned()),
            });
        }
        serde_json::from_value(self.value).map_err(|error| GatewayError::Decode(error.to_string()))
    }
}

/// Decodes a raw response into the operation's payload.
pub fn decode_response<T>(status: u16, body: &[u8], fallback: &str) -> Result<T, GatewayError>
where
    T: DeserializeOwned,
{
    if !(200..300).contains(&status) {
        let message = serde_json::from_slice::<ApiEnvelope>(body)
            .ok()
            .and_then(|envelope| non_blank(envelope.error_message))
            .unwrap_or_else(|| format!("HTTP error! status: {status}"));
        return Err(GatewayError::Http { status, message });
    }

    let envelope: ApiEnvelope = serde_json::from_slice(body)
        .map_err(|error| GatewayError::Decode(format!("malformed envelope: {error}")))?;
    envelope.into_value(fallback)
}

fn non_blank(message: Option<String>) -> Option<String> {
    message.filter(|message| !message.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use tripdesk_core::GatewayError;

    use super::{decode_response, ApiEnvelope};

    #[test]
    fn successful_envelope_yields_value() {
        let body = json!({
            "value": {"total": 3},
            "success": true,
            "statusCode": 200,
            "resultMessage": "Success",
            "errorMessage": null,
            "exceptionMessage": null
        });
        let decoded: serde_json::Value =
            decode_response(200, body.to_string().as_bytes(), "Failed to fetch booking")
                .expect("decode");
        assert_eq!(decoded, json!({"total": 3}));
    }

    #[test]
    fn unsuccessful_envelope_prefers_backend_message() {
        let body = serde_json::to_vec(&ApiEnvelope::failure(200, "Booking already submitted"))
            .expect("encode");
        let error = decode_response::<serde_json::Value>(200, &body, "Failed to update booking selections")
            .expect_err("rejected");
        assert_eq!(error, GatewayError::Rejected { message: "Booking already submitted".to_owned() });
    }

    #[test]
    fn unsuccessful_envelope_without_message_uses_fallback() {
        let body = json!({"value": null, "success": false, "statusCode": 200, "errorMessage": "  "});
        let error = decode_response::<serde_json::Value>(
            200,
            body.to_string().as_bytes(),
            "Failed to deactivate booking",
        )
        .expect_err("rejected");
        assert_eq!(error.to_string(), "Failed to deactivate booking");
    }

    #[test]
    fn http_failure_surfaces_envelope_message_or_status() {
        let body = serde_json::to_vec(&ApiEnvelope::failure(409, "Version conflict")).expect("encode");
        let error = decode_response::<serde_json::Value>(409, &body, "unused").expect_err("conflict");
        assert_eq!(error, GatewayError::Http { status: 409, message: "Version conflict".to_owned() });

        let error = decode_response::<serde_json::Value>(502, b"<html>bad gateway</html>", "unused")
            .expect_err("bad gateway");
        assert_eq!(
            error,
            GatewayError::Http { status: 502, message: "HTTP error! status: 502".to_owned() }
        );
    }

    #[test]
    fn malformed_success_body_is_a_decode_error() {
        let error = decode_response::<serde_json::Value>(200, b"not json", "unused")
            .expect_err("malformed");
        assert!(matches!(error, GatewayError::Decode(_)));
    }
}
