use http::StatusCode;
use serde_json::Value;

/// Cap on error text lifted from a response body.
const MAX_MESSAGE_CHARS: usize = 300;

/// Human guidance attached to API errors by status code.
pub fn guidance_for(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "Check the request parameters and body for invalid or missing values.",
        401 => "The token was rejected. Verify the service account credentials and that it may call Privilege Cloud APIs.",
        403 => "The service account lacks permission for this operation. Check its safe membership and Privilege Cloud roles.",
        404 => "The resource does not exist or is not visible to the service account. Verify the id or name.",
        409 => "The resource already exists or conflicts with its current state.",
        429 => "Privilege Cloud is rate limiting requests. Wait before retrying.",
        500..=599 => "Privilege Cloud reported a server error. Retry later and contact CyberArk support if it persists.",
        _ => "Unexpected response from Privilege Cloud.",
    }
}

/// Best-effort error text from a response body.
///
/// Understands the vault's `{"ErrorCode": .., "ErrorMessage": ..}` shape and
/// the usual `message` / `error_description` fields, falling back to the raw
/// body and finally the status reason.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        let message = ["ErrorMessage", "Details", "message", "error_description", "error"]
            .iter()
            .find_map(|key| json.get(*key).and_then(Value::as_str).map(str::to_owned))?;
        match json.get("ErrorCode").and_then(Value::as_str) {
            Some(code) => Some(format!("{} ({})", message, code)),
            None => Some(message),
        }
    });

    let message = from_json
        .or_else(|| Some(body.trim().to_owned()).filter(|text| !text.is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("no response body").to_owned());
    message.chars().take(MAX_MESSAGE_CHARS).collect()
}
