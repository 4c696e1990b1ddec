//! Shared HTTP plumbing for provider and hub clients.

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::ProviderError;

/// Send a request and map transport and status failures.
///
/// 401/403 become [`ProviderError::AuthError`], 429 becomes
/// [`ProviderError::RateLimited`] with any `retry-after` seconds, and other
/// non-success statuses become [`ProviderError::ApiError`] with the best
/// message the body offers.
pub(crate) async fn send(
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<reqwest::Response, ProviderError> {
    let response = request.timeout(timeout).send().await.map_err(|e| {
        if e.is_timeout() {
            ProviderError::Timeout(timeout)
        } else {
            ProviderError::HttpError(e.to_string())
        }
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status.as_u16() == 401 || status.as_u16() == 403 {
        return Err(ProviderError::AuthError);
    }

    if status.as_u16() == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(ProviderError::RateLimited { retry_after });
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::ApiError {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Send a request and decode a JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<T, ProviderError> {
    send(request, timeout)
        .await?
        .json::<T>()
        .await
        .map_err(|e| ProviderError::ParseError(e.to_string()))
}

/// Pull a readable message out of an error body.
///
/// OpenAI, Anthropic and Gemini use `{"error": {"message": ...}}`; the hub
/// uses `{"detail": ...}`. Anything else is returned as-is.
pub(crate) fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|json| {
        json["error"]["message"]
            .as_str()
            .or_else(|| json["error"].as_str())
            .or_else(|| json["detail"].as_str())
            .map(str::to_string)
    });
    message.unwrap_or_else(|| body.trim().to_string())
}
