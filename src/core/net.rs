use serde::de::DeserializeOwned;

use crate::core::FetchError;

/// Read the response body as text, mapping unsuccessful statuses to a [`FetchError`].
pub(crate) async fn get_text(resp: reqwest::Response, endpoint: &str) -> Result<String, FetchError> {
    let status = resp.status();
    let url = resp.url().to_string();
    let text = resp.text().await?;

    if !status.is_success() {
        tracing::debug!(endpoint, status = status.as_u16(), %url, "provider returned error status");
        return Err(FetchError::from_status(status.as_u16(), url));
    }
    Ok(text)
}

/// Read and decode a JSON body. A body that does not decode is a permanent failure.
pub(crate) async fn get_json<T: DeserializeOwned>(
    resp: reqwest::Response,
    endpoint: &str,
) -> Result<T, FetchError> {
    let text = get_text(resp, endpoint).await?;
    serde_json::from_str(&text)
        .map_err(|e| FetchError::Malformed(format!("{endpoint} json parse: {e}")))
}
