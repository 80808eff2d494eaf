use log::warn;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;

use crate::types::{BotError, BotResult};

/// Maximum number of retries on rate-limit (HTTP 429).
const MAX_RETRIES: u32 = 3;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Build the HTTP client shared by every remote source.
pub fn build_client(user_agent: &str) -> BotResult<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(user_agent)
        .build()
        .map_err(|e| BotError::Config(format!("Failed to build HTTP client: {e}")))
}

/// Send a request with exponential backoff on 429.
///
/// `build` is called once per attempt since a `RequestBuilder` is consumed on
/// send.
pub async fn send_with_retry<F>(build: F) -> Result<Response, anyhow::Error>
where
    F: Fn() -> RequestBuilder,
{
    let mut delay = Duration::from_millis(500);

    for attempt in 0..=MAX_RETRIES {
        let response = build().send().await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            if attempt < MAX_RETRIES {
                warn!(
                    "Rate limited (429), retry {}/{} in {:?}",
                    attempt + 1,
                    MAX_RETRIES,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                continue;
            }
            anyhow::bail!("Rate limited after {} retries", MAX_RETRIES);
        }

        return Ok(response);
    }

    anyhow::bail!("Request failed after {} retries", MAX_RETRIES);
}

/// Like [`send_with_retry`] but also rejects non-2xx responses.
pub async fn send_checked<F>(build: F) -> Result<Response, anyhow::Error>
where
    F: Fn() -> RequestBuilder,
{
    let response = send_with_retry(build).await?;
    if !response.status().is_success() {
        anyhow::bail!("HTTP {}", response.status());
    }
    Ok(response)
}

/// Encode `pairs` as an `application/x-www-form-urlencoded` body.
pub fn form_body(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
