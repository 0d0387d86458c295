use std::time::Duration;

use crate::infra::config::ProviderConfig;

/// Build a reqwest client from provider settings (timeouts, user agent).
pub fn make_http_client_with(cfg: &ProviderConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
        .timeout(Duration::from_millis(cfg.timeout_ms))
        .user_agent(cfg.user_agent.clone())
        .build()
}

/// Exponential backoff for async ops. `retryable` decides whether an error
/// is worth another attempt; `attempts` counts retries after the first try.
pub async fn retry_async<T, E, Fut, F, R>(mut attempts: u32, retryable: R, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
{
    let mut try_num: u32 = 0;
    let mut delay_ms: u64 = 50;
    loop {
        match op(try_num).await {
            Ok(v) => return Ok(v),
            Err(e) => {
                if attempts == 0 || !retryable(&e) {
                    return Err(e);
                }
                attempts -= 1;
                tracing::debug!(attempt = try_num + 1, delay_ms, "retrying after failure");
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                delay_ms = (delay_ms * 2).min(1_000);
                try_num += 1;
            }
        }
    }
}
