use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};

const BASE_DELAY_MS: u64 = 200;

pub fn user_agent() -> String {
    format!("icb-fetch/{}", env!("CARGO_PKG_VERSION"))
}

/// Blocking client shared by the catalog and archive fetchers. `None` disables the
/// request timeout entirely, which is what large archive transfers need.
pub fn build_client(timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent())
        .timeout(timeout)
        .build()
}

/// Sends the request built by `make_req`, retrying up to `max_retries` times on
/// transient statuses and connection errors. With `max_retries == 0` this is a
/// single attempt.
pub fn send_with_retries<F>(
    max_retries: usize,
    mut make_req: F,
) -> Result<Response, reqwest::Error>
where
    F: FnMut() -> RequestBuilder,
{
    let mut attempt = 0usize;
    loop {
        match make_req().send() {
            Ok(resp) => {
                let status = resp.status().as_u16();
                if attempt < max_retries && is_retryable_status(status) {
                    tracing::debug!(status, attempt, "retrying after transient status");
                    backoff(attempt);
                    attempt += 1;
                    continue;
                }
                return Ok(resp);
            }
            Err(err) => {
                if attempt < max_retries && is_retryable_error(&err) {
                    tracing::debug!(error = %err, attempt, "retrying after transport error");
                    backoff(attempt);
                    attempt += 1;
                    continue;
                }
                return Err(err);
            }
        }
    }
}

fn backoff(attempt: usize) {
    let delay = BASE_DELAY_MS * (attempt as u64 + 1);
    thread::sleep(Duration::from_millis(delay));
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
