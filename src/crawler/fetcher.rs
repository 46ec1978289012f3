//! HTTP fetching with politeness controls
//!
//! All network traffic goes through one `Fetcher`, which enforces:
//! - The daily request budget, checked before every attempt
//! - A minimum gap between consecutive requests, measured from the moment
//!   each request is actually issued
//! - Bounded retries with exponential backoff for transient failures

use crate::config::{Config, RequestSettings, TimeoutSettings};
use crate::crawler::budget::{BudgetStatus, RequestBudget};
use chrono::Local;
use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Retries per page, including the first attempt.
const MAX_ATTEMPTS: u32 = 3;

/// Browser identities rotated between sessions. One is picked per client and
/// kept for the whole run.
const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Result of fetching one page.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The page arrived; raw body bytes, undecoded.
    Fetched(Vec<u8>),
    /// The server answered 404. Not retried.
    NotFound,
    /// All attempts failed; `reason` describes the last failure.
    Failed { reason: String },
    /// The daily budget is spent. No request was issued.
    BudgetExhausted { consumed: u32, limit: u32 },
}

/// Shared HTTP client wrapping every request in budget and pacing checks.
pub struct Fetcher {
    client: reqwest::Client,
    request: RequestSettings,
    budget: Mutex<RequestBudget>,
    last_request: Mutex<Option<Instant>>,
}

impl Fetcher {
    /// Creates a fetcher with a fresh budget for today.
    pub fn new(config: &Config) -> crate::Result<Self> {
        Self::with_budget(config, RequestBudget::new(Local::now().date_naive()))
    }

    /// Creates a fetcher around an existing budget. Lets tests start with a
    /// partially spent counter.
    pub fn with_budget(config: &Config, budget: RequestBudget) -> crate::Result<Self> {
        Ok(Self {
            client: build_http_client(&config.timeouts)?,
            request: config.request.clone(),
            budget: Mutex::new(budget),
            last_request: Mutex::new(None),
        })
    }

    /// Current budget state, after rolling the counter over to today.
    pub async fn status(&self) -> BudgetStatus {
        let mut budget = self.budget.lock().await;
        budget.roll_over(&self.request, Local::now().date_naive());
        budget.status(&self.request)
    }

    /// Fetches one URL.
    ///
    /// Each attempt first claims a unit of budget, then waits out the
    /// request gap, then sends. A 404 returns immediately; any other failure
    /// backs off (1s, 2s, ...) and retries up to [`MAX_ATTEMPTS`] times.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let mut last_reason = String::from("no attempts made");

        for attempt in 0..MAX_ATTEMPTS {
            {
                let mut budget = self.budget.lock().await;
                budget.roll_over(&self.request, Local::now().date_naive());
                if budget.remaining(&self.request) == 0 {
                    let status = budget.status(&self.request);
                    tracing::warn!(
                        "daily {} budget exhausted ({}/{}), refusing {}",
                        status.category.as_str(),
                        status.consumed,
                        status.limit,
                        url
                    );
                    return FetchOutcome::BudgetExhausted {
                        consumed: status.consumed,
                        limit: status.limit,
                    };
                }
                budget.consume();
            }

            self.pace().await;

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == reqwest::StatusCode::NOT_FOUND {
                        tracing::debug!("not found: {}", url);
                        return FetchOutcome::NotFound;
                    }
                    if status.is_success() {
                        match response.bytes().await {
                            Ok(body) => return FetchOutcome::Fetched(body.to_vec()),
                            Err(err) => {
                                last_reason = format!("body read failed: {}", err);
                            }
                        }
                    } else {
                        last_reason = format!("HTTP {}", status.as_u16());
                    }
                }
                Err(err) => {
                    last_reason = format!("request failed: {}", err);
                }
            }

            tracing::warn!(
                "attempt {}/{} for {} failed: {}",
                attempt + 1,
                MAX_ATTEMPTS,
                url,
                last_reason
            );

            if attempt + 1 < MAX_ATTEMPTS {
                tokio::time::sleep(Duration::from_secs(1u64 << attempt)).await;
            }
        }

        FetchOutcome::Failed {
            reason: last_reason,
        }
    }

    /// Waits until the minimum gap since the previous request has passed,
    /// then stamps the current instant as the new reference point.
    ///
    /// The lock is held across the sleep so concurrent callers serialize and
    /// each issued request keeps the full gap from the one before it.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let min_gap = Duration::from_millis(self.request.min_interval_ms);
            let elapsed = previous.elapsed();
            if elapsed < min_gap {
                tokio::time::sleep(min_gap - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

fn session_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("ja,en-US;q=0.9,en;q=0.8"),
    );
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );
    headers
}

fn build_http_client(timeouts: &TimeoutSettings) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(session_user_agent())
        .default_headers(default_headers())
        .timeout(Duration::from_secs(timeouts.scraping_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_user_agent_comes_from_pool() {
        for _ in 0..20 {
            let agent = session_user_agent();
            assert!(USER_AGENTS.contains(&agent));
        }
    }

    #[test]
    fn test_default_headers_present() {
        let headers = default_headers();
        assert!(headers
            .get(reqwest::header::ACCEPT)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        assert_eq!(
            headers.get(reqwest::header::ACCEPT_LANGUAGE).unwrap(),
            "ja,en-US;q=0.9,en;q=0.8"
        );
        assert_eq!(headers.get("upgrade-insecure-requests").unwrap(), "1");
    }

    #[test]
    fn test_build_http_client_succeeds() {
        let timeouts = TimeoutSettings { scraping_secs: 10 };
        assert!(build_http_client(&timeouts).is_ok());
    }
}
