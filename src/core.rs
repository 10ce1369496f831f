use governor::{
    Quota, RateLimiter, clock::DefaultClock, middleware::NoOpMiddleware, state::InMemoryState,
    state::NotKeyed,
};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::config::{EdgarConfig, EdgarUrls};
use super::error::{EdgarError, Result};

const MAX_RETRIES: u32 = 5;
const INITIAL_BACKOFF_MS: u64 = 1000; // 1 second

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").unwrap());

type Governor = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// A client for fetching documents from the SEC EDGAR system.
///
/// The `Edgar` client handles the acquisition side of the pipeline: it enforces
/// the SEC fair-access rules (identifying User-Agent, at most one request per
/// 100 ms process-wide) and returns raw response bodies without interpreting
/// their content. Parsing is the job of [`crate::parse_any`] and the modules
/// under [`crate::parsing`].
///
/// # Rate Limiting
///
/// The rate gate is a shared token cell refilled once per 100 ms, so the minimum
/// inter-request interval holds from any task or thread that clones the client.
/// A request that would violate the interval blocks until the interval is
/// satisfied. HTTP 429 responses are retried with exponential backoff and
/// jitter up to a bounded number of attempts.
///
/// # Identification
///
/// SEC requires a User-Agent identifying the caller. The client validates the
/// contact email at construction time, before any network call, and rejects
/// placeholder `example.com` addresses with a configuration error. The header
/// takes the shape `filingkit/<version> (<email>)`.
///
/// # Examples
///
/// ```ignore
/// let edgar = Edgar::new("analyst@fund.com")?;
/// let bytes = edgar.get_bytes("https://www.sec.gov/Archives/edgar/data/.../doc4.xml").await?;
/// ```
#[derive(Debug, Clone)]
pub struct Edgar {
    pub(crate) client: reqwest::Client,
    pub(crate) rate_limiter: Arc<Governor>,
    pub(crate) edgar_archives_url: String,
    pub(crate) edgar_data_url: String,
}

impl Edgar {
    /// Creates a new client with default configuration.
    ///
    /// # Arguments
    ///
    /// * `email` - Contact email for the SEC User-Agent header. Must be a
    ///   syntactically valid address and must not be in `example.com`.
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::Config` when the email is missing, malformed, or a
    /// placeholder address.
    pub fn new(email: &str) -> Result<Self> {
        let config = EdgarConfig {
            email: email.to_string(),
            min_request_interval: Duration::from_millis(100),
            timeout: Duration::from_secs(30),
            base_urls: EdgarUrls::default(),
        };
        Self::with_config(config)
    }

    /// Creates a new client with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::Config` if:
    /// - The email is invalid or in `example.com`
    /// - The HTTP client fails to build
    /// - The pacing interval is zero
    pub fn with_config(config: EdgarConfig) -> Result<Self> {
        let email = validate_email(&config.email)?;
        let user_agent = build_user_agent(&email);

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&user_agent)
                .map_err(|e| EdgarError::Config(format!("Invalid user agent: {}", e)))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| EdgarError::Config(format!("Failed to build HTTP client: {}", e)))?;

        // One cell per interval: no burst capacity, so the minimum
        // inter-request spacing holds even under concurrent callers.
        let quota = Quota::with_period(config.min_request_interval).ok_or_else(|| {
            EdgarError::Config("Request interval must be greater than zero".to_string())
        })?;
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Edgar {
            client,
            rate_limiter,
            edgar_archives_url: config.base_urls.archives,
            edgar_data_url: config.base_urls.data,
        })
    }

    /// Calculates the exponential backoff duration for retrying requests.
    ///
    /// Includes a random jitter of ±20% to avoid synchronized retries.
    fn calculate_backoff(retry: u32) -> Duration {
        let backoff_ms = INITIAL_BACKOFF_MS * (2_u64.pow(retry));
        let jitter = (backoff_ms as f64 * 0.2 * (fastrand::f64() - 0.5)) as i64;
        Duration::from_millis((backoff_ms as i64 + jitter) as u64)
    }

    /// Sends a rate-limited GET request and returns the raw response body.
    ///
    /// The body is returned verbatim; the client never interprets content. Use
    /// this for filing documents (XML, HTML, inline XBRL).
    ///
    /// # Errors
    ///
    /// * `Request` for network/transport errors after retries are exhausted
    /// * `RateLimitExceeded` when 429 responses persist through retries
    /// * `Remote { status }` for any other non-success status
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.get_bytes_with_timeout(url, None).await
    }

    /// Like [`Edgar::get_bytes`], with a per-call timeout override.
    ///
    /// Batch callers use the override to propagate a caller-supplied deadline
    /// into individual requests without rebuilding the client.
    pub async fn get_bytes_with_timeout(
        &self,
        url: &str,
        timeout: Option<Duration>,
    ) -> Result<Vec<u8>> {
        let mut retries = 0;

        loop {
            self.rate_limiter.until_ready().await;

            let mut request = self.client.get(url);
            if let Some(t) = timeout {
                request = request.timeout(t);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    if retries >= MAX_RETRIES {
                        return Err(EdgarError::Request(e));
                    }
                    let backoff = Self::calculate_backoff(retries);
                    tracing::warn!(
                        "Request failed for {}: {:?}. Attempt {}/{}. Retrying in {:?}.",
                        url,
                        e,
                        retries + 1,
                        MAX_RETRIES + 1,
                        backoff
                    );
                    sleep(backoff).await;
                    retries += 1;
                    continue;
                }
            };

            let status = response.status();

            if status.is_success() {
                return response
                    .bytes()
                    .await
                    .map(|b| b.to_vec())
                    .map_err(EdgarError::Request);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if retries >= MAX_RETRIES {
                    return Err(EdgarError::RateLimitExceeded);
                }

                // Respect retry-after when the server provides one.
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| Self::calculate_backoff(retries));

                tracing::warn!(
                    "Rate limit hit (429) for {}. Attempt {}/{}. Waiting {:?} before retry.",
                    url,
                    retries + 1,
                    MAX_RETRIES + 1,
                    retry_after
                );
                sleep(retry_after).await;
                retries += 1;
                continue;
            }

            return Err(EdgarError::Remote {
                status: status.as_u16(),
            });
        }
    }

    /// Sends a rate-limited GET request and returns the body as a string.
    ///
    /// Used for the JSON submissions endpoints. Same retry and status behavior
    /// as [`Edgar::get_bytes`].
    pub async fn get(&self, url: &str) -> Result<String> {
        let bytes = self.get_bytes(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Returns the base URL for EDGAR archives.
    pub fn archives_url(&self) -> &str {
        &self.edgar_archives_url
    }

    /// Returns the base URL for EDGAR data.
    pub fn data_url(&self) -> &str {
        &self.edgar_data_url
    }
}

/// Validates the SEC contact email: RFC-shaped and not a placeholder address.
///
/// Returns the trimmed email on success.
pub fn validate_email(email: &str) -> Result<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(EdgarError::Config(
            "SEC email required: set SEC_EMAIL or pass an email explicitly".to_string(),
        ));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(EdgarError::Config(format!(
            "invalid email format: {}",
            email
        )));
    }
    if email.ends_with("example.com") {
        return Err(EdgarError::Config(format!(
            "use a real email address, not example.com: {}",
            email
        )));
    }
    Ok(email.to_string())
}

/// Builds the SEC User-Agent string: `filingkit/<version> (<email>)`.
pub fn build_user_agent(email: &str) -> String {
    format!("filingkit/{} ({})", crate::VERSION, email)
}
