use std::time::Duration;

/// Configuration for the Edgar client
#[derive(Debug, Clone)]
pub struct EdgarConfig {
    /// Contact email embedded in the User-Agent header (required by SEC)
    pub email: String,
    /// Minimum interval between requests (SEC allows at most 10 req/s)
    pub min_request_interval: Duration,
    /// HTTP request timeout
    pub timeout: Duration,
    /// Base URLs for the EDGAR services
    pub base_urls: EdgarUrls,
}

/// Base URLs for the EDGAR services
#[derive(Debug, Clone)]
pub struct EdgarUrls {
    /// Base URL for EDGAR archives (filing documents)
    pub archives: String,
    /// Base URL for EDGAR data (submissions index)
    pub data: String,
}

impl Default for EdgarConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            min_request_interval: Duration::from_millis(100),
            timeout: Duration::from_secs(30),
            base_urls: EdgarUrls::default(),
        }
    }
}

impl EdgarConfig {
    /// Creates a new EdgarConfig with custom settings
    ///
    /// # Basic usage
    ///
    /// ```rust
    /// use filingkit::{EdgarConfig, EdgarUrls};
    /// use std::time::Duration;
    ///
    /// let config = EdgarConfig {
    ///     email: "analyst@fund.com".to_string(),
    ///     min_request_interval: Duration::from_millis(100),
    ///     timeout: Duration::from_secs(30),
    ///     base_urls: EdgarUrls::default(),
    /// };
    /// ```
    pub fn new(
        email: impl Into<String>,
        min_request_interval: Duration,
        timeout: Duration,
        base_urls: Option<EdgarUrls>,
    ) -> Self {
        Self {
            email: email.into(),
            min_request_interval,
            timeout,
            base_urls: base_urls.unwrap_or_default(),
        }
    }
}

impl Default for EdgarUrls {
    fn default() -> Self {
        Self {
            archives: "https://www.sec.gov/Archives/edgar".to_string(),
            data: "https://data.sec.gov".to_string(),
        }
    }
}
