use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Options for a batch download-and-parse run over one CIK.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// CIK to fetch filings for (required)
    pub cik: String,
    /// Form type to filter by, e.g. "4", "13D", "13", "10-K" (required)
    pub form_type: String,
    /// Inclusive start date (YYYY-MM-DD); `None` = unbounded
    pub date_from: Option<String>,
    /// Inclusive end date (YYYY-MM-DD); `None` = unbounded
    pub date_to: Option<String>,
    /// Fetch the paginated history in addition to recent filings (can be slow)
    pub include_paginated: bool,
    /// Return the filtered index records only, skipping fetch/parse
    pub list_only: bool,
    /// Cooperative cancellation; checked at every pacing step
    pub cancel: Option<CancellationToken>,
    /// Per-request timeout override propagated into each fetch
    pub request_timeout: Option<Duration>,
}

impl BatchOptions {
    pub fn new(cik: impl Into<String>, form_type: impl Into<String>) -> Self {
        Self {
            cik: cik.into(),
            form_type: form_type.into(),
            ..Default::default()
        }
    }

    pub fn with_date_from(mut self, date: impl Into<String>) -> Self {
        self.date_from = Some(date.into());
        self
    }

    pub fn with_date_to(mut self, date: impl Into<String>) -> Self {
        self.date_to = Some(date.into());
        self
    }

    pub fn with_date_range(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.date_from = Some(from.into());
        self.date_to = Some(to.into());
        self
    }

    pub fn with_paginated(mut self) -> Self {
        self.include_paginated = true;
        self
    }

    pub fn list_only(mut self) -> Self {
        self.list_only = true;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}
