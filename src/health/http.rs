// ABOUTME: HTTP probe for health checks: status code and body substring assertions.
// ABOUTME: Connect failures optionally get one immediate retry before counting as failed.

use std::time::Duration;

use super::ProbeError;

/// Criteria for probing one URL.
#[derive(Debug, Clone)]
pub struct HttpCheck {
    pub url: String,
    pub method: reqwest::Method,
    pub expected_status: u16,
    pub contained_text: Option<String>,
    pub connection_timeout: Duration,
    pub connection_retries: bool,
}

impl HttpCheck {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: reqwest::Method::GET,
            expected_status: 200,
            contained_text: None,
            connection_timeout: Duration::from_secs(3),
            connection_retries: false,
        }
    }

    pub fn with_method(mut self, method: reqwest::Method) -> Self {
        self.method = method;
        self
    }

    pub fn responds_with(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    pub fn contains_text(mut self, text: impl Into<String>) -> Self {
        self.contained_text = Some(text.into());
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn with_connection_retries(mut self, retries: bool) -> Self {
        self.connection_retries = retries;
        self
    }

    /// Perform the probe once (plus one connect retry when enabled).
    pub async fn probe(&self) -> Result<(), ProbeError> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.connection_timeout)
            .build()?;

        let response = match self.request(&client).await {
            Ok(response) => response,
            Err(first) if first.is_connect() && self.connection_retries => {
                self.request(&client).await?
            }
            Err(first) => return Err(first.into()),
        };

        let status = response.status().as_u16();
        if status != self.expected_status {
            return Err(format!(
                "{} {} | unexpected status {status}, expected {}",
                self.method, self.url, self.expected_status
            )
            .into());
        }

        if let Some(text) = &self.contained_text {
            let body = response.text().await?;
            if !body.contains(text.as_str()) {
                return Err(format!(
                    "{} {} | response does not contain text '{text}'",
                    self.method, self.url
                )
                .into());
            }
        }

        Ok(())
    }

    async fn request(&self, client: &reqwest::Client) -> Result<reqwest::Response, reqwest::Error> {
        client
            .request(self.method.clone(), &self.url)
            .send()
            .await
    }
}
