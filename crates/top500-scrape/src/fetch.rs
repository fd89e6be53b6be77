//! Fetcher for `<top500_url>/system/<id>` pages.

use async_trait::async_trait;
use thiserror::Error;
use top500_core::SystemId;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("system {0} not found")]
    NotFound(SystemId),
    #[error("server returned {status} for {url}")]
    Server { status: u16, url: String },
}

/// Source of raw system pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, id: SystemId) -> Result<String, FetchError>;
}

/// Plain HTTPS GET against the TOP500 site. Single attempt, no retries.
pub struct Top500Fetcher {
    client: reqwest::Client,
    base_url: String,
}

impl Top500Fetcher {
    /// `base_url` should be like `https://www.top500.org` (no trailing slash).
    ///
    /// `client` is normally the session client so both sides share one
    /// connection pool.
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn system_url(&self, id: SystemId) -> String {
        format!("{}/system/{}", self.base_url, id)
    }
}

#[async_trait]
impl PageSource for Top500Fetcher {
    async fn fetch_page(&self, id: SystemId) -> Result<String, FetchError> {
        let url = self.system_url(id);
        debug!(url = %url, "fetching system page");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(id));
        }
        if !status.is_success() {
            return Err(FetchError::Server {
                status: status.as_u16(),
                url,
            });
        }
        Ok(resp.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetcher_trims_trailing_slash() {
        let fetcher = Top500Fetcher::new(reqwest::Client::new(), "https://www.top500.org/");
        assert_eq!(
            fetcher.system_url(SystemId(179807)),
            "https://www.top500.org/system/179807"
        );
    }

    #[test]
    fn not_found_message_names_the_id() {
        let err = FetchError::NotFound(SystemId(0));
        assert_eq!(err.to_string(), "system 0 not found");
    }
}
