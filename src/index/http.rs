//! HTTP 索引来源

use async_trait::async_trait;

use crate::config::IndexConfig;
use crate::error::{AppError, Result};
use crate::index::IndexSource;

/// 通过 HTTP GET 获取 `stories.json`
pub struct HttpIndexSource {
    client: reqwest::Client,
    url: String,
}

impl HttpIndexSource {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        Self::new(&config.url, config.timeout.max(1))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl IndexSource for HttpIndexSource {
    async fn fetch_index(&self) -> Result<String> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::Fetch(format!(
                "GET {} returned {}",
                self.url,
                response.status()
            )));
        }

        Ok(response.text().await?)
    }
}
