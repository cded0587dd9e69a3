//! 索引来源模块
//!
//! 初始故事索引的获取方式。返回原始 JSON 文本，以保留故事的书写顺序。

pub mod http;

pub use http::HttpIndexSource;

use async_trait::async_trait;

use crate::config::IndexConfig;
use crate::error::{AppError, Result};

#[async_trait]
pub trait IndexSource: Send + Sync {
    async fn fetch_index(&self) -> Result<String>;
}

/// 固定内容的索引来源
#[derive(Debug, Clone, Default)]
pub struct StaticIndexSource {
    body: Option<String>,
}

impl StaticIndexSource {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
        }
    }

    /// 没有索引可取，每次获取都失败
    pub fn empty() -> Self {
        Self { body: None }
    }
}

#[async_trait]
impl IndexSource for StaticIndexSource {
    async fn fetch_index(&self) -> Result<String> {
        self.body
            .clone()
            .ok_or_else(|| AppError::Fetch("no static index configured".to_string()))
    }
}

/// 按配置创建索引来源
pub fn create_index_source(config: &IndexConfig) -> Result<Box<dyn IndexSource>> {
    if config.url.is_empty() {
        return Ok(Box::new(StaticIndexSource::empty()));
    }
    Ok(Box::new(HttpIndexSource::from_config(config)?))
}
