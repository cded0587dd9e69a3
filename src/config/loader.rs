use crate::config::config::{AppConfig, NavigationConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::PathBuf;

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 合并顺序：
    /// 1. 开发环境默认值
    /// 2. ./storyhub.toml
    /// 3. 环境变量（`STORYHUB_` 前缀，`__` 分隔嵌套字段）
    pub fn load() -> Result<AppConfig, figment::Error> {
        Self::load_from(default_config_path())
    }

    /// 从指定路径加载配置
    pub fn load_from(path: PathBuf) -> Result<AppConfig, figment::Error> {
        let figment = Figment::from(Serialized::defaults(AppConfig::development()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("STORYHUB_").split("__"));

        figment.extract()
    }

    /// 加载导航配置
    pub fn load_navigation_config() -> Result<NavigationConfig, figment::Error> {
        let figment = Figment::from(Serialized::defaults(AppConfig::development()))
            .merge(Toml::file(default_config_path()))
            .merge(Env::prefixed("STORYHUB_").split("__"));

        figment.extract_inner("navigation")
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.index.url.is_empty() {
            return Err(ConfigValidationError::MissingIndexUrl);
        }

        if config.channel.capacity == 0 {
            return Err(ConfigValidationError::InvalidCapacity);
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("索引地址未配置")]
    MissingIndexUrl,

    #[error("事件通道容量无效，必须大于 0")]
    InvalidCapacity,
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("storyhub.toml")
}
