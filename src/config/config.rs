use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 导航配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NavigationConfig {
    /// 文档模式（按组件跳转代替按故事跳转）
    pub docs_mode: bool,
    /// 是否将标题首段作为根节点；未设置时视为启用
    pub show_roots: Option<bool>,
    /// 默认折叠的根节点 ID
    pub collapsed_roots: Vec<String>,
}

/// 索引获取配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IndexConfig {
    /// 索引文档地址
    pub url: String,
    /// 请求超时（秒）
    pub timeout: u64,
}

/// 事件通道配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ChannelConfig {
    /// 广播通道容量
    pub capacity: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
    /// 日志文件目录
    pub log_dir: Option<PathBuf>,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 导航配置
    pub navigation: NavigationConfig,
    /// 索引配置
    pub index: IndexConfig,
    /// 事件通道配置
    pub channel: ChannelConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            navigation: NavigationConfig {
                docs_mode: false,
                show_roots: None,
                collapsed_roots: Vec::new(),
            },
            index: IndexConfig {
                url: "http://localhost:6006/stories.json".into(),
                timeout: 30,
            },
            channel: ChannelConfig { capacity: 1024 },
            logging: LoggingConfig {
                level: "debug".into(),
                structured: false,
                log_dir: None,
            },
            app_name: "storyhub".into(),
            environment: "development".into(),
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = "production".into();
        config.logging.level = "info".into();
        config.logging.structured = true;
        config.logging.log_dir = Some(PathBuf::from("./logs"));
        config
    }
}
