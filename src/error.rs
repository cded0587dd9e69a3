//! 错误处理模块
//!
//! 定义导航核心的错误类型。查找未命中不属于错误，由调用方按 `None` 处理。

use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 协议违规（本地来源的未版本化全量索引）
    #[error("协议违规: {0}")]
    ProtocolViolation(String),

    /// 标识符无效（标题或名称不含任何字母数字字符）
    #[error("标识符无效: {0}")]
    InvalidIdentifier(String),

    /// 标题路径无效
    #[error("标题无效: {0}")]
    InvalidTitle(String),

    /// 索引获取错误
    #[error("索引获取失败: {0}")]
    Fetch(String),

    /// 状态存储错误
    #[error("状态存储错误: {0}")]
    Store(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(String),
}

impl AppError {
    /// 是否为致命错误（事件循环应当终止）
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::ProtocolViolation(_))
    }

    /// 错误代码
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ProtocolViolation(_) => "PROTOCOL_VIOLATION",
            AppError::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            AppError::InvalidTitle(_) => "INVALID_TITLE",
            AppError::Fetch(_) => "FETCH_FAILED",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Fetch(e.to_string())
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;
