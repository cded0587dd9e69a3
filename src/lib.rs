//! StoryHub - 故事导航与状态同步核心
//!
//! 维护故事的层级索引，解析导航请求，并通过事件协议让管理端与
//! 本地预览及远程引用框架保持一致。

pub mod channel;
pub mod config;
pub mod error;
pub mod index;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;
