//! 存储层模块
//!
//! 状态存储与引用注册表的抽象及内存实现。

pub mod memory;
pub mod repository;

pub use memory::MemoryStore;
pub use repository::{RefRegistry, StateStore};
