use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ComposedRef, ManagerState, RefUpdate, StatePatch};

/// 状态存储 trait
///
/// `set_state` 的完成意味着提交已生效，下一个事件处理器可以读到新状态。
#[async_trait]
pub trait StateStore: Send + Sync {
    /// 读取当前状态快照
    fn get_state(&self) -> ManagerState;

    /// 提交部分状态
    async fn set_state(&self, patch: StatePatch) -> Result<()>;
}

/// 引用注册表 trait
#[async_trait]
pub trait RefRegistry: Send + Sync {
    /// 合并引用的部分状态；未知引用会被创建
    async fn update_ref(&self, ref_id: &str, update: RefUpdate) -> Result<()>;

    /// 写入引用；`replace` 为假时与已有引用合并
    async fn set_ref(&self, ref_id: &str, composed: ComposedRef, replace: bool) -> Result<()>;
}
