//! 内存状态存储
//!
//! 同时实现状态存储与引用注册表，供二进制程序和测试使用。

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::models::{ComposedRef, ManagerState, RefUpdate, StatePatch};
use crate::storage::repository::{RefRegistry, StateStore};

/// 内存状态存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<ManagerState>,
}

impl MemoryStore {
    pub fn new(initial: ManagerState) -> Self {
        Self {
            state: RwLock::new(initial),
        }
    }

    /// 读取单个引用
    pub fn get_ref(&self, ref_id: &str) -> Option<ComposedRef> {
        self.state.read().refs.get(ref_id).cloned()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    fn get_state(&self) -> ManagerState {
        self.state.read().clone()
    }

    async fn set_state(&self, patch: StatePatch) -> Result<()> {
        self.state.write().apply(patch);
        Ok(())
    }
}

#[async_trait]
impl RefRegistry for MemoryStore {
    async fn update_ref(&self, ref_id: &str, update: RefUpdate) -> Result<()> {
        let mut state = self.state.write();
        state
            .refs
            .entry(ref_id.to_string())
            .or_insert_with(|| ComposedRef::new(ref_id))
            .apply(update);
        debug!(ref_id, "Ref updated");
        Ok(())
    }

    async fn set_ref(&self, ref_id: &str, composed: ComposedRef, replace: bool) -> Result<()> {
        let mut state = self.state.write();
        match state.refs.get_mut(ref_id) {
            Some(existing) if !replace => existing.apply(RefUpdate {
                title: composed.title,
                url: composed.url,
                stories: composed.stories,
                configured: Some(composed.configured),
                error: Some(composed.error),
            }),
            _ => {
                state.refs.insert(ref_id.to_string(), composed);
            }
        }
        debug!(ref_id, replace, "Ref set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ViewMode;

    #[tokio::test]
    async fn test_set_state_is_visible_to_next_read() {
        let store = MemoryStore::new(ManagerState::new(None, None));
        store
            .set_state(StatePatch::default().selection(Some("a--b"), None, Some(ViewMode::Docs)))
            .await
            .unwrap();

        let state = store.get_state();
        assert_eq!(state.story_id.as_deref(), Some("a--b"));
        assert_eq!(state.view_mode, Some(ViewMode::Docs));
    }

    #[tokio::test]
    async fn test_update_ref_creates_unknown_ref() {
        let store = MemoryStore::default();
        store
            .update_ref("remote", RefUpdate { configured: Some(true), ..Default::default() })
            .await
            .unwrap();

        let composed = store.get_ref("remote").unwrap();
        assert_eq!(composed.id, "remote");
        assert!(composed.configured);
    }

    #[tokio::test]
    async fn test_set_ref_replace_discards_old_fields() {
        let store = MemoryStore::default();
        let mut first = ComposedRef::new("remote");
        first.title = Some("Remote".into());
        store.set_ref("remote", first, true).await.unwrap();

        store.set_ref("remote", ComposedRef::new("remote"), true).await.unwrap();
        assert!(store.get_ref("remote").unwrap().title.is_none());
    }
}
