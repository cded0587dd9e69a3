//! 引用合并层
//!
//! 每个引用拥有独立的故事哈希，由引用注册表持久化。
//! 引用的全量载荷按任意版本宽松构建，构建失败只记录在引用上。

use tracing::{debug, info, warn};

use crate::channel::Origin;
use crate::error::Result;
use crate::models::{ComposedRef, SetStoriesPayload, StoriesHash};
use crate::services::hierarchy::{
    BuildOptions, attach_ref_id, stories_from_payload, transform_stories_raw_to_stories_hash,
};
use crate::services::stories::StoriesModule;

/// 由载荷构建引用的故事哈希，所有节点标注引用 ID
pub fn build_ref_hash(
    ref_id: &str,
    payload: &SetStoriesPayload,
    options: &BuildOptions,
) -> Result<StoriesHash> {
    let input = stories_from_payload(payload);
    let mut hash = transform_stories_raw_to_stories_hash(&input, options)?;
    attach_ref_id(&mut hash, ref_id);
    Ok(hash)
}

impl StoriesModule {
    /// 消息来源对应的引用
    ///
    /// 本地来源返回 `None`；尚未注册的引用返回一个空引用。
    pub fn origin_ref(&self, origin: &Origin) -> Option<ComposedRef> {
        let ref_id = origin.ref_id()?;
        let composed = self
            .store
            .get_state()
            .refs
            .get(ref_id)
            .cloned()
            .unwrap_or_else(|| {
                debug!(ref_id, "Message from unregistered ref");
                ComposedRef::new(ref_id)
            });
        Some(composed)
    }

    /// 写入引用的全量载荷
    pub async fn set_ref_stories(&self, composed: ComposedRef, payload: &SetStoriesPayload) -> Result<()> {
        let ref_id = composed.id.clone();
        let mut next = ComposedRef {
            id: ref_id.clone(),
            title: composed.title,
            url: composed.url,
            stories: None,
            configured: true,
            error: payload.error.clone(),
        };

        match build_ref_hash(&ref_id, payload, &self.build_options()) {
            Ok(hash) => {
                info!(ref_id = %ref_id, nodes = hash.len(), "Ref stories set");
                next.stories = Some(hash);
            }
            Err(e) => {
                warn!(ref_id = %ref_id, error = %e, "Ref stories could not be built");
                next.stories = composed.stories;
                next.error = Some(e.to_string());
            }
        }

        let _commit = self.commit_lock.lock().await;
        self.refs.set_ref(&ref_id, next, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HierarchyNode;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> SetStoriesPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_build_ref_hash_tags_every_node() {
        let payload = payload(json!({
            "stories": {
                "a--one": {"kind": "A", "name": "One", "parameters": {}},
                "a--two": {"kind": "A", "name": "Two", "parameters": {}}
            }
        }));
        let hash = build_ref_hash("remote", &payload, &BuildOptions::default()).unwrap();

        assert_eq!(hash.ids().collect::<Vec<_>>(), vec!["a", "a--one", "a--two"]);
        assert!(hash.iter().all(|(_, node)| node.ref_id() == Some("remote")));
    }

    #[test]
    fn test_build_ref_hash_denormalizes_versioned() {
        let payload = payload(json!({
            "v": 2,
            "globalParameters": {"layout": "centered"},
            "kindParameters": {"A": {"docs": {"page": true}}},
            "stories": {"a--one": {"kind": "A", "name": "One", "parameters": {}}}
        }));
        let hash = build_ref_hash("remote", &payload, &BuildOptions::default()).unwrap();

        match hash.get("a--one") {
            Some(HierarchyNode::Story(story)) => {
                assert_eq!(story.parameters["layout"], "centered");
                assert_eq!(story.parameters["docs"]["page"], true);
            }
            other => panic!("unexpected node {:?}", other),
        }
    }
}
