//! 故事服务
//!
//! 持有故事哈希的读写入口：数据查询、参数读取、索引加载和节点更新。
//! 导航与事件同步分别在 `navigation` 和 `sync` 中为同一类型实现。

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::channel::EventBus;
use crate::config::NavigationConfig;
use crate::error::Result;
use crate::index::IndexSource;
use crate::models::index::VersionProbe;
use crate::models::{
    ComposedRef, HierarchyNode, ManagerState, RefUpdate, SUPPORTED_INDEX_VERSION, StatePatch,
    StoryIndex, StoryInput, StoryNode, StoryUpdate,
};
use crate::observability::SyncMetrics;
use crate::services::hierarchy::{
    BuildOptions, transform_stories_raw_to_stories_hash, transform_story_index_to_stories_hash,
};
use crate::services::resolver::to_id;
use crate::services::router::Router;
use crate::services::ui::UiBridge;
use crate::storage::{RefRegistry, StateStore};

/// 外部协作者
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn StateStore>,
    pub refs: Arc<dyn RefRegistry>,
    pub router: Arc<dyn Router>,
    pub ui: Arc<dyn UiBridge>,
    pub index_source: Arc<dyn IndexSource>,
    pub bus: EventBus,
}

/// 参数查询目标
#[derive(Debug, Clone, PartialEq)]
pub struct StoryTarget {
    pub story_id: String,
    pub ref_id: Option<String>,
}

impl StoryTarget {
    pub fn new(story_id: &str, ref_id: Option<&str>) -> Self {
        Self {
            story_id: story_id.to_string(),
            ref_id: ref_id.map(str::to_string),
        }
    }
}

impl From<&str> for StoryTarget {
    fn from(story_id: &str) -> Self {
        Self::new(story_id, None)
    }
}

/// 故事模块
///
/// 事件处理器应由唯一的消费者（`run`）依次调用。对故事哈希的读改写
/// 在 `commit_lock` 内完成，启动阶段的索引加载与事件处理交错时也不会
/// 用旧快照覆盖新哈希。
pub struct StoriesModule {
    pub(crate) config: NavigationConfig,
    pub(crate) store: Arc<dyn StateStore>,
    pub(crate) refs: Arc<dyn RefRegistry>,
    pub(crate) router: Arc<dyn Router>,
    pub(crate) ui: Arc<dyn UiBridge>,
    pub(crate) index_source: Arc<dyn IndexSource>,
    pub(crate) bus: EventBus,
    pub(crate) metrics: SyncMetrics,
    pub(crate) deprecations_reported: Mutex<HashSet<String>>,
    pub(crate) commit_lock: tokio::sync::Mutex<()>,
}

impl StoriesModule {
    pub fn new(config: NavigationConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            store: collaborators.store,
            refs: collaborators.refs,
            router: collaborators.router,
            ui: collaborators.ui,
            index_source: collaborators.index_source,
            bus: collaborators.bus,
            metrics: SyncMetrics::default(),
            deprecations_reported: Mutex::new(HashSet::new()),
            commit_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn metrics(&self) -> &SyncMetrics {
        &self.metrics
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn state(&self) -> ManagerState {
        self.store.get_state()
    }

    pub(crate) fn build_options(&self) -> BuildOptions {
        BuildOptions::from(&self.config)
    }

    /// 由标题和名称组合故事 ID
    pub fn story_id(&self, kind: &str, name: &str) -> Result<String> {
        to_id(kind, name)
    }

    /// 查找节点（包括根节点）
    pub fn resolve_story(&self, story_id: &str, ref_id: Option<&str>) -> Option<HierarchyNode> {
        let state = self.store.get_state();
        let found = state
            .hash_for(ref_id)
            .and_then(|hash| hash.get(story_id))
            .cloned();
        if found.is_none() {
            self.metrics.record_lookup_miss();
            debug!(story_id, ref_id, "Story lookup missed");
        }
        found
    }

    /// 查找故事或分组；根节点视为不存在
    pub fn get_data(&self, story_id: &str, ref_id: Option<&str>) -> Option<HierarchyNode> {
        self.resolve_story(story_id, ref_id)
            .filter(|node| !node.is_root())
    }

    /// 分组和根节点总是已准备；故事取其标记；未知 ID 视为未准备
    pub fn is_prepared(&self, story_id: &str, ref_id: Option<&str>) -> bool {
        match self.resolve_story(story_id, ref_id) {
            Some(HierarchyNode::Story(story)) => story.prepared,
            Some(_) => true,
            None => false,
        }
    }

    /// 当前选择对应的节点
    pub fn get_current_story_data(&self) -> Option<HierarchyNode> {
        let state = self.store.get_state();
        let story_id = state.story_id.as_deref()?;
        self.get_data(story_id, state.ref_id.as_deref())
    }

    /// 读取故事参数
    ///
    /// 未指定名称时返回整个参数表（可能为空表）；非故事节点返回 `None`。
    pub fn get_parameters(
        &self,
        target: impl Into<StoryTarget>,
        parameter_name: Option<&str>,
    ) -> Option<Value> {
        let target = target.into();
        match self.get_data(&target.story_id, target.ref_id.as_deref())? {
            HierarchyNode::Story(StoryNode { parameters, .. }) => match parameter_name {
                Some(name) => parameters.get(name).cloned(),
                None => Some(Value::Object(parameters)),
            },
            _ => None,
        }
    }

    /// 读取当前故事的参数；假值（null、false、0、空串）视为不存在
    pub fn get_current_parameter(&self, parameter_name: Option<&str>) -> Option<Value> {
        let state = self.store.get_state();
        let story_id = state.story_id.as_deref()?;
        self.get_parameters(
            StoryTarget::new(story_id, state.ref_id.as_deref()),
            parameter_name,
        )
        .filter(|value| !is_falsy(value))
    }

    /// 由原始故事记录重建本地哈希
    pub async fn set_stories(&self, input: &[StoryInput], error: Option<String>) -> Result<()> {
        let hash = transform_stories_raw_to_stories_hash(input, &self.build_options())?;
        info!(stories = input.len(), nodes = hash.len(), "Stories set");

        let _commit = self.commit_lock.lock().await;
        self.store
            .set_state(StatePatch::default().stories_hash(hash).configured(error))
            .await
    }

    /// 由 v3 索引重建本地哈希
    pub async fn set_story_list(&self, index: &StoryIndex) -> Result<()> {
        let hash = transform_story_index_to_stories_hash(index, &self.build_options())?;
        info!(entries = index.stories.len(), nodes = hash.len(), "Story index loaded");

        let _commit = self.commit_lock.lock().await;
        self.store
            .set_state(StatePatch::default().stories_hash(hash).configured(None))
            .await
    }

    /// 获取并加载索引
    ///
    /// 版本不是 3 的索引只记录警告，等待预览端的全量载荷。
    pub async fn fetch_story_list(&self) -> Result<()> {
        let body = self.index_source.fetch_index().await?;
        let probe: VersionProbe = serde_json::from_str(&body)?;

        if probe.v != Some(SUPPORTED_INDEX_VERSION) {
            let version = probe
                .v
                .map_or_else(|| "none".to_string(), |v| v.to_string());
            warn!("Skipping story index with version v{}, awaiting SET_STORIES.", version);
            return Ok(());
        }

        let index: StoryIndex = serde_json::from_str(&body)?;
        self.set_story_list(&index).await
    }

    /// 合并故事节点
    ///
    /// 本地故事直接提交到状态存储；引用中的故事经由引用注册表更新。
    /// 未知 ID 或非故事节点不做任何修改。始终在最新快照上合并。
    pub async fn update_story(
        &self,
        story_id: &str,
        update: StoryUpdate,
        composed: Option<&ComposedRef>,
    ) -> Result<()> {
        let _commit = self.commit_lock.lock().await;
        match composed {
            None => {
                let mut hash = self.store.get_state().stories_hash;
                if !apply_update(hash.get_mut(story_id), update) {
                    self.metrics.record_lookup_miss();
                    debug!(story_id, "Update for unknown story ignored");
                    return Ok(());
                }
                self.metrics.record_story_update();
                self.store
                    .set_state(StatePatch::default().stories_hash(hash))
                    .await
            }
            Some(composed) => {
                let stories = self
                    .store
                    .get_state()
                    .refs
                    .get(&composed.id)
                    .map_or_else(|| composed.stories.clone(), |latest| latest.stories.clone());
                let Some(mut hash) = stories else {
                    self.metrics.record_lookup_miss();
                    debug!(story_id, ref_id = %composed.id, "Update for ref without stories ignored");
                    return Ok(());
                };
                if !apply_update(hash.get_mut(story_id), update) {
                    self.metrics.record_lookup_miss();
                    debug!(story_id, ref_id = %composed.id, "Update for unknown ref story ignored");
                    return Ok(());
                }
                self.metrics.record_story_update();
                self.refs
                    .update_ref(&composed.id, RefUpdate::stories(hash))
                    .await
            }
        }
    }
}

/// 创建故事模块
pub fn create_stories_module(
    config: NavigationConfig,
    collaborators: Collaborators,
) -> Arc<StoriesModule> {
    Arc::new(StoriesModule::new(config, collaborators))
}

fn apply_update(node: Option<&mut HierarchyNode>, update: StoryUpdate) -> bool {
    let Some(HierarchyNode::Story(story)) = node else {
        return false;
    };
    if let Some(parameters) = update.parameters {
        story.parameters = parameters;
    }
    if let Some(initial_args) = update.initial_args {
        story.initial_args = initial_args;
    }
    if let Some(arg_types) = update.arg_types {
        story.arg_types = arg_types;
    }
    if let Some(args) = update.args {
        story.args = args;
    }
    if let Some(prepared) = update.prepared {
        story.prepared = prepared;
    }
    true
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
