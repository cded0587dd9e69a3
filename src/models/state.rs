use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::hash::StoriesHash;
use crate::models::story::{StoryId, ViewMode};

/// 远程引用（ref）
///
/// 由引用注册表持有和持久化；本核心只读取并通过注册表写入。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComposedRef {
    pub id: String,
    pub title: Option<String>,
    pub url: Option<String>,
    /// 引用自己的故事哈希，未加载前为空
    pub stories: Option<StoriesHash>,
    /// 是否已收到索引
    pub configured: bool,
    pub error: Option<String>,
}

impl ComposedRef {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    /// 合并部分更新
    pub fn apply(&mut self, update: RefUpdate) {
        if let Some(title) = update.title {
            self.title = Some(title);
        }
        if let Some(url) = update.url {
            self.url = Some(url);
        }
        if let Some(stories) = update.stories {
            self.stories = Some(stories);
        }
        if let Some(configured) = update.configured {
            self.configured = configured;
        }
        if let Some(error) = update.error {
            self.error = error;
        }
    }
}

/// 引用的部分更新
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefUpdate {
    pub title: Option<String>,
    pub url: Option<String>,
    pub stories: Option<StoriesHash>,
    pub configured: Option<bool>,
    pub error: Option<Option<String>>,
}

impl RefUpdate {
    pub fn stories(stories: StoriesHash) -> Self {
        Self {
            stories: Some(stories),
            ..Default::default()
        }
    }
}

/// 管理端状态快照
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagerState {
    /// 本地故事哈希
    pub stories_hash: StoriesHash,
    /// 当前故事 ID
    pub story_id: Option<StoryId>,
    /// 当前引用 ID（`None` 表示本地）
    pub ref_id: Option<String>,
    /// 当前视图模式
    pub view_mode: Option<ViewMode>,
    /// 是否已成功加载索引
    pub stories_configured: bool,
    /// 终止性失败信息
    pub stories_failed: Option<String>,
    /// 首个已准备故事的 options 参数是否已传播
    pub has_called_set_options: bool,
    /// 已注册的引用
    pub refs: BTreeMap<String, ComposedRef>,
}

impl ManagerState {
    /// 以路由给出的初始选择创建状态
    pub fn new(story_id: Option<StoryId>, view_mode: Option<ViewMode>) -> Self {
        Self {
            story_id,
            view_mode,
            ..Default::default()
        }
    }

    /// 按引用 ID 取故事哈希；未知引用或引用尚无故事时为 `None`
    pub fn hash_for(&self, ref_id: Option<&str>) -> Option<&StoriesHash> {
        match ref_id {
            Some(ref_id) => self.refs.get(ref_id).and_then(|r| r.stories.as_ref()),
            None => Some(&self.stories_hash),
        }
    }

    /// 应用部分状态
    pub fn apply(&mut self, patch: StatePatch) {
        if let Some(hash) = patch.stories_hash {
            self.stories_hash = hash;
        }
        if let Some(story_id) = patch.story_id {
            self.story_id = story_id;
        }
        if let Some(ref_id) = patch.ref_id {
            self.ref_id = ref_id;
        }
        if let Some(view_mode) = patch.view_mode {
            self.view_mode = view_mode;
        }
        if let Some(configured) = patch.stories_configured {
            self.stories_configured = configured;
        }
        if let Some(failed) = patch.stories_failed {
            self.stories_failed = failed;
        }
        if let Some(latched) = patch.has_called_set_options {
            self.has_called_set_options = latched;
        }
    }
}

/// 部分状态（`setState` 的参数）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    pub stories_hash: Option<StoriesHash>,
    pub story_id: Option<Option<StoryId>>,
    pub ref_id: Option<Option<String>>,
    pub view_mode: Option<Option<ViewMode>>,
    pub stories_configured: Option<bool>,
    pub stories_failed: Option<Option<String>>,
    pub has_called_set_options: Option<bool>,
}

impl StatePatch {
    pub fn stories_hash(mut self, hash: StoriesHash) -> Self {
        self.stories_hash = Some(hash);
        self
    }

    /// 标记索引已加载，并记录失败信息
    pub fn configured(mut self, failed: Option<String>) -> Self {
        self.stories_configured = Some(true);
        self.stories_failed = Some(failed);
        self
    }

    /// 切换当前选择
    pub fn selection(
        mut self,
        story_id: Option<&str>,
        ref_id: Option<&str>,
        view_mode: Option<ViewMode>,
    ) -> Self {
        self.story_id = Some(story_id.map(str::to_string));
        self.ref_id = Some(ref_id.map(str::to_string));
        self.view_mode = Some(view_mode);
        self
    }

    pub fn options_propagated(mut self) -> Self {
        self.has_called_set_options = Some(true);
        self
    }
}
