//! 导航引擎
//!
//! 由 ID 或标题/名称计算导航路径，并在故事与组件之间前后跳转。
//! 只向路由发出路径，从不修改故事哈希。

use tracing::debug;

use crate::error::Result;
use crate::models::{HierarchyNode, StoriesHash, ViewMode};
use crate::services::resolver::{
    kind_prefix, resolve_node, resolve_story_id, resolve_title_and_name, to_id,
};
use crate::services::stories::StoriesModule;

/// 跳转方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

impl Direction {
    fn step(self, position: usize, len: usize) -> Option<usize> {
        match self {
            Direction::Previous => position.checked_sub(1),
            Direction::Next => Some(position + 1).filter(|next| *next < len),
        }
    }
}

/// 选择选项
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectOptions {
    pub ref_id: Option<String>,
    pub view_mode: Option<ViewMode>,
}

impl SelectOptions {
    pub fn in_ref(ref_id: &str) -> Self {
        Self {
            ref_id: Some(ref_id.to_string()),
            ..Default::default()
        }
    }

    pub fn view_mode(mut self, view_mode: ViewMode) -> Self {
        self.view_mode = Some(view_mode);
        self
    }
}

/// 从任意节点下降到第一个故事
///
/// 未知 ID 或没有子节点的分组返回 `None`。
pub fn find_leaf_story_id(hash: &StoriesHash, story_id: &str) -> Option<String> {
    let mut current = hash.get(story_id)?;
    // 森林无环，深度以节点数为上界
    for _ in 0..=hash.len() {
        match current {
            HierarchyNode::Story(story) => return Some(story.id.clone()),
            node => current = hash.get(node.children().first()?)?,
        }
    }
    None
}

/// 在有序列表中从当前位置移动一步
///
/// 当前 ID 不在列表中时，向后移动落到第一个元素，向前移动不产生结果。
fn neighbour<'a>(list: &[&'a str], current: &str, direction: Direction) -> Option<&'a str> {
    let next = match list.iter().position(|id| *id == current) {
        Some(position) => direction.step(position, list.len())?,
        None if direction == Direction::Next => 0,
        None => return None,
    };
    list.get(next).copied()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl StoriesModule {
    /// 选择故事
    ///
    /// - 只给出 `kind_or_id`：按 ID 或标题解析并导航；
    /// - 只给出 `name`：标题取自当前故事 ID 的前缀；
    /// - 两者都给出：组合 ID，不存在时按旧版永久链接查找，未命中则不导航。
    pub fn select_story(
        &self,
        kind_or_id: Option<&str>,
        name: Option<&str>,
        options: SelectOptions,
    ) -> Result<()> {
        let state = self.store.get_state();
        let ref_id = non_empty(options.ref_id.as_deref());
        let Some(hash) = state.hash_for(ref_id) else {
            self.metrics.record_lookup_miss();
            debug!(ref_id, "Selection in unknown ref ignored");
            return Ok(());
        };

        match (non_empty(kind_or_id), non_empty(name)) {
            (Some(id), None) => {
                self.navigate_to_id(hash, id, state.view_mode.as_ref(), &options);
                Ok(())
            }
            (None, Some(name)) => {
                let Some(current) = state.story_id.as_deref() else {
                    debug!(name, "Selection by name without a current story ignored");
                    return Ok(());
                };
                let id = to_id(kind_prefix(current), name)?;
                self.navigate_to_id(hash, &id, state.view_mode.as_ref(), &options);
                Ok(())
            }
            (Some(kind), Some(name)) => {
                match resolve_title_and_name(hash, kind, name)? {
                    Some(id) => self.navigate_to_id(hash, &id, state.view_mode.as_ref(), &options),
                    None => {
                        self.metrics.record_lookup_miss();
                        debug!(kind, name, "No story matches title and name");
                    }
                }
                Ok(())
            }
            (None, None) => {
                debug!("Selection without target ignored");
                Ok(())
            }
        }
    }

    fn navigate_to_id(
        &self,
        hash: &StoriesHash,
        input: &str,
        current_view_mode: Option<&ViewMode>,
        options: &SelectOptions,
    ) {
        let id = resolve_story_id(hash, input);
        let node = resolve_node(hash, input);

        let declared = node.and_then(HierarchyNode::declared_view_mode);
        let view_mode = options
            .view_mode
            .clone()
            .or(declared)
            .or_else(|| current_view_mode.cloned())
            .filter(ViewMode::is_navigable)
            .unwrap_or_default();

        let ref_id = non_empty(options.ref_id.as_deref()).or_else(|| node.and_then(|n| n.ref_id()));
        let path = match ref_id {
            Some(ref_id) => format!("/{}/{}_{}", view_mode, ref_id, id),
            None => format!("/{}/{}", view_mode, id),
        };
        self.navigate(&path);
    }

    pub(crate) fn navigate(&self, path: &str) {
        debug!(path, "Navigating");
        self.metrics.record_navigation();
        self.router.navigate(path);
    }

    /// 选择枚举顺序中的第一个故事；哈希为空时回到根路径
    pub fn select_first_story(&self) -> Result<()> {
        let state = self.store.get_state();
        match state.stories_hash.leaf_ids().first() {
            Some(first) => self.select_story(Some(first), None, SelectOptions::default()),
            None => {
                self.navigate("/");
                Ok(())
            }
        }
    }

    /// 在故事之间跳转
    ///
    /// 列表来自当前故事所属的哈希（引用或本地）。文档模式下按组件跳转。
    pub fn jump_to_story(&self, direction: Direction) -> Result<()> {
        if self.config.docs_mode {
            return self.jump_to_component(direction);
        }

        let state = self.store.get_state();
        let Some(current) = state.story_id.as_deref() else {
            return Ok(());
        };
        let Some(node) = self.get_data(current, state.ref_id.as_deref()) else {
            return Ok(());
        };
        let owner = node.ref_id();
        let Some(hash) = state.hash_for(owner) else {
            self.metrics.record_lookup_miss();
            return Ok(());
        };

        let leaves = hash.leaf_ids();
        match neighbour(&leaves, current, direction) {
            Some(target) => self.select_story(Some(target), None, self.options_for(owner)),
            None => Ok(()),
        }
    }

    /// 在组件之间跳转，目标为相邻组件的第一个子节点
    pub fn jump_to_component(&self, direction: Direction) -> Result<()> {
        let state = self.store.get_state();
        let Some(current) = state.story_id.as_deref() else {
            return Ok(());
        };
        let ref_id = state.ref_id.as_deref();
        if self.get_data(current, ref_id).is_none() {
            return Ok(());
        }
        let Some(hash) = state.hash_for(ref_id) else {
            return Ok(());
        };

        let components = hash.component_children();
        let firsts: Vec<&str> = components
            .iter()
            .filter_map(|children| children.first().map(String::as_str))
            .collect();
        let containing = components
            .iter()
            .position(|children| children.iter().any(|child| child == current))
            .and_then(|position| components[position].first())
            .map_or("", String::as_str);

        match neighbour(&firsts, containing, direction) {
            Some(target) => self.select_story(Some(target), None, self.options_for(ref_id)),
            None => Ok(()),
        }
    }

    fn options_for(&self, ref_id: Option<&str>) -> SelectOptions {
        SelectOptions {
            ref_id: ref_id.map(str::to_string),
            view_mode: None,
        }
    }
}
