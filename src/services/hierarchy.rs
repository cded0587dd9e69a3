//! 层级构建
//!
//! 把扁平的故事记录折叠为根/分组/故事三层结构的故事哈希。

use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::config::NavigationConfig;
use crate::error::{AppError, Result};
use crate::models::{
    GroupNode, HierarchyNode, Parameters, RootNode, SetStoriesPayload, StoriesHash, StoryIndex,
    StoryInput, StoryNode,
};
use crate::services::resolver::sanitize;

/// 标题路径分隔符
pub const TITLE_PATH_SEPARATOR: char = '/';

/// 构建选项
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// 标题首段是否作为根；`None` 视为启用
    pub show_roots: Option<bool>,
    pub collapsed_roots: Vec<String>,
    /// 新建故事节点的 prepared 标记
    pub prepared: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            show_roots: None,
            collapsed_roots: Vec::new(),
            prepared: true,
        }
    }
}

impl From<&NavigationConfig> for BuildOptions {
    fn from(config: &NavigationConfig) -> Self {
        Self {
            show_roots: config.show_roots,
            collapsed_roots: config.collapsed_roots.clone(),
            prepared: true,
        }
    }
}

impl BuildOptions {
    pub fn unprepared(mut self) -> Self {
        self.prepared = false;
        self
    }

    fn roots_enabled(&self) -> bool {
        self.show_roots.unwrap_or(true)
    }
}

/// 深度合并参数：对象逐层合并，其他值后者覆盖前者
pub fn combine_parameters(sets: &[Option<&Parameters>]) -> Parameters {
    let mut combined = Parameters::new();
    for set in sets.iter().flatten() {
        merge_into(&mut combined, set);
    }
    combined
}

fn merge_into(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_into(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// 将全局参数和标题参数下沉到每个故事
pub fn denormalize_story_parameters(payload: &SetStoriesPayload) -> Vec<StoryInput> {
    payload
        .raw_stories()
        .into_iter()
        .map(|mut story| {
            let parameters = combine_parameters(&[
                Some(&payload.global_parameters),
                payload.kind_parameters.get(&story.kind),
                story.parameters.as_ref(),
            ]);
            story.parameters = Some(parameters);
            story
        })
        .collect()
}

/// 按载荷版本取得故事记录：有版本号时反规范化，否则原样使用
pub fn stories_from_payload(payload: &SetStoriesPayload) -> Vec<StoryInput> {
    if payload.v.is_some() {
        denormalize_story_parameters(payload)
    } else {
        payload.raw_stories()
    }
}

/// 由 v3 索引构建故事哈希，故事均为未准备状态
pub fn transform_story_index_to_stories_hash(
    index: &StoryIndex,
    options: &BuildOptions,
) -> Result<StoriesHash> {
    let mut count_by_title: HashMap<&str, usize> = HashMap::new();
    for entry in index.stories.values() {
        *count_by_title.entry(entry.title.as_str()).or_default() += 1;
    }

    let input: Vec<StoryInput> = index
        .stories
        .iter()
        .map(|(key, entry)| {
            let docs_only = entry.name == "Page" && count_by_title.get(entry.title.as_str()) == Some(&1);
            let mut parameters = Parameters::new();
            parameters.insert("fileName".into(), json!(entry.import_path));
            parameters.insert("options".into(), json!({}));
            parameters.insert("docsOnly".into(), json!(docs_only));
            if let Some(own) = &entry.parameters {
                for (name, value) in own {
                    parameters.insert(name.clone(), value.clone());
                }
            }

            let id = if entry.id.is_empty() { key } else { entry.id.as_str() };
            StoryInput::new(id, &entry.title, &entry.name).with_parameters(parameters)
        })
        .collect();

    transform_stories_raw_to_stories_hash(&input, &options.clone().unprepared())
}

/// 由原始故事记录构建故事哈希
///
/// 结果顺序：无父分组（按首次出现）及其子树在前，根节点及其子树在后，
/// 均为深度优先先序。
pub fn transform_stories_raw_to_stories_hash(
    input: &[StoryInput],
    options: &BuildOptions,
) -> Result<StoriesHash> {
    let uses_old_separator = input
        .iter()
        .any(|story| story.kind.contains('.') || story.kind.contains('|'));
    if uses_old_separator && options.show_roots.is_none() {
        warn!("Titles use the legacy '.' or '|' hierarchy separators, only '/' creates groups");
    }

    let mut staged = StoriesHash::new();

    for item in input {
        let groups: Vec<&str> = item
            .kind
            .trim()
            .split(TITLE_PATH_SEPARATOR)
            .map(str::trim)
            .collect();
        let has_root = options.roots_enabled() && groups.len() > 1;
        let parameters = item.parameters.clone().unwrap_or_default();

        let mut chain: Vec<String> = Vec::with_capacity(groups.len());
        for (depth, name) in groups.iter().enumerate() {
            let parent = chain.last().cloned();
            let id = match &parent {
                Some(parent) => sanitize(&format!("{}-{}", parent, name)),
                None => sanitize(name),
            };
            if id.is_empty() || parent.as_deref() == Some(id.as_str()) {
                return Err(AppError::InvalidTitle(format!(
                    "invalid part '{}', leading to id '{}' inside kind '{}'",
                    name, id, item.kind
                )));
            }

            stage_group(&mut staged, &id, name, parent, depth, has_root, &parameters, options);
            chain.push(id);
        }

        for pair in chain.windows(2) {
            append_child(&mut staged, Some(&pair[0]), &pair[1]);
        }
        append_child(&mut staged, chain.last().map(String::as_str), &item.id);

        let parent = chain.last().cloned().unwrap_or_default();
        let story = StoryNode {
            id: item.id.clone(),
            name: item.name.clone(),
            kind: item.kind.clone(),
            parent,
            depth: chain.len(),
            parameters,
            args: item.args.clone(),
            initial_args: item.initial_args.clone(),
            arg_types: item.arg_types.clone(),
            prepared: options.prepared,
            ref_id: None,
        };
        match staged.get_mut(&item.id) {
            Some(existing) => *existing = HierarchyNode::Story(story),
            None => staged.insert(HierarchyNode::Story(story)),
        }
    }

    let hash = order_depth_first(staged);
    debug!(nodes = hash.len(), "Built stories hash");
    Ok(hash)
}

#[allow(clippy::too_many_arguments)]
fn stage_group(
    staged: &mut StoriesHash,
    id: &str,
    name: &str,
    parent: Option<String>,
    depth: usize,
    has_root: bool,
    parameters: &Parameters,
    options: &BuildOptions,
) {
    if let Some(existing) = staged.get_mut(id) {
        if let HierarchyNode::Group(group) = existing {
            for key in ["docsOnly", "viewMode"] {
                if let Some(value) = parameters.get(key) {
                    group.parameters.insert(key.to_string(), value.clone());
                }
            }
        }
        return;
    }

    let node = if has_root && depth == 0 {
        HierarchyNode::Root(RootNode {
            id: id.to_string(),
            name: name.to_string(),
            depth,
            children: Vec::new(),
            start_collapsed: options.collapsed_roots.iter().any(|root| root == id),
            ref_id: None,
        })
    } else {
        let mut group_parameters = Parameters::new();
        for key in ["docsOnly", "viewMode"] {
            if let Some(value) = parameters.get(key) {
                group_parameters.insert(key.to_string(), value.clone());
            }
        }
        HierarchyNode::Group(GroupNode {
            id: id.to_string(),
            name: name.to_string(),
            parent,
            depth,
            children: Vec::new(),
            is_component: false,
            parameters: group_parameters,
            ref_id: None,
        })
    };
    staged.insert(node);
}

fn append_child(staged: &mut StoriesHash, parent: Option<&str>, child: &str) {
    let Some(parent) = parent.and_then(|id| staged.get_mut(id)) else {
        return;
    };
    let children = match parent {
        HierarchyNode::Root(root) => &mut root.children,
        HierarchyNode::Group(group) => &mut group.children,
        HierarchyNode::Story(_) => return,
    };
    if !children.iter().any(|existing| existing == child) {
        children.push(child.to_string());
    }
}

fn order_depth_first(mut staged: StoriesHash) -> StoriesHash {
    let leaves: HashSet<String> = staged
        .iter()
        .filter(|(_, node)| node.is_leaf())
        .map(|(id, _)| id.to_string())
        .collect();
    for node in staged.values_mut() {
        if let HierarchyNode::Group(group) = node {
            group.is_component = group.children.iter().all(|child| leaves.contains(child));
        }
    }

    let orphans = staged
        .iter()
        .filter(|(_, node)| matches!(node, HierarchyNode::Group(group) if group.parent.is_none()));
    let roots = staged.iter().filter(|(_, node)| node.is_root());
    let starts: Vec<String> = orphans.chain(roots).map(|(id, _)| id.to_string()).collect();

    let mut ordered = StoriesHash::new();
    for start in starts {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if ordered.contains(&id) {
                continue;
            }
            let Some(node) = staged.get(&id) else {
                continue;
            };
            stack.extend(node.children().iter().rev().cloned());
            ordered.insert(node.clone());
        }
    }
    ordered
}

/// 给哈希中所有节点标注所属引用
pub fn attach_ref_id(hash: &mut StoriesHash, ref_id: &str) {
    for node in hash.values_mut() {
        node.set_ref_id(ref_id);
    }
}
