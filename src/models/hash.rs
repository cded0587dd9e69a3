//! 故事层级节点与有序哈希
//!
//! 节点以扁平映射存储，父子关系只通过 ID 引用，枚举顺序即渲染顺序。

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::index::OrderedEntries;
use crate::models::story::{ArgTypes, Args, Parameters, StoryId, ViewMode};

/// 根节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootNode {
    pub id: String,
    pub name: String,
    pub depth: usize,
    pub children: Vec<String>,
    #[serde(default)]
    pub start_collapsed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
}

/// 分组节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    pub depth: usize,
    pub children: Vec<String>,
    /// 子节点全部为故事
    #[serde(default)]
    pub is_component: bool,
    /// 从所属故事复制的 `docsOnly` / `viewMode`
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
}

/// 故事节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryNode {
    pub id: StoryId,
    pub name: String,
    pub kind: String,
    pub parent: String,
    pub depth: usize,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub args: Args,
    #[serde(default)]
    pub initial_args: Args,
    #[serde(default)]
    pub arg_types: ArgTypes,
    #[serde(default)]
    pub prepared: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
}

/// 层级节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HierarchyNode {
    Root(RootNode),
    Group(GroupNode),
    Story(StoryNode),
}

impl HierarchyNode {
    pub fn id(&self) -> &str {
        match self {
            HierarchyNode::Root(root) => &root.id,
            HierarchyNode::Group(group) => &group.id,
            HierarchyNode::Story(story) => &story.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            HierarchyNode::Root(root) => &root.name,
            HierarchyNode::Group(group) => &group.name,
            HierarchyNode::Story(story) => &story.name,
        }
    }

    pub fn parent(&self) -> Option<&str> {
        match self {
            HierarchyNode::Root(_) => None,
            HierarchyNode::Group(group) => group.parent.as_deref(),
            HierarchyNode::Story(story) => Some(&story.parent),
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            HierarchyNode::Root(root) => root.depth,
            HierarchyNode::Group(group) => group.depth,
            HierarchyNode::Story(story) => story.depth,
        }
    }

    /// 子节点 ID；故事节点没有子节点
    pub fn children(&self) -> &[String] {
        match self {
            HierarchyNode::Root(root) => &root.children,
            HierarchyNode::Group(group) => &group.children,
            HierarchyNode::Story(_) => &[],
        }
    }

    pub fn ref_id(&self) -> Option<&str> {
        match self {
            HierarchyNode::Root(root) => root.ref_id.as_deref(),
            HierarchyNode::Group(group) => group.ref_id.as_deref(),
            HierarchyNode::Story(story) => story.ref_id.as_deref(),
        }
    }

    pub fn set_ref_id(&mut self, ref_id: &str) {
        let slot = match self {
            HierarchyNode::Root(root) => &mut root.ref_id,
            HierarchyNode::Group(group) => &mut group.ref_id,
            HierarchyNode::Story(story) => &mut story.ref_id,
        };
        *slot = Some(ref_id.to_string());
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, HierarchyNode::Story(_))
    }

    pub fn is_root(&self) -> bool {
        matches!(self, HierarchyNode::Root(_))
    }

    pub fn is_component(&self) -> bool {
        matches!(self, HierarchyNode::Group(group) if group.is_component)
    }

    /// 节点参数中声明的视图模式
    pub fn declared_view_mode(&self) -> Option<ViewMode> {
        let parameters = match self {
            HierarchyNode::Root(_) => return None,
            HierarchyNode::Group(group) => &group.parameters,
            HierarchyNode::Story(story) => &story.parameters,
        };
        parameters
            .get("viewMode")
            .and_then(|mode| mode.as_str())
            .map(ViewMode::from)
    }

    pub fn as_story(&self) -> Option<&StoryNode> {
        match self {
            HierarchyNode::Story(story) => Some(story),
            _ => None,
        }
    }
}

/// 故事哈希
///
/// ID 到节点的映射，保持插入顺序。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoriesHash {
    order: Vec<String>,
    nodes: HashMap<String, HierarchyNode>,
}

impl StoriesHash {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入节点；已存在的 ID 保持原有位置
    pub fn insert(&mut self, node: HierarchyNode) {
        let id = node.id().to_string();
        if self.nodes.insert(id.clone(), node).is_none() {
            self.order.push(id);
        }
    }

    pub fn get(&self, id: &str) -> Option<&HierarchyNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut HierarchyNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 按枚举顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HierarchyNode)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.nodes.get(id).map(|node| (id.as_str(), node)))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut HierarchyNode> + '_ {
        self.nodes.values_mut()
    }

    /// 所有叶子故事 ID（枚举顺序）
    pub fn leaf_ids(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(id, _)| id)
            .collect()
    }

    /// 每个组件分组的子节点列表（枚举顺序）
    pub fn component_children(&self) -> Vec<&[String]> {
        self.iter()
            .filter(|(_, node)| node.is_component())
            .map(|(_, node)| node.children())
            .collect()
    }
}

impl Serialize for StoriesHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for StoriesHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = OrderedEntries::<HierarchyNode>::deserialize(deserializer)?;
        Ok(entries.into_iter().map(|(_, node)| node).collect())
    }
}

impl FromIterator<HierarchyNode> for StoriesHash {
    fn from_iter<I: IntoIterator<Item = HierarchyNode>>(iter: I) -> Self {
        let mut hash = StoriesHash::new();
        for node in iter {
            hash.insert(node);
        }
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str, children: &[&str]) -> HierarchyNode {
        HierarchyNode::Group(GroupNode {
            id: id.into(),
            name: id.into(),
            parent: None,
            depth: 0,
            children: children.iter().map(|c| c.to_string()).collect(),
            is_component: true,
            parameters: Parameters::new(),
            ref_id: None,
        })
    }

    fn story(id: &str, parent: &str) -> HierarchyNode {
        HierarchyNode::Story(StoryNode {
            id: id.into(),
            name: id.into(),
            kind: parent.into(),
            parent: parent.into(),
            depth: 1,
            parameters: Parameters::new(),
            args: Args::new(),
            initial_args: Args::new(),
            arg_types: ArgTypes::new(),
            prepared: false,
            ref_id: None,
        })
    }

    #[test]
    fn test_insert_keeps_first_position() {
        let mut hash: StoriesHash =
            vec![group("b", &["b--x"]), story("b--x", "b")].into_iter().collect();
        hash.insert(group("b", &["b--x", "b--y"]));

        assert_eq!(hash.ids().collect::<Vec<_>>(), vec!["b", "b--x"]);
        assert_eq!(hash.get("b").unwrap().children().len(), 2);
    }

    #[test]
    fn test_leaf_and_component_lists() {
        let hash: StoriesHash = vec![
            group("a", &["a--one", "a--two"]),
            story("a--one", "a"),
            story("a--two", "a"),
        ]
        .into_iter()
        .collect();

        assert_eq!(hash.leaf_ids(), vec!["a--one", "a--two"]);
        assert_eq!(hash.component_children().len(), 1);
    }

    #[test]
    fn test_serde_preserves_order() {
        let hash: StoriesHash = vec![group("z", &["z--a"]), story("z--a", "z")]
            .into_iter()
            .collect();

        let json = serde_json::to_string(&hash).unwrap();
        assert!(json.find("\"z\"").unwrap() < json.find("\"z--a\"").unwrap());

        let decoded: StoriesHash = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, hash);
    }

    #[test]
    fn test_declared_view_mode() {
        let mut node = story("a--one", "a");
        if let HierarchyNode::Story(story) = &mut node {
            story
                .parameters
                .insert("viewMode".into(), serde_json::json!("docs"));
        }
        assert_eq!(node.declared_view_mode(), Some(ViewMode::Docs));
    }
}
