//! 标识符解析
//!
//! 把标题/名称对、旧版永久链接和部分 ID 规范化为故事 ID。所有函数均为纯函数。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::{HierarchyNode, StoriesHash};
use crate::services::navigation::find_leaf_story_id;

/// 标题与名称之间的分隔符
pub const ID_SEPARATOR: &str = "--";

static SEPARATOR_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[ ’–—―′¿'`~!@#$%^&*()_|+\-=?;:",.<>{}\[\]\\/]"#).expect("valid separator pattern")
});

static DASH_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new("-+").expect("valid dash pattern"));

/// 将任意文本转换为 ID 片段
pub fn sanitize(input: &str) -> String {
    let lowered = input.to_lowercase();
    let dashed = SEPARATOR_CHARS.replace_all(&lowered, "-");
    let collapsed = DASH_RUNS.replace_all(&dashed, "-");
    collapsed.trim_matches('-').to_string()
}

fn sanitize_part(input: &str, part: &str) -> Result<String> {
    let sanitized = sanitize(input);
    if sanitized.is_empty() {
        return Err(AppError::InvalidIdentifier(format!(
            "invalid {} '{}', must include alphanumeric characters",
            part, input
        )));
    }
    Ok(sanitized)
}

/// 由标题和名称组合故事 ID
pub fn to_id(kind: &str, name: &str) -> Result<String> {
    Ok(format!(
        "{}{}{}",
        sanitize_part(kind, "kind")?,
        ID_SEPARATOR,
        sanitize_part(name, "name")?
    ))
}

/// 按原样或规范化后的形式查找节点
pub fn resolve_node<'a>(hash: &'a StoriesHash, input: &str) -> Option<&'a HierarchyNode> {
    hash.get(input).or_else(|| hash.get(&sanitize(input)))
}

/// 把任意输入解析为可导航的具体 ID
///
/// 分组和根节点下降到第一个叶子；未命中时原样返回输入。
pub fn resolve_story_id(hash: &StoriesHash, input: &str) -> String {
    match resolve_node(hash, input) {
        Some(HierarchyNode::Story(story)) => story.id.clone(),
        Some(node) => {
            find_leaf_story_id(hash, node.id()).unwrap_or_else(|| node.id().to_string())
        }
        None => input.to_string(),
    }
}

/// 解析标题/名称对
///
/// 先尝试当前 ID 规则；不存在时在标题对应的分组中按名称精确匹配故事子节点，
/// 以兼容旧版永久链接（标题为 `x/y`，而链接名称与故事名称不同）。
pub fn resolve_title_and_name(hash: &StoriesHash, kind: &str, name: &str) -> Result<Option<String>> {
    let id = to_id(kind, name)?;
    if hash.contains(&id) {
        return Ok(Some(id));
    }

    let legacy = hash.get(&sanitize(kind)).and_then(|group| {
        group
            .children()
            .iter()
            .find(|child| match hash.get(child.as_str()) {
                Some(HierarchyNode::Story(story)) => story.name == name,
                _ => false,
            })
            .cloned()
    });
    Ok(legacy)
}

/// 当前故事 ID 的标题前缀
pub fn kind_prefix(story_id: &str) -> &str {
    story_id.split(ID_SEPARATOR).next().unwrap_or(story_id)
}
