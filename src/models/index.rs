use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use crate::models::story::{Parameters, StoryId, StoryInput};

/// 唯一被接受的索引版本
pub const SUPPORTED_INDEX_VERSION: u64 = 3;

/// 保持键顺序的 JSON 对象
///
/// 故事的书写顺序决定层级中的兄弟顺序，不能经由无序映射中转。
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedEntries<T>(pub Vec<(String, T)>);

impl<T> Default for OrderedEntries<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> OrderedEntries<T> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> + '_ {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.0.iter().map(|(_, value)| value)
    }
}

impl<T> IntoIterator for OrderedEntries<T> {
    type Item = (String, T);
    type IntoIter = std::vec::IntoIter<(String, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<T> FromIterator<(String, T)> for OrderedEntries<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: Serialize> Serialize for OrderedEntries<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(key, value)| (key, value)))
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedEntries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = OrderedEntries<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// 旧版全量故事载荷（SET_STORIES）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SetStoriesPayload {
    /// 载荷版本；缺省表示未经规范化的旧格式
    pub v: Option<u64>,
    /// 全局参数
    pub global_parameters: Parameters,
    /// 按标题声明的参数
    pub kind_parameters: HashMap<String, Parameters>,
    /// 故事记录
    pub stories: OrderedEntries<StoryInput>,
    /// 预览端报告的失败信息
    pub error: Option<String>,
}

impl SetStoriesPayload {
    /// 未版本化的故事记录，映射键补全缺省的 ID
    pub fn raw_stories(&self) -> Vec<StoryInput> {
        self.stories
            .iter()
            .map(|(key, story)| {
                let mut story = story.clone();
                if story.id.is_empty() {
                    story.id = key.to_string();
                }
                story
            })
            .collect()
    }
}

/// v3 索引条目
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexEntry {
    pub id: StoryId,
    pub title: String,
    pub name: String,
    pub import_path: String,
    pub parameters: Option<Parameters>,
}

/// v3 故事索引
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryIndex {
    pub v: u64,
    pub stories: OrderedEntries<IndexEntry>,
}

/// 只读取版本号，用于在完整解析前筛选索引
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VersionProbe {
    pub v: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_document_order() {
        let entries: OrderedEntries<u32> =
            serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_raw_stories_fill_missing_id() {
        let payload: SetStoriesPayload = serde_json::from_str(
            r#"{"stories": {"a--b": {"kind": "A", "name": "B"}}}"#,
        )
        .unwrap();
        assert_eq!(payload.v, None);
        assert_eq!(payload.raw_stories()[0].id, "a--b");
    }

    #[test]
    fn test_story_index_parses_entries() {
        let index: StoryIndex = serde_json::from_str(
            r#"{"v": 3, "stories": {"a--b": {"id": "a--b", "title": "A", "name": "B", "importPath": "./a.stories.js"}}}"#,
        )
        .unwrap();
        assert_eq!(index.v, 3);
        assert_eq!(index.stories.0[0].1.import_path, "./a.stories.js");
    }
}
