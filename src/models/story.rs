use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// 故事参数（任意键值元数据）
pub type Parameters = Map<String, Value>;

/// 故事参数值
pub type Args = Map<String, Value>;

/// 参数类型描述
pub type ArgTypes = Map<String, Value>;

/// 故事 ID
pub type StoryId = String;

/// 视图模式
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ViewMode {
    /// 画布视图
    #[default]
    Story,
    /// 文档视图
    Docs,
    /// 信息视图
    Info,
    /// 设置页
    Settings,
    /// 插件自定义视图
    Other(String),
}

impl ViewMode {
    /// 是否可以作为导航目标
    pub fn is_navigable(&self) -> bool {
        matches!(self, ViewMode::Story | ViewMode::Docs)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ViewMode::Story => "story",
            ViewMode::Docs => "docs",
            ViewMode::Info => "info",
            ViewMode::Settings => "settings",
            ViewMode::Other(mode) => mode,
        }
    }
}

impl From<String> for ViewMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "story" => ViewMode::Story,
            "docs" => ViewMode::Docs,
            "info" => ViewMode::Info,
            "settings" => ViewMode::Settings,
            _ => ViewMode::Other(value),
        }
    }
}

impl From<&str> for ViewMode {
    fn from(value: &str) -> Self {
        ViewMode::from(value.to_string())
    }
}

impl From<ViewMode> for String {
    fn from(mode: ViewMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 原始故事记录
///
/// 来自旧版全量载荷或由 v3 索引转换而来，已完成参数反规范化。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoryInput {
    /// 故事 ID（载荷中缺省时取映射键）
    pub id: StoryId,
    /// 标题路径，以 `/` 分隔
    pub kind: String,
    /// 故事名称
    pub name: String,
    /// 参数
    pub parameters: Option<Parameters>,
    /// 当前参数值
    pub args: Args,
    /// 初始参数值
    pub initial_args: Args,
    /// 参数类型
    pub arg_types: ArgTypes,
}

impl StoryInput {
    /// 创建新故事记录
    pub fn new(id: &str, kind: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// 设置参数
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

/// 故事更新内容
///
/// 每个 `Some` 字段整体替换节点上的对应字段，其余字段保持不变。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoryUpdate {
    pub parameters: Option<Parameters>,
    pub initial_args: Option<Args>,
    pub arg_types: Option<ArgTypes>,
    pub args: Option<Args>,
    pub prepared: Option<bool>,
}

impl StoryUpdate {
    /// 仅更新参数值
    pub fn args(args: Args) -> Self {
        Self {
            args: Some(args),
            ..Default::default()
        }
    }

    /// 标记为已准备
    pub fn prepared(mut self) -> Self {
        self.prepared = Some(true);
        self
    }
}
