//! 核心数据模型模块
//!
//! 定义故事记录、层级节点、故事哈希、索引载荷以及管理端状态。

pub mod hash;
pub mod index;
pub mod state;
pub mod story;

pub use hash::{GroupNode, HierarchyNode, RootNode, StoriesHash, StoryNode};
pub use index::{IndexEntry, OrderedEntries, SetStoriesPayload, StoryIndex, SUPPORTED_INDEX_VERSION};
pub use state::{ComposedRef, ManagerState, RefUpdate, StatePatch};
pub use story::{ArgTypes, Args, Parameters, StoryId, StoryInput, StoryUpdate, ViewMode};
