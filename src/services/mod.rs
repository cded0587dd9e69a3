//! 服务模块

pub mod hierarchy;
pub mod navigation;
pub mod refs;
pub mod resolver;
pub mod router;
pub mod stories;
pub mod sync;
pub mod ui;

pub use hierarchy::{
    BuildOptions, transform_stories_raw_to_stories_hash, transform_story_index_to_stories_hash,
};
pub use navigation::{Direction, SelectOptions, find_leaf_story_id};
pub use resolver::{sanitize, to_id};
pub use router::{RecordingRouter, Router, TracingRouter};
pub use stories::{Collaborators, StoriesModule, StoryTarget, create_stories_module};
pub use ui::{HeadlessUi, UiBridge};
