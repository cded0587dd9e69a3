//! Channel event payloads
//!
//! Events exchanged between the manager and the rendering frames.

use serde::{Deserialize, Serialize};

use crate::models::{Args, SetStoriesPayload, StoryId, StoryUpdate, ViewMode};

/// Frame target of the local preview
pub const PREVIEW_TARGET: &str = "storybook-preview-iframe";

/// Frame target of a ref
pub fn ref_target(ref_id: &str) -> String {
    format!("storybook-ref-{}", ref_id)
}

/// Addressing options of an outbound mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitOptions {
    pub target: String,
}

impl EmitOptions {
    pub fn for_ref(ref_id: Option<&str>) -> Self {
        Self {
            target: ref_id.map_or_else(|| PREVIEW_TARGET.to_string(), ref_target),
        }
    }
}

/// Payload of a `storyPrepared` notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryPreparedPayload {
    pub id: StoryId,
    #[serde(flatten)]
    pub update: StoryUpdate,
}

/// Events carried by the channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum StoryEvent {
    StorySpecified {
        story_id: StoryId,
        view_mode: ViewMode,
    },
    StoryChanged {
        story_id: StoryId,
    },
    SetStories(SetStoriesPayload),
    SelectStory {
        #[serde(default)]
        kind: Option<String>,
        #[serde(default)]
        story: Option<String>,
        #[serde(default)]
        view_mode: Option<ViewMode>,
    },
    StoryPrepared(StoryPreparedPayload),
    StoryArgsUpdated {
        story_id: StoryId,
        args: Args,
    },
    UpdateStoryArgs {
        story_id: StoryId,
        updated_args: Args,
        options: EmitOptions,
    },
    ResetStoryArgs {
        story_id: StoryId,
        #[serde(default)]
        arg_names: Option<Vec<String>>,
        options: EmitOptions,
    },
}

impl StoryEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            StoryEvent::StorySpecified { .. } => names::STORY_SPECIFIED,
            StoryEvent::StoryChanged { .. } => names::STORY_CHANGED,
            StoryEvent::SetStories(_) => names::SET_STORIES,
            StoryEvent::SelectStory { .. } => names::SELECT_STORY,
            StoryEvent::StoryPrepared(_) => names::STORY_PREPARED,
            StoryEvent::StoryArgsUpdated { .. } => names::STORY_ARGS_UPDATED,
            StoryEvent::UpdateStoryArgs { .. } => names::UPDATE_STORY_ARGS,
            StoryEvent::ResetStoryArgs { .. } => names::RESET_STORY_ARGS,
        }
    }
}

/// Event names on the wire
pub mod names {
    pub const STORY_SPECIFIED: &str = "storySpecified";
    pub const STORY_CHANGED: &str = "storyChanged";
    pub const SET_STORIES: &str = "setStories";
    pub const SELECT_STORY: &str = "selectStory";
    pub const STORY_PREPARED: &str = "storyPrepared";
    pub const STORY_ARGS_UPDATED: &str = "storyArgsUpdated";
    pub const UPDATE_STORY_ARGS: &str = "updateStoryArgs";
    pub const RESET_STORY_ARGS: &str = "resetStoryArgs";
}
