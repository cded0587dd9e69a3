//! 同步协议
//!
//! 处理来自本地预览和引用框架的事件，并向所属框架发出参数变更请求。
//! 每条消息依次处理，处理器在读取最新状态后提交变更。

use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

use crate::channel::{ChannelMessage, EmitOptions, Origin, StoryEvent, StoryPreparedPayload};
use crate::error::{AppError, Result};
use crate::models::{Args, SetStoriesPayload, StatePatch, StoryNode, StoryUpdate, ViewMode};
use crate::services::hierarchy::stories_from_payload;
use crate::services::navigation::SelectOptions;
use crate::services::stories::StoriesModule;

/// 已弃用的 `options` 参数键
pub const DEPRECATED_OPTION_KEYS: [&str; 3] = ["enableShortcuts", "theme", "showRoots"];

impl StoriesModule {
    /// 启动：获取初始索引
    ///
    /// 获取失败只记录日志，等待预览端发来全量载荷。
    pub async fn init(&self) -> Result<()> {
        match self.fetch_story_list().await {
            Ok(()) => Ok(()),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(error = %e, "Initial story index unavailable, awaiting setStories");
                Ok(())
            }
        }
    }

    /// 持续消费事件直到通道关闭；协议违规会终止循环
    pub async fn run(&self, mut rx: broadcast::Receiver<ChannelMessage>) -> Result<()> {
        info!("Story sync loop started");
        loop {
            match rx.recv().await {
                Ok(message) => {
                    if let Err(e) = self.dispatch(message).await {
                        if e.is_fatal() {
                            error!(error = %e, "Story sync loop stopped");
                            return Err(e);
                        }
                        warn!(error = %e, "Event handling failed");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Story sync loop lagged behind the channel");
                }
                Err(RecvError::Closed) => {
                    info!("Channel closed, story sync loop finished");
                    return Ok(());
                }
            }
        }
    }

    /// 处理单条消息
    pub async fn dispatch(&self, message: ChannelMessage) -> Result<()> {
        let ChannelMessage { origin, event } = message;
        self.metrics.record_event();
        debug!(event = event.name(), origin = %origin, "Dispatching event");

        match event {
            StoryEvent::StorySpecified { story_id, view_mode } => {
                self.on_story_specified(&origin, &story_id, view_mode);
                Ok(())
            }
            StoryEvent::StoryChanged { .. } => {
                if origin == Origin::Local {
                    self.propagate_current_options();
                }
                Ok(())
            }
            StoryEvent::SetStories(payload) => self.on_set_stories(&origin, payload).await,
            StoryEvent::SelectStory {
                kind,
                story,
                view_mode,
            } => {
                let options = SelectOptions {
                    ref_id: origin.ref_id().map(str::to_string),
                    view_mode,
                };
                self.select_story(kind.as_deref(), story.as_deref(), options)
            }
            StoryEvent::StoryPrepared(payload) => self.on_story_prepared(&origin, payload).await,
            StoryEvent::StoryArgsUpdated { story_id, args } => {
                let composed = self.origin_ref(&origin);
                self.update_story(&story_id, StoryUpdate::args(args), composed.as_ref())
                    .await
            }
            StoryEvent::UpdateStoryArgs { .. } | StoryEvent::ResetStoryArgs { .. } => Ok(()),
        }
    }

    fn on_story_specified(&self, origin: &Origin, story_id: &str, view_mode: ViewMode) {
        if self.ui.is_settings_screen_active() {
            debug!(story_id, "Settings screen active, storySpecified ignored");
            return;
        }
        if *origin != Origin::Local {
            return;
        }

        let state = self.store.get_state();
        let same_story = state.story_id.as_deref() == Some(story_id);
        let same_mode = state.view_mode.as_ref() == Some(&view_mode);
        if !same_story || !same_mode {
            self.navigate(&format!("/{}/{}", view_mode, story_id));
        }
    }

    async fn on_set_stories(&self, origin: &Origin, payload: SetStoriesPayload) -> Result<()> {
        match self.origin_ref(origin) {
            None => {
                if payload.v.is_none() {
                    self.metrics.record_protocol_violation();
                    return Err(AppError::ProtocolViolation(
                        "unexpected legacy setStories event from local source".to_string(),
                    ));
                }
                let stories = stories_from_payload(&payload);
                self.set_stories(&stories, payload.error.clone()).await?;
                self.propagate_current_options();
                Ok(())
            }
            Some(composed) => self.set_ref_stories(composed, &payload).await,
        }
    }

    async fn on_story_prepared(&self, origin: &Origin, payload: StoryPreparedPayload) -> Result<()> {
        let StoryPreparedPayload { id, update } = payload;
        let options = update
            .parameters
            .as_ref()
            .and_then(|parameters| parameters.get("options"))
            .cloned();

        let composed = self.origin_ref(origin);
        self.update_story(&id, update.prepared(), composed.as_ref())
            .await?;

        if !self.store.get_state().has_called_set_options {
            if let Some(options) = options {
                self.check_deprecated_option_parameters(&options);
                self.ui.set_options(&options);
            }
            self.store
                .set_state(StatePatch::default().options_propagated())
                .await?;
        }
        Ok(())
    }

    fn propagate_current_options(&self) {
        if let Some(options) = self.get_current_parameter(Some("options")) {
            self.check_deprecated_option_parameters(&options);
            self.ui.set_options(&options);
        }
    }

    /// 对已弃用的 `options` 键发出警告，每个键只警告一次
    pub fn check_deprecated_option_parameters(&self, options: &Value) {
        let Some(options) = options.as_object() else {
            return;
        };
        let mut reported = self.deprecations_reported.lock();
        for key in DEPRECATED_OPTION_KEYS {
            if options.contains_key(key) && reported.insert(key.to_string()) {
                warn!(
                    "parameters.options.{} is deprecated, set it through the manager configuration instead",
                    key
                );
            }
        }
    }

    /// 请求所属框架更新参数；结果以 `storyArgsUpdated` 回传
    pub fn update_story_args(&self, story: &StoryNode, updated_args: Args) {
        self.bus.emit(StoryEvent::UpdateStoryArgs {
            story_id: story.id.clone(),
            updated_args,
            options: EmitOptions::for_ref(story.ref_id.as_deref()),
        });
    }

    /// 请求所属框架重置参数；`arg_names` 为空时重置全部
    pub fn reset_story_args(&self, story: &StoryNode, arg_names: Option<Vec<String>>) {
        self.bus.emit(StoryEvent::ResetStoryArgs {
            story_id: story.id.clone(),
            arg_names,
            options: EmitOptions::for_ref(story.ref_id.as_deref()),
        });
    }

    /// 已发出过弃用警告的键
    pub fn reported_deprecations(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.deprecations_reported.lock().iter().cloned().collect();
        keys.sort();
        keys
    }
}
