// Integration tests for the synchronization protocol
//
// Tests cover:
// - Prepared and argument notifications, in arrival order
// - Legacy full payloads from local and ref frames
// - storySpecified while the settings screen is open
// - Option propagation and outbound argument mutations
// - The consumer loop over the event bus

use serde_json::json;
use std::sync::Arc;

use storyhub::channel::events::PREVIEW_TARGET;
use storyhub::channel::{ChannelMessage, EventBus, StoryEvent, StoryPreparedPayload};
use storyhub::config::NavigationConfig;
use storyhub::error::AppError;
use storyhub::index::StaticIndexSource;
use storyhub::models::{
    ComposedRef, HierarchyNode, ManagerState, SetStoriesPayload, StatePatch, StoryInput,
    StoryUpdate, ViewMode,
};
use storyhub::services::{Collaborators, HeadlessUi, RecordingRouter, StoriesModule};
use storyhub::storage::{MemoryStore, RefRegistry, StateStore};

struct Harness {
    module: Arc<StoriesModule>,
    store: Arc<MemoryStore>,
    router: Arc<RecordingRouter>,
    ui: Arc<HeadlessUi>,
    bus: EventBus,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new(ManagerState::default()));
    let router = Arc::new(RecordingRouter::new());
    let ui = Arc::new(HeadlessUi::new());
    let bus = EventBus::new(32);
    let module = Arc::new(StoriesModule::new(
        NavigationConfig::default(),
        Collaborators {
            store: store.clone(),
            refs: store.clone(),
            router: router.clone(),
            ui: ui.clone(),
            index_source: Arc::new(StaticIndexSource::empty()),
            bus: bus.clone(),
        },
    ));
    Harness {
        module,
        store,
        router,
        ui,
        bus,
    }
}

fn payload(value: serde_json::Value) -> SetStoriesPayload {
    serde_json::from_value(value).unwrap()
}

fn legacy_payload() -> SetStoriesPayload {
    payload(json!({
        "stories": {
            "a--one": {"kind": "A", "name": "One", "parameters": {"options": {"theme": "dark"}}},
            "a--two": {"kind": "A", "name": "Two", "parameters": {}}
        }
    }))
}

fn story(h: &Harness, id: &str, ref_id: Option<&str>) -> storyhub::models::StoryNode {
    match h.module.get_data(id, ref_id) {
        Some(HierarchyNode::Story(story)) => story,
        other => panic!("expected story {}, got {:?}", id, other),
    }
}

async fn load_local(h: &Harness) {
    h.module
        .set_stories(
            &[
                StoryInput::new("a--one", "A", "One"),
                StoryInput::new("a--two", "A", "Two"),
            ],
            None,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_prepared_then_args_updated() {
    let h = harness();
    load_local(&h).await;

    let update = StoryUpdate {
        parameters: json!({"layout": "centered"}).as_object().cloned(),
        args: json!({"label": "first"}).as_object().cloned(),
        initial_args: json!({"label": "initial"}).as_object().cloned(),
        ..Default::default()
    };
    h.module
        .dispatch(ChannelMessage::local(StoryEvent::StoryPrepared(StoryPreparedPayload {
            id: "a--one".into(),
            update,
        })))
        .await
        .unwrap();
    h.module
        .dispatch(ChannelMessage::local(StoryEvent::StoryArgsUpdated {
            story_id: "a--one".into(),
            args: json!({"label": "second"}).as_object().cloned().unwrap(),
        }))
        .await
        .unwrap();

    let node = story(&h, "a--one", None);
    assert!(node.prepared);
    assert_eq!(node.parameters["layout"], "centered");
    assert_eq!(node.initial_args["label"], "initial");
    assert_eq!(node.args["label"], "second");
}

#[tokio::test]
async fn test_local_legacy_payload_is_protocol_violation() {
    let h = harness();

    let result = h
        .module
        .dispatch(ChannelMessage::local(StoryEvent::SetStories(legacy_payload())))
        .await;

    assert!(matches!(result, Err(AppError::ProtocolViolation(_))));
    assert!(result.unwrap_err().is_fatal());
    assert!(!h.store.get_state().stories_configured);
}

#[tokio::test]
async fn test_ref_legacy_payload_merges_into_ref() {
    let h = harness();
    let mut composed = ComposedRef::new("remote");
    composed.title = Some("Remote".into());
    composed.url = Some("https://remote.example/storybook".into());
    h.store.set_ref("remote", composed, true).await.unwrap();

    h.module
        .dispatch(ChannelMessage::from_ref("remote", StoryEvent::SetStories(legacy_payload())))
        .await
        .unwrap();

    let composed = h.store.get_ref("remote").unwrap();
    assert!(composed.configured);
    assert_eq!(composed.title.as_deref(), Some("Remote"));
    assert_eq!(composed.url.as_deref(), Some("https://remote.example/storybook"));
    assert!(h.store.get_state().stories_hash.is_empty());

    let node = story(&h, "a--two", Some("remote"));
    assert_eq!(node.ref_id.as_deref(), Some("remote"));
}

#[tokio::test]
async fn test_ref_payload_with_invalid_title_records_error() {
    let h = harness();

    h.module
        .dispatch(ChannelMessage::from_ref(
            "remote",
            StoryEvent::SetStories(payload(json!({
                "stories": {"x--y": {"kind": "A/!!!", "name": "Y", "parameters": {}}}
            }))),
        ))
        .await
        .unwrap();

    let composed = h.store.get_ref("remote").unwrap();
    assert!(composed.error.is_some());
    assert!(composed.stories.is_none());
}

#[tokio::test]
async fn test_versioned_local_payload_sets_stories_and_options() {
    let h = harness();
    h.store
        .set_state(StatePatch::default().selection(Some("a--one"), None, Some(ViewMode::Story)))
        .await
        .unwrap();

    let mut versioned = legacy_payload();
    versioned.v = Some(2);
    versioned.global_parameters = json!({"layout": "padded"}).as_object().cloned().unwrap();
    h.module
        .dispatch(ChannelMessage::local(StoryEvent::SetStories(versioned)))
        .await
        .unwrap();

    let state = h.store.get_state();
    assert!(state.stories_configured);
    assert_eq!(story(&h, "a--two", None).parameters["layout"], "padded");
    assert_eq!(h.ui.received_options(), vec![json!({"theme": "dark"})]);
    assert_eq!(h.module.reported_deprecations(), vec!["theme"]);
}

#[tokio::test]
async fn test_ref_prepared_goes_through_registry() {
    let h = harness();
    h.module
        .dispatch(ChannelMessage::from_ref("remote", StoryEvent::SetStories(legacy_payload())))
        .await
        .unwrap();

    h.module
        .dispatch(ChannelMessage::from_ref(
            "remote",
            StoryEvent::StoryPrepared(StoryPreparedPayload {
                id: "a--two".into(),
                update: StoryUpdate::args(json!({"size": 2}).as_object().cloned().unwrap()),
            }),
        ))
        .await
        .unwrap();

    let node = story(&h, "a--two", Some("remote"));
    assert!(node.prepared);
    assert_eq!(node.args["size"], 2);
    assert!(h.store.get_state().has_called_set_options);
}

#[tokio::test]
async fn test_story_changed_propagates_current_options() {
    let h = harness();
    h.module
        .set_stories(
            &[StoryInput::new("a--one", "A", "One")
                .with_parameters(json!({"options": {"panelPosition": "right"}}).as_object().cloned().unwrap())],
            None,
        )
        .await
        .unwrap();
    h.store
        .set_state(StatePatch::default().selection(Some("a--one"), None, None))
        .await
        .unwrap();

    h.module
        .dispatch(ChannelMessage::from_ref("remote", StoryEvent::StoryChanged { story_id: "a--one".into() }))
        .await
        .unwrap();
    assert!(h.ui.received_options().is_empty());

    h.module
        .dispatch(ChannelMessage::local(StoryEvent::StoryChanged { story_id: "a--one".into() }))
        .await
        .unwrap();
    assert_eq!(h.ui.received_options(), vec![json!({"panelPosition": "right"})]);
}

#[tokio::test]
async fn test_story_specified_respects_settings_screen() {
    let h = harness();
    load_local(&h).await;
    let specified = || {
        ChannelMessage::local(StoryEvent::StorySpecified {
            story_id: "a--two".into(),
            view_mode: ViewMode::Story,
        })
    };

    h.ui.set_settings_active(true);
    h.module.dispatch(specified()).await.unwrap();
    assert!(h.router.paths().is_empty());

    h.ui.set_settings_active(false);
    h.module.dispatch(specified()).await.unwrap();
    assert_eq!(h.router.paths(), vec!["/story/a--two"]);
}

#[tokio::test]
async fn test_select_story_event_from_ref() {
    let h = harness();
    h.module
        .dispatch(ChannelMessage::from_ref("remote", StoryEvent::SetStories(legacy_payload())))
        .await
        .unwrap();

    h.module
        .dispatch(ChannelMessage::from_ref(
            "remote",
            StoryEvent::SelectStory {
                kind: Some("A".into()),
                story: Some("Two".into()),
                view_mode: None,
            },
        ))
        .await
        .unwrap();

    assert_eq!(h.router.last().as_deref(), Some("/story/remote_a--two"));
}

#[tokio::test]
async fn test_outbound_targets() {
    let h = harness();
    load_local(&h).await;
    h.module
        .dispatch(ChannelMessage::from_ref("remote", StoryEvent::SetStories(legacy_payload())))
        .await
        .unwrap();
    let mut rx = h.bus.subscribe();

    h.module.update_story_args(
        &story(&h, "a--one", None),
        json!({"label": "x"}).as_object().cloned().unwrap(),
    );
    h.module
        .reset_story_args(&story(&h, "a--two", Some("remote")), Some(vec!["label".into()]));

    match rx.recv().await.unwrap().event {
        StoryEvent::UpdateStoryArgs { story_id, options, .. } => {
            assert_eq!(story_id, "a--one");
            assert_eq!(options.target, PREVIEW_TARGET);
        }
        other => panic!("unexpected event {:?}", other),
    }
    match rx.recv().await.unwrap().event {
        StoryEvent::ResetStoryArgs { story_id, arg_names, options } => {
            assert_eq!(story_id, "a--two");
            assert_eq!(arg_names, Some(vec!["label".to_string()]));
            assert_eq!(options.target, "storybook-ref-remote");
        }
        other => panic!("unexpected event {:?}", other),
    }

    // 请求不会直接修改本地状态
    assert!(story(&h, "a--one", None).args.is_empty());
}

#[tokio::test]
async fn test_run_loop_stops_on_protocol_violation() {
    let h = harness();
    let rx = h.bus.subscribe();
    let worker = {
        let module = h.module.clone();
        tokio::spawn(async move { module.run(rx).await })
    };

    h.bus.emit(StoryEvent::SetStories(payload(json!({
        "v": 2,
        "stories": {"a--one": {"kind": "A", "name": "One", "parameters": {}}}
    }))));
    h.bus.emit(StoryEvent::SetStories(legacy_payload()));

    let result = worker.await.unwrap();
    assert!(matches!(result, Err(AppError::ProtocolViolation(_))));
    assert!(h.store.get_state().stories_configured);
    assert_eq!(
        h.module
            .metrics()
            .protocol_violations_total
            .load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}

#[tokio::test]
async fn test_run_loop_ends_when_channel_closes() {
    let bus = EventBus::new(4);
    let rx = bus.subscribe();
    let h = harness();
    drop(bus);

    assert!(h.module.run(rx).await.is_ok());
}
