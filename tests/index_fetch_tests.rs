// Integration tests for fetching the story index over HTTP
//
// Tests cover:
// - v3 index loading through `HttpIndexSource`
// - Unsupported index versions and transport failures
// - `init` tolerating a missing index

use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storyhub::channel::EventBus;
use storyhub::config::NavigationConfig;
use storyhub::error::AppError;
use storyhub::index::{HttpIndexSource, IndexSource};
use storyhub::models::{HierarchyNode, ManagerState};
use storyhub::services::{Collaborators, HeadlessUi, RecordingRouter, StoriesModule};
use storyhub::storage::{MemoryStore, StateStore};

const INDEX_V3: &str = r#"{
    "v": 3,
    "stories": {
        "intro--page": {"id": "intro--page", "title": "Intro", "name": "Page", "importPath": "./intro.mdx"},
        "atoms-button--primary": {"id": "atoms-button--primary", "title": "Atoms/Button", "name": "Primary", "importPath": "./button.stories.js"},
        "atoms-button--page": {"id": "atoms-button--page", "title": "Atoms/Button", "name": "Page", "importPath": "./button.stories.js"}
    }
}"#;

fn module(source: HttpIndexSource) -> (StoriesModule, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new(ManagerState::default()));
    let module = StoriesModule::new(
        NavigationConfig::default(),
        Collaborators {
            store: store.clone(),
            refs: store.clone(),
            router: Arc::new(RecordingRouter::new()),
            ui: Arc::new(HeadlessUi::new()),
            index_source: Arc::new(source),
            bus: EventBus::new(8),
        },
    );
    (module, store)
}

async fn serve(status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stories.json"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    server
}

fn source_for(server: &MockServer) -> HttpIndexSource {
    HttpIndexSource::new(&format!("{}/stories.json", server.uri()), 5).unwrap()
}

#[tokio::test]
async fn test_http_source_returns_body() {
    let server = serve(200, INDEX_V3).await;
    let source = source_for(&server);

    assert!(source.url().ends_with("/stories.json"));
    assert_eq!(source.fetch_index().await.unwrap(), INDEX_V3);
}

#[tokio::test]
async fn test_http_source_rejects_error_status() {
    let server = serve(500, "boom").await;
    let result = source_for(&server).fetch_index().await;

    assert!(matches!(result, Err(AppError::Fetch(_))));
}

#[tokio::test]
async fn test_fetch_story_list_builds_unprepared_hash() {
    let server = serve(200, INDEX_V3).await;
    let (module, store) = module(source_for(&server));

    module.fetch_story_list().await.unwrap();

    let state = store.get_state();
    assert!(state.stories_configured);
    assert_eq!(
        state.stories_hash.leaf_ids(),
        vec!["intro--page", "atoms-button--primary", "atoms-button--page"]
    );
    assert!(!module.is_prepared("atoms-button--primary", None));

    match state.stories_hash.get("intro--page") {
        Some(HierarchyNode::Story(story)) => {
            assert_eq!(story.parameters["fileName"], "./intro.mdx");
            assert_eq!(story.parameters["docsOnly"], true);
        }
        other => panic!("unexpected node {:?}", other),
    }
    match state.stories_hash.get("atoms-button--page") {
        Some(HierarchyNode::Story(story)) => assert_eq!(story.parameters["docsOnly"], false),
        other => panic!("unexpected node {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_story_list_ignores_other_versions() {
    let server = serve(200, r#"{"v": 2, "stories": {}}"#).await;
    let (module, store) = module(source_for(&server));

    module.fetch_story_list().await.unwrap();
    assert!(!store.get_state().stories_configured);
}

#[tokio::test]
async fn test_init_tolerates_missing_index() {
    let server = serve(404, "not found").await;
    let (module, store) = module(source_for(&server));

    assert!(module.fetch_story_list().await.is_err());
    module.init().await.unwrap();
    assert!(!store.get_state().stories_configured);
}
