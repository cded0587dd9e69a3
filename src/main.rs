use std::sync::Arc;
use storyhub::channel::EventBus;
use storyhub::config::{AppConfig, ConfigLoader};
use storyhub::index::create_index_source;
use storyhub::observability::init_tracing;
use storyhub::services::{Collaborators, HeadlessUi, TracingRouter, create_stories_module};
use storyhub::storage::{MemoryStore, StateStore};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration, using development defaults: {}", e);
            AppConfig::development()
        }
    };

    let _guard = init_tracing(&config.logging, &config.app_name)?;
    info!("Starting {} ({})...", config.app_name, config.environment);

    ConfigLoader::validate(&config)?;

    let store = Arc::new(MemoryStore::default());
    let bus = EventBus::new(config.channel.capacity);
    let index_source = create_index_source(&config.index)?;

    let module = create_stories_module(
        config.navigation.clone(),
        Collaborators {
            store: store.clone(),
            refs: store.clone(),
            router: Arc::new(TracingRouter),
            ui: Arc::new(HeadlessUi::new()),
            index_source: Arc::from(index_source),
            bus: bus.clone(),
        },
    );

    // 先订阅以缓冲启动期间的事件，启动完成后再交给唯一的消费者
    let rx = bus.subscribe();
    module.init().await?;
    module.select_first_story()?;

    let worker = {
        let module = module.clone();
        tokio::spawn(async move { module.run(rx).await })
    };

    let state = store.get_state();
    if !state.stories_configured {
        warn!("No story index loaded from {}", config.index.url);
    }
    println!("{}", serde_json::to_string_pretty(&state.stories_hash)?);
    info!("{}", module.metrics().gather());

    worker.abort();
    Ok(())
}
