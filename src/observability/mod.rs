//! 可观测性模块
//!
//! 提供结构化日志初始化和同步协议的计数指标。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::LoggingConfig;
use crate::error::{AppError, Result};

/// 初始化日志
///
/// `RUST_LOG` 优先于配置中的级别。配置了日志目录时按天滚动写入文件，
/// 返回的 guard 需要在进程结束前保持存活。
pub fn init_tracing(config: &LoggingConfig, app_name: &str) -> Result<Option<WorkerGuard>> {
    let level = if config.level.is_empty() {
        "info"
    } else {
        config.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (writer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, format!("{}.log", app_name));
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stdout), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);
    let installed = if config.structured {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| AppError::Internal(format!("tracing init failed: {}", e)))?;

    Ok(guard)
}

// ===== Sync Metrics =====

/// 同步协议指标
#[derive(Clone, Default, Debug)]
pub struct SyncMetrics {
    pub events_processed: Arc<AtomicU64>,
    pub navigations_total: Arc<AtomicU64>,
    pub story_updates_total: Arc<AtomicU64>,
    pub protocol_violations_total: Arc<AtomicU64>,
    pub lookup_misses_total: Arc<AtomicU64>,
}

impl SyncMetrics {
    pub fn record_event(&self) {
        self.events_processed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_navigation(&self) {
        self.navigations_total.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_story_update(&self) {
        self.story_updates_total.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_protocol_violation(&self) {
        self.protocol_violations_total.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_lookup_miss(&self) {
        self.lookup_misses_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 生成 Prometheus 格式指标
    pub fn gather(&self) -> String {
        format!(
            r#"# HELP channel_events_processed_total Channel events dispatched
# TYPE channel_events_processed_total counter
channel_events_processed_total {}
# HELP navigations_total Navigation instructions emitted
# TYPE navigations_total counter
navigations_total {}
# HELP story_updates_total Story nodes merged from frame notifications
# TYPE story_updates_total counter
story_updates_total {}
# HELP protocol_violations_total Fatal protocol violations
# TYPE protocol_violations_total counter
protocol_violations_total {}
# HELP lookup_misses_total Lookups of unknown stories or refs
# TYPE lookup_misses_total counter
lookup_misses_total {}
"#,
            self.events_processed.load(Ordering::SeqCst),
            self.navigations_total.load(Ordering::SeqCst),
            self.story_updates_total.load(Ordering::SeqCst),
            self.protocol_violations_total.load(Ordering::SeqCst),
            self.lookup_misses_total.load(Ordering::SeqCst),
        )
    }
}
