//! 路由接口
//!
//! 路径格式：`/{viewMode}/{refId_}{storyId}`。

use parking_lot::Mutex;
use tracing::info;

/// 外部路由
pub trait Router: Send + Sync {
    fn navigate(&self, path: &str);
}

/// 记录所有导航路径的路由
#[derive(Debug, Default)]
pub struct RecordingRouter {
    paths: Mutex<Vec<String>>,
}

impl RecordingRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.paths.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.paths.lock().clear();
    }
}

impl Router for RecordingRouter {
    fn navigate(&self, path: &str) {
        self.paths.lock().push(path.to_string());
    }
}

/// 只写日志的路由
#[derive(Debug, Default)]
pub struct TracingRouter;

impl Router for TracingRouter {
    fn navigate(&self, path: &str) {
        info!(path, "Navigate");
    }
}
