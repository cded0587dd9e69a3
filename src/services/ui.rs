use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};

/// 管理端界面桥接
#[cfg_attr(test, mockall::automock)]
pub trait UiBridge: Send + Sync {
    /// 把故事的 `options` 参数交给选项子系统
    fn set_options(&self, options: &Value);

    /// 设置页是否处于打开状态
    fn is_settings_screen_active(&self) -> bool;
}

/// 无界面实现，记录收到的选项
#[derive(Debug, Default)]
pub struct HeadlessUi {
    options: Mutex<Vec<Value>>,
    settings_active: AtomicBool,
}

impl HeadlessUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_settings_active(&self, active: bool) {
        self.settings_active.store(active, Ordering::SeqCst);
    }

    /// 已传播的选项（按时间顺序）
    pub fn received_options(&self) -> Vec<Value> {
        self.options.lock().clone()
    }
}

impl UiBridge for HeadlessUi {
    fn set_options(&self, options: &Value) {
        self.options.lock().push(options.clone());
    }

    fn is_settings_screen_active(&self) -> bool {
        self.settings_active.load(Ordering::SeqCst)
    }
}
