//! Lifecycle Events - 훅 호출 결과 발행/구독

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::broadcast;
use tracing::trace;

// ============================================================================
// Hook - 모듈 훅 종류
// ============================================================================

/// 모듈 훅
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hook {
    Initialize,
    Configure,
    RegisterServices,
    ScanForServices,
    Start,
    Run,
    Stop,
}

impl std::fmt::Display for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialize => write!(f, "initialize"),
            Self::Configure => write!(f, "configure"),
            Self::RegisterServices => write!(f, "register_services"),
            Self::ScanForServices => write!(f, "scan_for_services"),
            Self::Start => write!(f, "start"),
            Self::Run => write!(f, "run"),
            Self::Stop => write!(f, "stop"),
        }
    }
}

// ============================================================================
// LifecycleEvent
// ============================================================================

/// 훅 호출 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum HookOutcome {
    Completed,
    Failed(String),
}

/// 모듈 하나의 훅 호출 이벤트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub hook: Hook,

    /// 소유 플러그인 ID
    pub plugin: String,

    /// 모듈 이름
    pub module: String,

    pub outcome: HookOutcome,

    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl LifecycleEvent {
    pub fn completed(hook: Hook, plugin: impl Into<String>, module: impl Into<String>) -> Self {
        Self::new(hook, plugin, module, HookOutcome::Completed)
    }

    pub fn failed(
        hook: Hook,
        plugin: impl Into<String>,
        module: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(hook, plugin, module, HookOutcome::Failed(message.into()))
    }

    fn new(
        hook: Hook,
        plugin: impl Into<String>,
        module: impl Into<String>,
        outcome: HookOutcome,
    ) -> Self {
        Self {
            hook,
            plugin: plugin.into(),
            module: module.into(),
            outcome,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, HookOutcome::Failed(_))
    }
}

// ============================================================================
// LifecycleEvents - 이벤트 버스
// ============================================================================

/// 라이프사이클 이벤트 버스
pub struct LifecycleEvents {
    sender: broadcast::Sender<LifecycleEvent>,

    /// 최근 N개
    history: Mutex<VecDeque<LifecycleEvent>>,

    history_size: usize,
}

impl LifecycleEvents {
    pub fn new() -> Self {
        Self::with_capacity(256, 128)
    }

    pub fn with_capacity(channel_capacity: usize, history_size: usize) -> Self {
        let (sender, _) = broadcast::channel(channel_capacity);
        Self {
            sender,
            history: Mutex::new(VecDeque::with_capacity(history_size)),
            history_size,
        }
    }

    /// 이벤트 발행 (구독자가 없어도 OK)
    pub fn publish(&self, event: LifecycleEvent) {
        trace!(hook = %event.hook, plugin = %event.plugin, module = %event.module, "Lifecycle event");

        {
            let mut history = self.history.lock();
            if history.len() >= self.history_size {
                history.pop_front();
            }
            history.push_back(event.clone());
        }

        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    /// 최근 이벤트 (오래된 순)
    pub fn history(&self) -> Vec<LifecycleEvent> {
        self.history.lock().iter().cloned().collect()
    }

    /// 특정 훅의 이벤트만
    pub fn history_by_hook(&self, hook: Hook) -> Vec<LifecycleEvent> {
        self.history
            .lock()
            .iter()
            .filter(|e| e.hook == hook)
            .cloned()
            .collect()
    }
}

impl Default for LifecycleEvents {
    fn default() -> Self {
        Self::new()
    }
}
