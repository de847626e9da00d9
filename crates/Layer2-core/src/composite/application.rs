//! Composite Application - 빌드가 끝난 실행 가능한 애플리케이션

use super::events::{Hook, LifecycleEvent, LifecycleEvents};
use super::lifecycle::{LifecycleOrchestrator, ModulePosition, Phase};
use super::log::CompositeLog;
use crate::plugin::Plugin;
use crate::registry::Container;
use crate::types::TypeCatalog;
use keystone_foundation::{Error, Result, Settings};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

/// 컴포지트 애플리케이션
///
/// `CompositeApplicationBuilder::build()`로만 생성된다. start/run/stop은 각각 한 번씩 호출한다.
///
/// ```ignore
/// let mut app = builder.build().await?;
/// app.start().await?;
/// app.run().await?;
/// // ...
/// app.stop().await?;
/// ```
pub struct CompositeApplication {
    plugins: Vec<Plugin>,
    catalog: Arc<TypeCatalog>,
    settings: Arc<Settings>,
    container: Arc<Container>,
    orchestrator: LifecycleOrchestrator,
    phase: Phase,

    /// on_start가 끝난 모듈 (시작 순서)
    started: Vec<ModulePosition>,
}

impl CompositeApplication {
    pub(crate) fn new(
        plugins: Vec<Plugin>,
        catalog: Arc<TypeCatalog>,
        settings: Arc<Settings>,
        container: Arc<Container>,
        orchestrator: LifecycleOrchestrator,
    ) -> Self {
        Self {
            plugins,
            catalog,
            settings,
            container,
            orchestrator,
            phase: Phase::Built,
            started: Vec::new(),
        }
    }

    // ========================================================================
    // 라이프사이클
    // ========================================================================

    /// 모든 모듈의 on_start를 등록 순서대로 호출
    ///
    /// 한 모듈이 실패하면 뒤의 모듈은 호출되지 않고 애플리케이션은 `Faulted`가 된다.
    /// 이미 시작된 모듈은 `stop()`으로 정리할 수 있다.
    pub async fn start(&mut self) -> Result<()> {
        self.expect_phase("start", &[Phase::Built])?;
        info!(modules = self.module_count(), "Starting application");

        let started = &mut self.started;
        let result = self
            .orchestrator
            .forward(Hook::Start, &mut self.plugins, &self.container, |position| {
                started.push(position)
            })
            .await;

        self.settle(result, Phase::Started)
    }

    /// 모든 모듈의 on_run을 등록 순서대로 호출 (start 완료 후)
    pub async fn run(&mut self) -> Result<()> {
        self.expect_phase("run", &[Phase::Started])?;
        info!("Running application");

        let result = self
            .orchestrator
            .forward(Hook::Run, &mut self.plugins, &self.container, |_| {})
            .await;

        self.settle(result, Phase::Running)
    }

    /// 시작된 모듈의 on_stop을 시작 순서의 정확히 역순으로 호출
    ///
    /// 한 모듈이 실패해도 나머지 모듈은 계속 정지되며, 실패는 `StopFailed`로 모아서 반환한다.
    pub async fn stop(&mut self) -> Result<()> {
        self.expect_phase("stop", &[Phase::Started, Phase::Running, Phase::Faulted])?;
        info!(modules = self.started.len(), "Stopping application");

        let started = std::mem::take(&mut self.started);
        let failures = self
            .orchestrator
            .reverse_stop(&mut self.plugins, &self.container, &started)
            .await;
        self.phase = Phase::Stopped;

        if failures.is_empty() {
            info!("Application stopped");
            Ok(())
        } else {
            error!(failed = failures.len(), "Application stopped with failures");
            Err(Error::StopFailed(failures))
        }
    }

    fn expect_phase(&self, operation: &str, allowed: &[Phase]) -> Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(Error::invalid_phase(operation, self.phase))
        }
    }

    fn settle(&mut self, result: Result<()>, next: Phase) -> Result<()> {
        match result {
            Ok(()) => {
                self.phase = next;
                info!(phase = %next, "Phase complete");
                Ok(())
            }
            Err(err) => {
                self.phase = Phase::Faulted;
                Err(err)
            }
        }
    }

    // ========================================================================
    // 조회
    // ========================================================================

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    pub fn plugin(&self, id: &str) -> Option<&Plugin> {
        self.plugins.iter().find(|p| p.id() == id)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn module_count(&self) -> usize {
        self.plugins.iter().map(|p| p.module_count()).sum()
    }

    /// 라이프사이클 이벤트 구독
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.orchestrator.events().subscribe()
    }

    pub fn events(&self) -> &LifecycleEvents {
        self.orchestrator.events()
    }

    /// 현재 토폴로지의 진단 스냅샷
    pub fn composite_log(&self) -> CompositeLog {
        CompositeLog::capture(self)
    }
}

impl std::fmt::Debug for CompositeApplication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeApplication")
            .field("phase", &self.phase)
            .field("plugins", &self.plugins.len())
            .field("modules", &self.module_count())
            .field("services", &self.container.len())
            .finish()
    }
}
