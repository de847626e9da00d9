//! Composite Application Builder - 플러그인 등록과 컴포지션

use super::application::CompositeApplication;
use super::events::{Hook, LifecycleEvent, LifecycleEvents};
use super::lifecycle::{LifecycleOrchestrator, Phase};
use crate::context::ModuleContext;
use crate::plugin::{Plugin, PluginClass};
use crate::registry::ServiceRegistry;
use crate::types::{KnownTypeResolver, TypeScanner};
use keystone_foundation::{Error, Result, Settings};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// 컴포지트 애플리케이션 빌더
///
/// ```ignore
/// let app = CompositeApplicationBuilder::new(settings)
///     .with_plugin(host_plugin)?
///     .with_plugin(clock_plugin)?
///     .build()
///     .await?;
/// ```
pub struct CompositeApplicationBuilder {
    settings: Arc<Settings>,

    /// 등록 순서 유지
    plugins: Vec<Plugin>,

    events: Arc<LifecycleEvents>,
}

impl CompositeApplicationBuilder {
    pub fn new(settings: Settings) -> Self {
        Self::with_shared_settings(Arc::new(settings))
    }

    pub fn with_shared_settings(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            plugins: Vec::new(),
            events: Arc::new(LifecycleEvents::new()),
        }
    }

    // ========================================================================
    // 등록
    // ========================================================================

    /// 플러그인 등록
    ///
    /// 같은 ID가 이미 있으면 `DuplicatePlugin`, 두 번째 Host면 `MultipleHost`.
    pub fn register_plugin(&mut self, plugin: Plugin) -> Result<&mut Self> {
        if self.plugins.iter().any(|p| p.id() == plugin.id()) {
            return Err(Error::DuplicatePlugin(plugin.id().to_string()));
        }

        if plugin.classification() == PluginClass::Host {
            if let Some(host) = self.host() {
                return Err(Error::MultipleHost {
                    existing: host.id().to_string(),
                    rejected: plugin.id().to_string(),
                });
            }
        }

        debug!(
            plugin = %plugin.id(),
            class = %plugin.classification(),
            modules = plugin.module_count(),
            "Plugin registered"
        );
        self.plugins.push(plugin);
        Ok(self)
    }

    /// 여러 플러그인 등록 (첫 실패에서 중단)
    pub fn register_plugins(
        &mut self,
        plugins: impl IntoIterator<Item = Plugin>,
    ) -> Result<&mut Self> {
        for plugin in plugins {
            self.register_plugin(plugin)?;
        }
        Ok(self)
    }

    /// 빌더 패턴: 플러그인 등록
    pub fn with_plugin(mut self, plugin: Plugin) -> Result<Self> {
        self.register_plugin(plugin)?;
        Ok(self)
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    pub fn host(&self) -> Option<&Plugin> {
        self.plugins
            .iter()
            .find(|p| p.classification() == PluginClass::Host)
    }

    /// build 중 발생하는 훅 이벤트까지 받으려면 build 전에 구독한다
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    // ========================================================================
    // 빌드
    // ========================================================================

    /// 컴포지션 실행
    ///
    /// 스캔 → known-type 해석 → 컨텍스트 할당 → initialize(전체) → configure(전체)
    /// → register_services(전체) → scan_for_services(전체) → 컨테이너 빌드.
    /// 어느 단계든 실패하면 애플리케이션 없이 에러를 반환한다.
    pub async fn build(self) -> Result<CompositeApplication> {
        let Self {
            settings,
            mut plugins,
            events,
        } = self;

        info!(plugins = plugins.len(), "Composing application");

        let mut catalog = TypeScanner::scan(&plugins)?;
        let bindings = KnownTypeResolver::resolve(&mut catalog);
        let catalog = Arc::new(catalog);
        debug!(types = catalog.len(), bindings, "Type catalog frozen");

        for plugin in &plugins {
            for slot in plugin.slots() {
                let context = ModuleContext::new(
                    plugin,
                    slot.name(),
                    Arc::clone(&catalog),
                    Arc::clone(&settings),
                );
                slot.assign_context(context)?;
            }
        }
        info!(phase = %Phase::Registered, "Module contexts assigned");

        let orchestrator = LifecycleOrchestrator::new(events);

        orchestrator.prepare(Hook::Initialize, &mut plugins).await?;
        info!(phase = %Phase::Initialized, "Phase complete");

        orchestrator.prepare(Hook::Configure, &mut plugins).await?;
        info!(phase = %Phase::Configured, "Phase complete");

        let mut registry = ServiceRegistry::new();
        orchestrator.register(&mut plugins, &mut registry)?;
        info!(
            phase = %Phase::ServicesRegistered,
            registrations = registry.len(),
            "Phase complete"
        );

        let container = Arc::new(registry.build());
        info!(phase = %Phase::Built, services = container.len(), "Application built");

        Ok(CompositeApplication::new(
            plugins,
            catalog,
            settings,
            container,
            orchestrator,
        ))
    }
}

impl Default for CompositeApplicationBuilder {
    fn default() -> Self {
        Self::new(Settings::new())
    }
}
