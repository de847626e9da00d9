//! Demo composition - Host + Core(clock) + App(greeter)
//!
//! - `keystone.host`: 실행 프로세스 (Host)
//! - `keystone.clock`: 공용 시계와 `clock.TickListener` contract 제공 (Core)
//! - `demo.greeter`: `clock.TickListener` 구현을 노출하는 애플리케이션 (App)
//!
//! clock 모듈은 Core이므로 App 플러그인의 listener 구현을 볼 수 있고,
//! 그 구현들을 서비스로 등록한 뒤 run 단계에서 tick을 전달한다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keystone_core::{
    Container, ContractId, DiagnosticSink, ModuleContext, Plugin, PluginManifest, PluginModule,
    PluginVersion, ServiceRegistrar, TypeDescriptor, TypeView,
};
use keystone_foundation::{Result, Settings};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const TICK_LISTENER: &str = "clock.TickListener";
pub const CLOCK_SERVICE: &str = "clock";

/// tick 수신자 (clock.TickListener contract)
pub trait TickListener: Send + Sync {
    fn on_tick(&self, tick: u64, at: DateTime<Utc>);
}

/// 컨테이너에 들어가는 listener 표현
pub type BoxedListener = Box<dyn TickListener>;

/// 데모 플러그인 전체
pub fn compose(settings: &Settings) -> Result<Vec<Plugin>> {
    Ok(vec![host_plugin()?, clock_plugin(settings)?, greeter_plugin(settings)?])
}

// ============================================================================
// Host
// ============================================================================

struct HostModule {
    started_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl PluginModule for HostModule {
    fn name(&self) -> &str {
        "host"
    }

    async fn on_start(&mut self, ctx: &ModuleContext, _container: &Container) -> Result<()> {
        self.started_at = Some(Utc::now());
        info!(
            parent: ctx.span(),
            visible_types = ctx.all_plugin_types().len(),
            "Host process started"
        );
        Ok(())
    }

    async fn on_stop(&mut self, ctx: &ModuleContext, _container: &Container) -> Result<()> {
        if let Some(started_at) = self.started_at {
            let uptime = Utc::now() - started_at;
            info!(parent: ctx.span(), uptime_ms = uptime.num_milliseconds(), "Host process stopping");
        }
        Ok(())
    }

    fn log(&self, ctx: &ModuleContext, sink: &mut DiagnosticSink) {
        sink.add("settings_keys", ctx.settings().attributes("").len());
    }
}

fn host_plugin() -> Result<Plugin> {
    Plugin::new(
        PluginManifest::host("keystone.host", "Keystone Host")
            .with_description("Demo host process")
            .with_assembly("keystone-cli", version()),
    )
    .with_module(HostModule { started_at: None })
}

// ============================================================================
// Core: clock
// ============================================================================

/// clock 설정 (`clock` 섹션)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub tick_ms: u64,
    pub ticks: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_ms: 200,
            ticks: 3,
        }
    }
}

/// 공용 시계 서비스
pub struct SystemClock {
    started_at: DateTime<Utc>,
}

impl SystemClock {
    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

struct ClockModule {
    listeners: Vec<String>,
}

#[async_trait]
impl PluginModule for ClockModule {
    fn name(&self) -> &str {
        "clock"
    }

    fn register_services(
        &mut self,
        _ctx: &ModuleContext,
        services: &mut ServiceRegistrar<'_>,
    ) -> Result<()> {
        services.add_factory(CLOCK_SERVICE, |_| {
            Ok(SystemClock {
                started_at: Utc::now(),
            })
        })
    }

    fn scan_for_services(
        &mut self,
        _ctx: &ModuleContext,
        types: &TypeView,
        services: &mut ServiceRegistrar<'_>,
    ) -> Result<()> {
        let contract = ContractId::new(TICK_LISTENER);
        for ty in types.implementations_of(&contract) {
            services.add_type(ty)?;
            self.listeners.push(ty.name().to_string());
        }
        Ok(())
    }

    async fn on_run(&mut self, ctx: &ModuleContext, container: &Container) -> Result<()> {
        let config = ctx.config::<ClockConfig>()?;
        let clock = container.resolve::<SystemClock>(CLOCK_SERVICE)?;
        let listeners = container.resolve_all::<BoxedListener>(&ContractId::new(TICK_LISTENER))?;

        if listeners.is_empty() {
            warn!(parent: ctx.span(), "No tick listeners registered");
            return Ok(());
        }

        for tick in 1..=config.ticks {
            tokio::time::sleep(Duration::from_millis(config.tick_ms)).await;
            let at = clock.now();
            for listener in &listeners {
                listener.on_tick(tick, at);
            }
        }
        Ok(())
    }

    fn log(&self, ctx: &ModuleContext, sink: &mut DiagnosticSink) {
        if let Some(config) = ctx.try_config::<ClockConfig>() {
            sink.add("tick_ms", config.tick_ms).add("ticks", config.ticks);
        }
        sink.add("listeners", self.listeners.clone());
    }
}

fn clock_plugin(settings: &Settings) -> Result<Plugin> {
    let mut plugin = Plugin::new(
        PluginManifest::core("keystone.clock", "Clock")
            .with_description("Shared clock and tick fan-out")
            .with_assembly("keystone-cli", version()),
    )
    .with_type(TypeDescriptor::contract(TICK_LISTENER));

    plugin.add_config(settings.bind_or_default::<ClockConfig>("clock")?)?;
    plugin.add_module(ClockModule {
        listeners: Vec::new(),
    })?;
    Ok(plugin)
}

// ============================================================================
// App: greeter
// ============================================================================

/// greeter 설정 (`greeter` 섹션)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GreeterConfig {
    pub greeting: String,
    pub audience: String,
}

impl Default for GreeterConfig {
    fn default() -> Self {
        Self {
            greeting: "Hello".to_string(),
            audience: "world".to_string(),
        }
    }
}

/// tick마다 인사하는 listener
struct Announcer {
    message: String,
}

impl TickListener for Announcer {
    fn on_tick(&self, tick: u64, at: DateTime<Utc>) {
        info!(tick, at = %at.format("%H:%M:%S%.3f"), "{}", self.message);
    }
}

struct GreeterModule;

#[async_trait]
impl PluginModule for GreeterModule {
    fn name(&self) -> &str {
        "greeter"
    }

    async fn on_start(&mut self, ctx: &ModuleContext, container: &Container) -> Result<()> {
        let config = ctx.config::<GreeterConfig>()?;
        let clock = container.resolve::<SystemClock>(CLOCK_SERVICE)?;
        info!(
            parent: ctx.span(),
            clock_started = %clock.started_at(),
            "{}, {}!",
            config.greeting,
            config.audience
        );
        Ok(())
    }

    fn log(&self, ctx: &ModuleContext, sink: &mut DiagnosticSink) {
        if let Some(config) = ctx.try_config::<GreeterConfig>() {
            sink.add("greeting", config.greeting.as_str())
                .add("audience", config.audience.as_str());
        }
    }
}

fn greeter_plugin(settings: &Settings) -> Result<Plugin> {
    let config = settings.bind_or_default::<GreeterConfig>("greeter")?;
    let message = format!("{}, {}!", config.greeting, config.audience);

    Plugin::new(
        PluginManifest::app("demo.greeter", "Greeter")
            .with_description("Greets on every clock tick")
            .with_assembly("keystone-cli", version()),
    )
    .with_type(
        TypeDescriptor::concrete("greeter.Announcer")
            .implementing(TICK_LISTENER)
            .producing(move |_| {
                let listener: BoxedListener = Box::new(Announcer {
                    message: message.clone(),
                });
                Ok(listener)
            }),
    )
    .with_config(config)?
    .with_module(GreeterModule)
}

fn version() -> PluginVersion {
    PluginVersion::parse(env!("CARGO_PKG_VERSION")).unwrap_or_default()
}
