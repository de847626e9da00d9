//! 컴포지션/라이프사이클 통합 테스트
//!
//! `cargo test -p keystone-core --test composition`

use async_trait::async_trait;
use keystone_core::{
    CompositeApplicationBuilder, Container, ContractId, Error, Hook, ModuleContext, Phase, Plugin,
    PluginManifest, PluginModule, Result, ServiceRegistrar, TypeDescriptor, TypeView,
};
use keystone_foundation::{Settings, SettingsLoader};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Journal = Arc<Mutex<Vec<String>>>;

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(journal: &Journal, hook: &str) -> Vec<String> {
    journal
        .lock()
        .iter()
        .filter_map(|e| e.strip_prefix(&format!("{}:", hook)).map(str::to_string))
        .collect()
}

// ============================================================================
// Recorder - 훅 호출을 기록하는 모듈
// ============================================================================

/// 모듈 타입이 플러그인 안에서 유일해야 하므로 N으로 구분한다
struct Recorder<const N: usize> {
    name: &'static str,
    journal: Journal,
    fail_on: Option<&'static str>,
}

impl<const N: usize> Recorder<N> {
    fn new(name: &'static str, journal: &Journal) -> Self {
        Self {
            name,
            journal: Arc::clone(journal),
            fail_on: None,
        }
    }

    fn failing_on(mut self, hook: &'static str) -> Self {
        self.fail_on = Some(hook);
        self
    }

    fn record(&self, hook: &'static str) -> Result<()> {
        self.journal.lock().push(format!("{}:{}", hook, self.name));
        if self.fail_on == Some(hook) {
            return Err(Error::Internal(format!("{} refused to {}", self.name, hook)));
        }
        Ok(())
    }
}

#[async_trait]
impl<const N: usize> PluginModule for Recorder<N> {
    fn name(&self) -> &str {
        self.name
    }

    async fn initialize(&mut self, _ctx: &ModuleContext) -> Result<()> {
        self.record("initialize")
    }

    async fn configure(&mut self, _ctx: &ModuleContext) -> Result<()> {
        self.record("configure")
    }

    async fn on_start(&mut self, _ctx: &ModuleContext, _container: &Container) -> Result<()> {
        self.record("start")
    }

    async fn on_run(&mut self, _ctx: &ModuleContext, _container: &Container) -> Result<()> {
        self.record("run")
    }

    async fn on_stop(&mut self, _ctx: &ModuleContext, _container: &Container) -> Result<()> {
        self.record("stop")
    }
}

fn host() -> Plugin {
    Plugin::new(PluginManifest::host("host", "Host"))
}

// ============================================================================
// Single host
// ============================================================================

#[tokio::test]
async fn test_two_hosts_fail_with_multiple_host() {
    let mut builder = CompositeApplicationBuilder::default();
    builder.register_plugin(host()).unwrap();

    let err = builder
        .register_plugin(Plugin::new(PluginManifest::host("host.other", "Other")))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        Error::MultipleHost { ref existing, ref rejected }
            if existing == "host" && rejected == "host.other"
    ));
    assert!(err.is_composition_error());
}

// ============================================================================
// Start/Stop mirror
// ============================================================================

#[tokio::test]
async fn test_stop_mirrors_start() {
    let log = journal();
    let mut app = CompositeApplicationBuilder::default()
        .with_plugin(host())
        .unwrap()
        .with_plugin(
            Plugin::new(PluginManifest::core("p1", "P1"))
                .with_module(Recorder::<1>::new("m1", &log))
                .unwrap()
                .with_module(Recorder::<2>::new("m1b", &log))
                .unwrap(),
        )
        .unwrap()
        .with_plugin(
            Plugin::new(PluginManifest::app("p2", "P2"))
                .with_module(Recorder::<1>::new("m2", &log))
                .unwrap(),
        )
        .unwrap()
        .build()
        .await
        .unwrap();

    app.start().await.unwrap();
    app.run().await.unwrap();
    assert_eq!(app.phase(), Phase::Running);
    app.stop().await.unwrap();
    assert_eq!(app.phase(), Phase::Stopped);

    assert_eq!(entries(&log, "start"), vec!["m1", "m1b", "m2"]);
    assert_eq!(entries(&log, "run"), vec!["m1", "m1b", "m2"]);
    assert_eq!(entries(&log, "stop"), vec!["m2", "m1b", "m1"]);
}

#[tokio::test]
async fn test_phases_never_interleave() {
    let log = journal();
    let _app = CompositeApplicationBuilder::default()
        .with_plugin(host())
        .unwrap()
        .with_plugin(
            Plugin::new(PluginManifest::core("p1", "P1"))
                .with_module(Recorder::<1>::new("a", &log))
                .unwrap(),
        )
        .unwrap()
        .with_plugin(
            Plugin::new(PluginManifest::app("p2", "P2"))
                .with_module(Recorder::<1>::new("b", &log))
                .unwrap(),
        )
        .unwrap()
        .build()
        .await
        .unwrap();

    assert_eq!(
        *log.lock(),
        vec!["initialize:a", "initialize:b", "configure:a", "configure:b"]
    );
}

// ============================================================================
// Scoping asymmetry
// ============================================================================

struct Scout {
    name: &'static str,
    journal: Journal,
}

impl PluginModule for Scout {
    fn name(&self) -> &str {
        self.name
    }

    fn scan_for_services(
        &mut self,
        _ctx: &ModuleContext,
        types: &TypeView,
        _services: &mut ServiceRegistrar<'_>,
    ) -> Result<()> {
        let contract = ContractId::new("messaging.Handler");
        for ty in types.implementations_of(&contract) {
            self.journal
                .lock()
                .push(format!("{}:{}", self.name, ty.name()));
        }
        Ok(())
    }
}

fn messaging_plugin(log: &Journal) -> Plugin {
    Plugin::new(PluginManifest::core("messaging", "Messaging"))
        .with_type(TypeDescriptor::contract("messaging.Handler"))
        .with_type(TypeDescriptor::concrete("messaging.Retry").implementing("messaging.Handler"))
        .with_module(Scout {
            name: "core",
            journal: Arc::clone(log),
        })
        .unwrap()
}

fn orders_plugin(log: &Journal) -> Plugin {
    Plugin::new(PluginManifest::app("orders", "Orders"))
        .with_type(TypeDescriptor::concrete("orders.Placed").implementing("messaging.Handler"))
        .with_module(Scout {
            name: "app",
            journal: Arc::clone(log),
        })
        .unwrap()
}

#[tokio::test]
async fn test_core_sees_app_implementations_but_not_vice_versa() {
    let log = journal();
    let app = CompositeApplicationBuilder::default()
        .with_plugin(host())
        .unwrap()
        .with_plugin(messaging_plugin(&log))
        .unwrap()
        .with_plugin(orders_plugin(&log))
        .unwrap()
        .build()
        .await
        .unwrap();

    assert_eq!(entries(&log, "core"), vec!["messaging.Retry", "orders.Placed"]);
    assert_eq!(entries(&log, "app"), vec!["orders.Placed"]);

    let retry = app.catalog().find("messaging.Retry").unwrap();
    assert_eq!(retry.discovered_by(), &["messaging".to_string()]);
}

#[tokio::test]
async fn test_host_sees_only_application_side_implementations() {
    let log = journal();
    let host = host()
        .with_type(TypeDescriptor::concrete("host.Audit").implementing("messaging.Handler"))
        .with_module(Scout {
            name: "host",
            journal: Arc::clone(&log),
        })
        .unwrap();

    CompositeApplicationBuilder::default()
        .with_plugin(host)
        .unwrap()
        .with_plugin(messaging_plugin(&log))
        .unwrap()
        .with_plugin(orders_plugin(&log))
        .unwrap()
        .build()
        .await
        .unwrap();

    assert_eq!(entries(&log, "host"), vec!["host.Audit", "orders.Placed"]);
    assert_eq!(entries(&log, "app"), vec!["host.Audit", "orders.Placed"]);
    assert_eq!(
        entries(&log, "core"),
        vec!["host.Audit", "messaging.Retry", "orders.Placed"]
    );
}

// ============================================================================
// Module names
// ============================================================================

#[tokio::test]
async fn test_module_names_unique_within_plugin() {
    let log = journal();
    let err = Plugin::new(PluginManifest::core("workers", "Workers"))
        .with_module(Recorder::<1>::new("worker", &log))
        .unwrap()
        .with_module(Recorder::<2>::new("worker", &log))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        Error::DuplicateModuleName { ref plugin, ref name }
            if plugin == "workers" && name == "worker"
    ));

    let app = CompositeApplicationBuilder::default()
        .with_plugin(host().with_module(Recorder::<1>::new("worker", &log)).unwrap())
        .unwrap()
        .with_plugin(
            Plugin::new(PluginManifest::core("workers", "Workers"))
                .with_module(Recorder::<1>::new("worker", &log))
                .unwrap()
                .with_module(Recorder::<2>::new("worker.backup", &log))
                .unwrap(),
        )
        .unwrap()
        .build()
        .await
        .unwrap();

    let value = app.composite_log().to_value().unwrap();
    let modules = value["plugins"]["workers"]["modules"].as_object().unwrap();
    assert_eq!(modules.len(), app.plugin("workers").unwrap().module_count());
    assert!(value["plugins"]["host"]["modules"]["worker"].is_object());
}

// ============================================================================
// Config lookups
// ============================================================================

#[derive(Debug, Deserialize)]
struct ClockConfig {
    tick_ms: u64,
}

struct NeedsClockConfig;

#[async_trait]
impl PluginModule for NeedsClockConfig {
    fn name(&self) -> &str {
        "needs-clock-config"
    }

    async fn configure(&mut self, ctx: &ModuleContext) -> Result<()> {
        ctx.config::<ClockConfig>()?;
        Ok(())
    }
}

#[tokio::test]
async fn test_missing_config_aborts_build() {
    let result = CompositeApplicationBuilder::default()
        .with_plugin(host())
        .unwrap()
        .with_plugin(
            Plugin::new(PluginManifest::core("clock", "Clock"))
                .with_module(NeedsClockConfig)
                .unwrap(),
        )
        .unwrap()
        .build()
        .await;

    assert!(matches!(
        result,
        Err(Error::MissingConfig { ref plugin, ref module, ref config })
            if plugin == "clock"
                && module.as_deref() == Some("needs-clock-config")
                && config.ends_with("ClockConfig")
    ));
}

#[tokio::test]
async fn test_duplicate_config_rejected_at_registration() {
    let err = Plugin::new(PluginManifest::core("clock", "Clock"))
        .with_config(ClockConfig { tick_ms: 1 })
        .unwrap()
        .with_config(ClockConfig { tick_ms: 2 })
        .err()
        .unwrap();

    assert!(matches!(err, Error::DuplicateConfig { ref plugin, .. } if plugin == "clock"));
}

#[tokio::test]
async fn test_config_bound_from_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{
            // clock plugin
            "clock": { "tick_ms": 250 }
        }"#,
    )
    .unwrap();

    let settings = SettingsLoader::with_paths(vec![path]).load_all().unwrap();
    let mut clock = Plugin::new(PluginManifest::core("clock", "Clock"));
    clock.bind_config::<ClockConfig>(&settings, "clock").unwrap();
    clock.add_module(NeedsClockConfig).unwrap();

    let app = CompositeApplicationBuilder::new(settings)
        .with_plugin(host())
        .unwrap()
        .with_plugin(clock)
        .unwrap()
        .build()
        .await
        .unwrap();

    let config = app.plugin("clock").unwrap().configs().get::<ClockConfig>().unwrap();
    assert_eq!(config.tick_ms, 250);
    assert!(app.settings().contains("clock.tick_ms"));
}

// ============================================================================
// No partial build
// ============================================================================

#[tokio::test]
async fn test_configure_failure_stops_later_modules() {
    let log = journal();
    let result = CompositeApplicationBuilder::default()
        .with_plugin(host())
        .unwrap()
        .with_plugin(
            Plugin::new(PluginManifest::core("p", "P"))
                .with_module(Recorder::<1>::new("m1", &log))
                .unwrap()
                .with_module(Recorder::<2>::new("m2", &log).failing_on("configure"))
                .unwrap()
                .with_module(Recorder::<3>::new("m3", &log))
                .unwrap(),
        )
        .unwrap()
        .build()
        .await;

    let err = result.err().unwrap();
    assert!(matches!(
        err,
        Error::ModuleFailed { ref phase, ref module, .. } if phase == "configure" && module == "m2"
    ));
    assert_eq!(entries(&log, "initialize"), vec!["m1", "m2", "m3"]);
    assert_eq!(entries(&log, "configure"), vec!["m1", "m2"]);
}

// ============================================================================
// Start/Stop failure policy
// ============================================================================

#[tokio::test]
async fn test_start_failure_faults_and_stop_covers_started_modules() {
    let log = journal();
    let mut app = CompositeApplicationBuilder::default()
        .with_plugin(host())
        .unwrap()
        .with_plugin(
            Plugin::new(PluginManifest::core("p", "P"))
                .with_module(Recorder::<1>::new("m1", &log))
                .unwrap()
                .with_module(Recorder::<2>::new("m2", &log).failing_on("start"))
                .unwrap()
                .with_module(Recorder::<3>::new("m3", &log))
                .unwrap(),
        )
        .unwrap()
        .build()
        .await
        .unwrap();

    let err = app.start().await.unwrap_err();
    assert!(matches!(err, Error::ModuleFailed { ref module, .. } if module == "m2"));
    assert_eq!(app.phase(), Phase::Faulted);
    assert_eq!(entries(&log, "start"), vec!["m1", "m2"]);

    assert!(matches!(
        app.run().await.unwrap_err(),
        Error::InvalidPhase { ref current, .. } if current == "faulted"
    ));

    app.stop().await.unwrap();
    assert_eq!(entries(&log, "stop"), vec!["m1"]);
}

#[tokio::test]
async fn test_stop_continues_after_failure() {
    let log = journal();
    let mut app = CompositeApplicationBuilder::default()
        .with_plugin(host())
        .unwrap()
        .with_plugin(
            Plugin::new(PluginManifest::core("p", "P"))
                .with_module(Recorder::<1>::new("m1", &log))
                .unwrap()
                .with_module(Recorder::<2>::new("m2", &log).failing_on("stop"))
                .unwrap(),
        )
        .unwrap()
        .build()
        .await
        .unwrap();

    app.start().await.unwrap();
    let err = app.stop().await.unwrap_err();

    match err {
        Error::StopFailed(failures) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].module, "m2");
            assert_eq!(failures[0].phase, "stop");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(entries(&log, "stop"), vec!["m2", "m1"]);
    assert_eq!(app.phase(), Phase::Stopped);
}

#[tokio::test]
async fn test_phase_guards() {
    let mut app = CompositeApplicationBuilder::default()
        .with_plugin(host())
        .unwrap()
        .build()
        .await
        .unwrap();

    assert!(matches!(app.stop().await, Err(Error::InvalidPhase { .. })));
    assert!(matches!(app.run().await, Err(Error::InvalidPhase { .. })));

    app.start().await.unwrap();
    assert!(matches!(app.start().await, Err(Error::InvalidPhase { .. })));
}

// ============================================================================
// End-to-end: A registers X, B resolves X during start
// ============================================================================

struct ServiceX {
    live: AtomicBool,
}

struct WrappedX {
    inner: Arc<ServiceX>,
}

type Observed = Arc<Mutex<Option<WrappedX>>>;

/// X를 등록하고 on_start에서 활성화
struct ModuleA;

#[async_trait]
impl PluginModule for ModuleA {
    fn name(&self) -> &str {
        "A"
    }

    fn register_services(
        &mut self,
        _ctx: &ModuleContext,
        services: &mut ServiceRegistrar<'_>,
    ) -> Result<()> {
        services.add_factory("x", |_| {
            Ok(ServiceX {
                live: AtomicBool::new(false),
            })
        })
    }

    async fn on_start(&mut self, _ctx: &ModuleContext, container: &Container) -> Result<()> {
        container
            .resolve::<ServiceX>("x")?
            .live
            .store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// on_start에서 X를 resolve해 감싼다 (X가 살아 있어야 함)
struct ModuleB {
    observed: Observed,
}

#[async_trait]
impl PluginModule for ModuleB {
    fn name(&self) -> &str {
        "B"
    }

    async fn on_start(&mut self, _ctx: &ModuleContext, container: &Container) -> Result<()> {
        let inner = container.resolve::<ServiceX>("x")?;
        if !inner.live.load(Ordering::SeqCst) {
            return Err(Error::Internal("service x is not live yet".into()));
        }
        *self.observed.lock() = Some(WrappedX { inner });
        Ok(())
    }
}

#[tokio::test]
async fn test_later_module_uses_service_started_earlier() {
    let observed: Observed = Arc::new(Mutex::new(None));
    let core = Plugin::new(PluginManifest::core("core", "Core"))
        .with_module(ModuleA)
        .unwrap()
        .with_module(ModuleB {
            observed: Arc::clone(&observed),
        })
        .unwrap();

    let mut app = CompositeApplicationBuilder::default()
        .with_plugin(host())
        .unwrap()
        .with_plugin(core)
        .unwrap()
        .build()
        .await
        .unwrap();

    app.start().await.unwrap();

    let guard = observed.lock();
    let wrapped = guard.as_ref().unwrap();
    assert!(wrapped.inner.live.load(Ordering::SeqCst));
    let from_container = app.container().resolve::<ServiceX>("x").unwrap();
    assert!(Arc::ptr_eq(&wrapped.inner, &from_container));
}

#[tokio::test]
async fn test_reversed_declaration_order_fails_start() {
    let observed: Observed = Arc::new(Mutex::new(None));
    let core = Plugin::new(PluginManifest::core("core", "Core"))
        .with_module(ModuleB {
            observed: Arc::clone(&observed),
        })
        .unwrap()
        .with_module(ModuleA)
        .unwrap();

    let mut app = CompositeApplicationBuilder::default()
        .with_plugin(host())
        .unwrap()
        .with_plugin(core)
        .unwrap()
        .build()
        .await
        .unwrap();

    let err = app.start().await.unwrap_err();
    assert!(matches!(
        err,
        Error::ModuleFailed { ref phase, ref module, .. } if phase == "start" && module == "B"
    ));
    assert!(observed.lock().is_none());
}

// ============================================================================
// Known-type registration, events, composite log
// ============================================================================

struct Handler(&'static str);

/// 보이는 Handler 구현을 모두 서비스로 등록
struct HandlerRegistrar;

#[async_trait]
impl PluginModule for HandlerRegistrar {
    fn name(&self) -> &str {
        "handler-registrar"
    }

    fn scan_for_services(
        &mut self,
        _ctx: &ModuleContext,
        types: &TypeView,
        services: &mut ServiceRegistrar<'_>,
    ) -> Result<()> {
        let contract = ContractId::new("messaging.Handler");
        for ty in types.implementations_of(&contract) {
            services.add_type(ty)?;
        }
        Ok(())
    }

    async fn on_run(&mut self, _ctx: &ModuleContext, container: &Container) -> Result<()> {
        let handlers = container.resolve_all::<Handler>(&ContractId::new("messaging.Handler"))?;
        if handlers.len() != 2 {
            return Err(Error::Internal(format!("expected 2 handlers, got {}", handlers.len())));
        }
        Ok(())
    }

    fn log(&self, _ctx: &ModuleContext, sink: &mut keystone_core::DiagnosticSink) {
        sink.add("contract", "messaging.Handler");
    }
}

fn handler_composition() -> CompositeApplicationBuilder {
    CompositeApplicationBuilder::default()
        .with_plugin(host())
        .unwrap()
        .with_plugin(
            Plugin::new(PluginManifest::core("messaging", "Messaging"))
                .with_type(TypeDescriptor::contract("messaging.Handler"))
                .with_type(
                    TypeDescriptor::concrete("messaging.Retry")
                        .implementing("messaging.Handler")
                        .producing(|_| Ok(Handler("retry"))),
                )
                .with_module(HandlerRegistrar)
                .unwrap(),
        )
        .unwrap()
        .with_plugin(
            Plugin::new(PluginManifest::app("orders", "Orders")).with_type(
                TypeDescriptor::concrete("orders.Placed")
                    .implementing("messaging.Handler")
                    .producing(|_| Ok(Handler("placed"))),
            ),
        )
        .unwrap()
}

#[tokio::test]
async fn test_known_type_implementations_become_services() {
    let mut app = handler_composition().build().await.unwrap();
    app.start().await.unwrap();
    app.run().await.unwrap();

    let handlers = app
        .container()
        .resolve_all::<Handler>(&ContractId::new("messaging.Handler"))
        .unwrap();
    let names: Vec<_> = handlers.iter().map(|h| h.0).collect();
    assert_eq!(names, vec!["retry", "placed"]);
}

#[tokio::test]
async fn test_lifecycle_events_cover_build_and_start() {
    let builder = handler_composition();
    let mut rx = builder.subscribe();
    let mut app = builder.build().await.unwrap();
    app.start().await.unwrap();

    let mut hooks = Vec::new();
    while let Ok(event) = rx.try_recv() {
        hooks.push(event.hook);
    }
    assert_eq!(
        hooks,
        vec![
            Hook::Initialize,
            Hook::Configure,
            Hook::RegisterServices,
            Hook::ScanForServices,
            Hook::Start,
        ]
    );
    assert_eq!(app.events().history_by_hook(Hook::Start).len(), 1);
}

#[tokio::test]
async fn test_composite_log_describes_topology() {
    let app = handler_composition().build().await.unwrap();
    let log = app.composite_log();
    let value = log.to_value().unwrap();

    assert_eq!(value["application"]["phase"], "built");
    assert_eq!(value["application"]["plugins"], 3);

    let messaging = &value["plugins"]["messaging"];
    assert_eq!(messaging["classification"], "core");
    assert_eq!(
        messaging["modules"]["handler-registrar"]["contract"],
        "messaging.Handler"
    );
    assert_eq!(
        messaging["known_type_contracts"]["messaging.Handler"],
        serde_json::json!(["messaging.Retry (messaging)", "orders.Placed (orders)"])
    );
    assert_eq!(
        messaging["registered_types"],
        serde_json::json!(["messaging.Retry"])
    );

    let orders = log.plugin("orders").unwrap();
    assert!(orders.nested("known_type_implementations").unwrap().nested("orders.Placed").is_some());
    assert_eq!(
        value["plugins"]["orders"]["known_type_implementations"]["orders.Placed"]["discovered_by"],
        serde_json::json!(["messaging"])
    );
    assert_eq!(value["plugins"]["orders"]["registered_types"], serde_json::json!(["orders.Placed"]));

    assert!(log.to_json().unwrap().contains("\"host\""));
    log.emit().unwrap();
    assert_eq!(app.phase(), Phase::Built);
}

#[tokio::test]
async fn test_settings_available_to_modules() {
    struct ReadsSettings {
        seen: Arc<Mutex<Option<String>>>,
    }

    #[async_trait]
    impl PluginModule for ReadsSettings {
        fn name(&self) -> &str {
            "reads-settings"
        }

        async fn initialize(&mut self, ctx: &ModuleContext) -> Result<()> {
            let greeting = ctx.settings().attributes("greeter").require::<String>("greeting")?;
            *self.seen.lock() = Some(greeting);
            Ok(())
        }
    }

    let seen = Arc::new(Mutex::new(None));
    let settings = Settings::from_json_str(r#"{"greeter": {"greeting": "hello"}}"#).unwrap();
    CompositeApplicationBuilder::new(settings)
        .with_plugin(
            host()
                .with_module(ReadsSettings {
                    seen: Arc::clone(&seen),
                })
                .unwrap(),
        )
        .unwrap()
        .build()
        .await
        .unwrap();

    assert_eq!(seen.lock().as_deref(), Some("hello"));
}
