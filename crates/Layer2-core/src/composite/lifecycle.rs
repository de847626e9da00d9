//! Lifecycle Orchestrator - 단계별 훅 호출
//!
//! 한 단계는 모든 플러그인의 모든 모듈에서 끝난 뒤에야 다음 단계가 시작된다.
//! 같은 단계 안에서 모듈은 순차적으로 방문하며, 한 모듈의 훅이 완전히 끝난 뒤 다음 모듈로 넘어간다.

use super::events::{Hook, LifecycleEvent, LifecycleEvents};
use crate::context::ModuleContext;
use crate::plugin::{ModuleSlot, Plugin};
use crate::registry::{Container, ServiceRegistry};
use keystone_foundation::{Error, ModuleFailure, Result};
use std::sync::Arc;
use tracing::{debug, error, warn, Instrument};

// ============================================================================
// Phase - 애플리케이션 단계
// ============================================================================

/// 컴포지트 애플리케이션 단계 (엄격한 전순서)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Registered,
    Initialized,
    Configured,
    ServicesRegistered,
    Built,
    Started,
    Running,
    Stopped,

    /// start/run 훅이 실패함 (stop만 허용)
    Faulted,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registered => write!(f, "registered"),
            Self::Initialized => write!(f, "initialized"),
            Self::Configured => write!(f, "configured"),
            Self::ServicesRegistered => write!(f, "services_registered"),
            Self::Built => write!(f, "built"),
            Self::Started => write!(f, "started"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Faulted => write!(f, "faulted"),
        }
    }
}

/// 모듈 위치 (플러그인 인덱스, 슬롯 인덱스)
pub(crate) type ModulePosition = (usize, usize);

/// 훅 에러를 모듈 정보가 담긴 에러로 변환
///
/// 컴포지션 에러와 이미 변환된 에러는 그대로 전달한다.
pub(crate) fn hook_error(hook: Hook, plugin: &str, module: &str, err: Error) -> Error {
    if err.is_composition_error() || matches!(err, Error::ModuleFailed { .. }) {
        return err;
    }
    Error::module_failed(hook.to_string(), plugin, module, err.to_string())
}

fn missing_context(plugin: &str, slot: &ModuleSlot) -> Error {
    Error::Internal(format!(
        "module {}::{} has no context assigned",
        plugin,
        slot.name()
    ))
}

// ============================================================================
// LifecycleOrchestrator
// ============================================================================

/// 모듈 훅 호출기
pub struct LifecycleOrchestrator {
    events: Arc<LifecycleEvents>,
}

impl LifecycleOrchestrator {
    pub fn new(events: Arc<LifecycleEvents>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &Arc<LifecycleEvents> {
        &self.events
    }

    /// 모든 모듈에 대해 initialize 또는 configure 호출 (첫 실패에서 중단)
    pub(crate) async fn prepare(&self, hook: Hook, plugins: &mut [Plugin]) -> Result<()> {
        for plugin in plugins.iter_mut() {
            let plugin_id = plugin.id().to_string();
            for slot in plugin.slots_mut() {
                self.invoke(hook, &plugin_id, slot, None).await?;
            }
        }
        Ok(())
    }

    /// 모든 모듈의 서비스 선언 수집
    ///
    /// register_services가 모든 모듈에서 끝난 뒤 scan_for_services를 호출한다.
    pub(crate) fn register(&self, plugins: &mut [Plugin], registry: &mut ServiceRegistry) -> Result<()> {
        for hook in [Hook::RegisterServices, Hook::ScanForServices] {
            for plugin in plugins.iter_mut() {
                let plugin_id = plugin.id().to_string();
                let mut services = registry.registrar(plugin_id.clone());

                for slot in plugin.slots_mut() {
                    let ctx = slot
                        .context()
                        .cloned()
                        .ok_or_else(|| missing_context(&plugin_id, slot))?;
                    let module_name = slot.name().to_string();
                    let _entered = ctx.span().enter();

                    let module = slot.module_mut();
                    let result = match hook {
                        Hook::RegisterServices => module.register_services(&ctx, &mut services),
                        _ => module.scan_for_services(&ctx, ctx.all_plugin_types(), &mut services),
                    };
                    self.record(hook, &plugin_id, &module_name, result)?;
                }
            }
        }
        Ok(())
    }

    /// start/run: 등록 순서대로 호출, 첫 실패에서 중단
    ///
    /// 훅이 성공한 모듈마다 `completed`가 호출된다.
    pub(crate) async fn forward(
        &self,
        hook: Hook,
        plugins: &mut [Plugin],
        container: &Container,
        mut completed: impl FnMut(ModulePosition),
    ) -> Result<()> {
        for (plugin_idx, plugin) in plugins.iter_mut().enumerate() {
            let plugin_id = plugin.id().to_string();
            for (slot_idx, slot) in plugin.slots_mut().iter_mut().enumerate() {
                self.invoke(hook, &plugin_id, slot, Some(container)).await?;
                completed((plugin_idx, slot_idx));
            }
        }
        Ok(())
    }

    /// stop: 주어진 시작 순서의 정확히 역순으로 호출
    ///
    /// 실패해도 나머지 모듈을 계속 정지하고, 실패 목록을 반환한다.
    pub(crate) async fn reverse_stop(
        &self,
        plugins: &mut [Plugin],
        container: &Container,
        started: &[ModulePosition],
    ) -> Vec<ModuleFailure> {
        let mut failures = Vec::new();

        for &(plugin_idx, slot_idx) in started.iter().rev() {
            let Some(plugin) = plugins.get_mut(plugin_idx) else {
                continue;
            };
            let plugin_id = plugin.id().to_string();
            let Some(slot) = plugin.slots_mut().get_mut(slot_idx) else {
                continue;
            };
            let module_name = slot.name().to_string();

            if let Err(err) = self.invoke(Hook::Stop, &plugin_id, slot, Some(container)).await {
                let message = match err {
                    Error::ModuleFailed { message, .. } => message,
                    other => other.to_string(),
                };
                failures.push(ModuleFailure {
                    phase: Hook::Stop.to_string(),
                    plugin: plugin_id,
                    module: module_name,
                    message,
                });
            }
        }

        failures
    }

    /// 모듈 하나의 async 훅 호출 (모듈 span 안에서)
    async fn invoke(
        &self,
        hook: Hook,
        plugin_id: &str,
        slot: &mut ModuleSlot,
        container: Option<&Container>,
    ) -> Result<()> {
        let ctx: Arc<ModuleContext> = slot
            .context()
            .cloned()
            .ok_or_else(|| missing_context(plugin_id, slot))?;
        let module_name = slot.name().to_string();
        let span = ctx.span().clone();

        debug!(parent: &span, hook = %hook, "Invoking module hook");

        let module = slot.module_mut();
        let result = async {
            match (hook, container) {
                (Hook::Initialize, _) => module.initialize(&ctx).await,
                (Hook::Configure, _) => module.configure(&ctx).await,
                (Hook::Start, Some(c)) => module.on_start(&ctx, c).await,
                (Hook::Run, Some(c)) => module.on_run(&ctx, c).await,
                (Hook::Stop, Some(c)) => module.on_stop(&ctx, c).await,
                (other, _) => Err(Error::Internal(format!(
                    "hook {} cannot be invoked here",
                    other
                ))),
            }
        }
        .instrument(span)
        .await;

        self.record(hook, plugin_id, &module_name, result)
    }

    /// 훅 결과를 이벤트로 발행하고 에러를 변환
    fn record(&self, hook: Hook, plugin_id: &str, module_name: &str, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) => {
                self.events
                    .publish(LifecycleEvent::completed(hook, plugin_id, module_name));
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                match hook {
                    Hook::Stop => warn!(
                        plugin = %plugin_id,
                        module = %module_name,
                        error = %message,
                        "Module stop failed"
                    ),
                    _ => error!(
                        plugin = %plugin_id,
                        module = %module_name,
                        hook = %hook,
                        error = %message,
                        "Module hook failed"
                    ),
                }
                self.events.publish(LifecycleEvent::failed(
                    hook,
                    plugin_id,
                    module_name,
                    message,
                ));
                Err(hook_error(hook, plugin_id, module_name, err))
            }
        }
    }
}
