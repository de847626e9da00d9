//! Plugin traits - 모듈 인터페이스

use crate::composite::DiagnosticSink;
use crate::context::ModuleContext;
use crate::registry::{Container, ServiceRegistrar};
use crate::types::{TypeDescriptor, TypeView};
use async_trait::async_trait;
use keystone_foundation::Result;

// ============================================================================
// PluginModule Trait - 모든 모듈이 구현하는 인터페이스
// ============================================================================

/// 플러그인 모듈 트레이트
///
/// 모듈은 자신이 속한 플러그인 안에서 선언 순서대로 각 단계 훅을 호출받는다.
/// `name()` 외에는 모두 기본 구현이 no-op이다.
///
/// ## 호출 순서
///
/// ```text
/// build():  initialize → configure → register_services → scan_for_services
///           (각 단계는 모든 플러그인의 모든 모듈에서 끝난 뒤 다음 단계로)
/// start():  on_start  (등록 순)
/// run():    on_run    (등록 순)
/// stop():   on_stop   (정확히 역순)
/// ```
#[async_trait]
pub trait PluginModule: Send + Sync {
    /// 모듈 이름 (진단/로그용)
    fn name(&self) -> &str;

    /// 이 모듈이 노출하는 타입 목록
    ///
    /// 컴포지션 시 스캐너가 한 번만 호출한다.
    fn exposed_types(&self) -> Vec<TypeDescriptor> {
        vec![]
    }

    /// 초기화 - 컨텍스트가 할당된 직후
    async fn initialize(&mut self, _ctx: &ModuleContext) -> Result<()> {
        Ok(())
    }

    /// 설정 - 모든 모듈의 initialize 이후
    async fn configure(&mut self, _ctx: &ModuleContext) -> Result<()> {
        Ok(())
    }

    /// 생성 가능한 서비스 선언
    fn register_services(
        &mut self,
        _ctx: &ModuleContext,
        _services: &mut ServiceRegistrar<'_>,
    ) -> Result<()> {
        Ok(())
    }

    /// 보이는 타입 중 등록할 후보를 스캔
    ///
    /// `types`는 모듈 분류에 따라 결정된 가시 범위 (`ctx.all_plugin_types()`와 같음).
    fn scan_for_services(
        &mut self,
        _ctx: &ModuleContext,
        _types: &TypeView,
        _services: &mut ServiceRegistrar<'_>,
    ) -> Result<()> {
        Ok(())
    }

    /// 시작 - 앞서 시작된 모듈의 서비스를 resolve할 수 있다
    async fn on_start(&mut self, _ctx: &ModuleContext, _container: &Container) -> Result<()> {
        Ok(())
    }

    /// 실행 - 모든 모듈의 on_start 이후
    async fn on_run(&mut self, _ctx: &ModuleContext, _container: &Container) -> Result<()> {
        Ok(())
    }

    /// 정지 - 의존 모듈이 일부 정리된 상태일 수 있다
    async fn on_stop(&mut self, _ctx: &ModuleContext, _container: &Container) -> Result<()> {
        Ok(())
    }

    /// 진단 항목 기록 (읽기 전용)
    fn log(&self, _ctx: &ModuleContext, _sink: &mut DiagnosticSink) {}
}
