//! Module Context - 모듈 하나에게 주어지는 범위 제한 뷰
//!
//! build() 시 (플러그인, 모듈)마다 한 번 생성되고 이후 읽기 전용이다.
//!
//! ## 가시성
//! - `all_plugin_types`: Core 플러그인 모듈은 컴포지션 전체,
//!   App/Host 플러그인 모듈은 App+Host 소유 타입만
//! - `all_app_plugin_types`: 분류와 무관하게 항상 App+Host 소유 타입
//!
//! 전역 로거 대신 모듈별 `tracing` span을 가진다.
//!
//! ## 사용 예시
//! ```ignore
//! async fn on_start(&mut self, ctx: &ModuleContext, container: &Container) -> Result<()> {
//!     let config = ctx.config::<GreeterConfig>()?;
//!     for handler in ctx.all_plugin_types().implementations_of(&HANDLER) {
//!         tracing::info!(parent: ctx.span(), handler = %handler.name(), "Handler visible");
//!     }
//!     Ok(())
//! }
//! ```

use crate::plugin::{ConfigSet, Plugin, PluginClass};
use crate::types::{TypeCatalog, TypeView, Visibility};
use keystone_foundation::{Error, Result, Settings};
use std::any::Any;
use std::sync::Arc;
use tracing::Span;

/// 모듈 컨텍스트
#[derive(Debug, Clone)]
pub struct ModuleContext {
    plugin_id: String,
    classification: PluginClass,
    module_name: String,

    /// 분류에 따라 결정된 가시 타입
    all_plugin_types: TypeView,

    /// App + Host 타입 (항상)
    all_app_plugin_types: TypeView,

    /// 소유 플러그인의 설정 객체
    configs: Arc<ConfigSet>,

    /// 외부 설정 공급자
    settings: Arc<Settings>,

    span: Span,
}

impl ModuleContext {
    pub(crate) fn new(
        plugin: &Plugin,
        module_name: &str,
        catalog: Arc<TypeCatalog>,
        settings: Arc<Settings>,
    ) -> Self {
        let classification = plugin.classification();
        let span = tracing::info_span!(
            "module",
            plugin = %plugin.id(),
            module = %module_name,
            class = %classification
        );

        Self {
            plugin_id: plugin.id().to_string(),
            classification,
            module_name: module_name.to_string(),
            all_plugin_types: TypeView::new(
                Arc::clone(&catalog),
                Visibility::for_class(classification),
            ),
            all_app_plugin_types: TypeView::new(catalog, Visibility::Application),
            configs: Arc::clone(plugin.configs()),
            settings,
            span,
        }
    }

    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    pub fn classification(&self) -> PluginClass {
        self.classification
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// 이 모듈에게 보이는 모든 타입
    pub fn all_plugin_types(&self) -> &TypeView {
        &self.all_plugin_types
    }

    /// App + Host 플러그인 소유 타입
    pub fn all_app_plugin_types(&self) -> &TypeView {
        &self.all_app_plugin_types
    }

    /// 소유 플러그인의 설정 객체 조회 - 없으면 Missing-config
    /// 설정 객체 조회 - 없으면 이 모듈 이름이 담긴 Missing-config
    pub fn config<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        self.configs.get::<T>().map_err(|err| match err {
            Error::MissingConfig { plugin, config, .. } => Error::MissingConfig {
                plugin,
                module: Some(self.module_name.clone()),
                config,
            },
            other => other,
        })
    }

    pub fn try_config<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.configs.try_get::<T>()
    }

    pub fn configs(&self) -> &ConfigSet {
        &self.configs
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// 모듈 span (훅 호출은 이 span 안에서 실행된다)
    pub fn span(&self) -> &Span {
        &self.span
    }
}
