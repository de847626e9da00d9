//! keystone-core: Composition Runtime for Keystone
//!
//! Layer2 - 플러그인 컴포지션 및 모듈 라이프사이클 레이어
//!
//! # 주요 모듈
//!
//! - `plugin`: 플러그인 매니페스트, 분류 (Host/App/Core), 모듈, 설정 객체
//! - `types`: 노출 타입 스캔 및 known-type contract 해석
//! - `context`: 모듈별 범위 제한 컨텍스트
//! - `registry`: 서비스 선언 레지스트리와 런타임 컨테이너
//! - `composite`: 빌더, 라이프사이클 오케스트레이터, 컴포지트 로그
//!
//! # 사용 예시
//!
//! ```ignore
//! use keystone_core::{CompositeApplicationBuilder, Plugin, PluginManifest};
//!
//! let mut app = CompositeApplicationBuilder::new(settings)
//!     .with_plugin(Plugin::new(PluginManifest::host("host", "Host")))?
//!     .with_plugin(clock_plugin)?
//!     .build()
//!     .await?;
//!
//! app.composite_log().emit()?;
//! app.start().await?;
//! app.run().await?;
//! app.stop().await?;
//! ```

pub mod composite;
pub mod context;
pub mod plugin;
pub mod registry;
pub mod types;

// Re-exports: Composite
pub use composite::{
    CompositeApplication, CompositeApplicationBuilder, CompositeLog, DiagnosticSink,
    DiagnosticValue, Hook, HookOutcome, LifecycleEvent, LifecycleEvents, LifecycleOrchestrator,
    Phase,
};

// Re-exports: Context
pub use context::ModuleContext;

// Re-exports: Plugin
pub use plugin::{
    ConfigSet, ModuleSlot, Plugin, PluginClass, PluginManifest, PluginModule, PluginVersion,
};

// Re-exports: Registry
pub use registry::{
    Container, NameRegistry, Registration, ServiceKey, ServiceRegistrar, ServiceRegistry,
};

// Re-exports: Types
pub use types::{
    ContractId, KnownTypeResolver, PluginType, PluginTypes, ServiceFactory, ServiceInstance,
    TypeCatalog, TypeDescriptor, TypeKind, TypeRef, TypeScanner, TypeView, Visibility,
};

// Layer1 re-exports
pub use keystone_foundation::{Error, ModuleFailure, Result, Settings};

/// Layer2 버전
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
