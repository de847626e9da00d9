//! # Plugin System
//!
//! Keystone 컴포지션의 단위인 플러그인과 모듈
//!
//! ## 개요
//!
//! 플러그인은 하나의 분류를 가진다:
//! - **Host**: 실행 중인 프로세스 자체 (컴포지션마다 정확히 하나)
//! - **App**: 애플리케이션 고유 기능
//! - **Core**: 재사용 가능한 공통 기능 (컴포지션 전체 타입을 볼 수 있음)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Plugin                             │
//! │  PluginManifest (id, name, classification, assembly)        │
//! │  ┌───────────────────────────────────────────────────────┐ │
//! │  │  ModuleSlot[]  (선언 순서 = Start 순서)                 │ │
//! │  │  ┌────────────┬────────────┬────────────┐             │ │
//! │  │  │ Module A   │ Module B   │ ...        │             │ │
//! │  │  │ + Context  │ + Context  │            │             │ │
//! │  │  └────────────┴────────────┴────────────┘             │ │
//! │  └───────────────────────────────────────────────────────┘ │
//! │  ConfigSet (타입당 하나)      TypeDescriptor[] (노출 타입)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 예시
//!
//! ```ignore
//! struct Greeter;
//!
//! #[async_trait]
//! impl PluginModule for Greeter {
//!     fn name(&self) -> &str { "greeter" }
//!
//!     async fn on_start(&mut self, ctx: &ModuleContext, container: &Container) -> Result<()> {
//!         let clock = container.resolve::<Clock>("clock")?;
//!         Ok(())
//!     }
//! }
//!
//! let plugin = Plugin::new(PluginManifest::app("greeter", "Greeter"))
//!     .with_module(Greeter)?;
//! ```

mod config;
mod definition;
mod manifest;
mod traits;

pub use config::ConfigSet;
pub use definition::{ModuleSlot, Plugin};
pub use manifest::{PluginClass, PluginManifest, PluginVersion};
pub use traits::PluginModule;
