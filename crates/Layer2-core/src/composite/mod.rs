//! # Composite Application
//!
//! 등록된 플러그인을 하나의 실행 프로세스로 조립하고 라이프사이클을 구동한다.
//!
//! ## 단계
//!
//! ```text
//! Registered → Initialized → Configured → ServicesRegistered → Built
//!     (CompositeApplicationBuilder::build)
//!
//! Built → Started → Running → Stopped
//!     (CompositeApplication::start / run / stop)
//!
//! start/run 실패 → Faulted → stop 만 허용
//! ```
//!
//! - 한 단계는 모든 플러그인의 모든 모듈에서 끝난 뒤 다음 단계가 시작된다.
//! - Start/Run은 플러그인 등록 순서, 모듈 선언 순서를 따른다.
//! - Stop은 시작 순서의 정확히 역순이며 실패해도 계속 진행한다.

mod application;
mod builder;
mod events;
mod lifecycle;
mod log;

pub use application::CompositeApplication;
pub use builder::CompositeApplicationBuilder;
pub use events::{Hook, HookOutcome, LifecycleEvent, LifecycleEvents};
pub use lifecycle::{LifecycleOrchestrator, Phase};
pub use log::{CompositeLog, DiagnosticSink, DiagnosticValue};
