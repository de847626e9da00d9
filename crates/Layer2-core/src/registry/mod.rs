//! # Service Registry
//!
//! 모듈이 선언한 서비스를 모아 런타임 컨테이너로 봉인하는 레지스트리
//!
//! ## 흐름
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   ServiceRegistry                         │
//! │  ServicesRegistered 단계에서만 변경 가능 (append-only)     │
//! │  ┌──────────────────┬──────────────────┬──────────────┐  │
//! │  │ registrar("a")   │ registrar("b")   │ ...          │  │
//! │  │ add_instance     │ add_type         │              │  │
//! │  └──────────────────┴──────────────────┴──────────────┘  │
//! │                         │ build()                         │
//! │                         ▼                                 │
//! │                    Container (불변)                        │
//! │   resolve / resolve_contract / resolve_all                │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! `NameRegistry`는 서비스 이름뿐 아니라 큐/네임스페이스 같은
//! 플러그인 간 외부 이름 충돌 검사에도 쓰인다.
//!
//! ## 사용 예시
//!
//! ```ignore
//! let mut registry = ServiceRegistry::new();
//! registry.registrar("core.clock").add_instance("clock", SystemClock)?;
//!
//! let container = registry.build();
//! let clock = container.resolve::<SystemClock>("clock")?;
//! ```

mod container;
mod names;
mod services;

pub use container::Container;
pub use names::NameRegistry;
pub use services::{Registration, ServiceKey, ServiceRegistrar, ServiceRegistry};
