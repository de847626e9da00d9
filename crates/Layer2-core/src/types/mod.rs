//! # Type Registry
//!
//! 플러그인이 노출한 타입을 한 번 스캔하고 known-type contract/구현을 교차 해석한다.
//!
//! ## 흐름
//!
//! ```text
//! Plugin/Module exposed_types()
//!          │
//!          ▼
//!   TypeScanner::scan ──► TypeCatalog (플러그인별 PluginType)
//!          │
//!          ▼
//!   KnownTypeResolver::resolve ──► satisfies / discovered_by / implementations
//!          │
//!          ▼
//!   Arc<TypeCatalog> (불변) ──► TypeView (Core: 전체, App/Host: App+Host만)
//! ```

mod catalog;
mod descriptor;
mod resolver;
mod scanner;

pub use catalog::{PluginType, PluginTypes, TypeCatalog, TypeRef, TypeView, Visibility};
pub use descriptor::{ContractId, ServiceFactory, ServiceInstance, TypeDescriptor, TypeKind};
pub use resolver::KnownTypeResolver;
pub use scanner::TypeScanner;
