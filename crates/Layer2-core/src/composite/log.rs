//! Composite Log - 빌드된 토폴로지의 진단 스냅샷
//!
//! 애플리케이션을 변경하지 않는 읽기 전용 투영이다.
//!
//! ```text
//! application
//! ├── phase / plugins / modules / services
//! └── plugins
//!     └── <plugin id>
//!         ├── name, classification, assembly
//!         ├── modules
//!         │   └── <module name>: 모듈이 log()로 기록한 항목
//!         ├── known_type_contracts
//!         │   └── <contract>: [구현 (플러그인), ...]
//!         ├── known_type_implementations
//!         │   └── <type>: { contracts, discovered_by }
//!         ├── registered_types: 서비스로 등록된 소유 타입
//!         └── services: 이 플러그인이 선언한 서비스 키
//! ```

use super::application::CompositeApplication;
use keystone_foundation::Result;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::info;

// ============================================================================
// DiagnosticValue / DiagnosticSink
// ============================================================================

/// 진단 값
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticValue {
    Value(Value),
    List(Vec<DiagnosticValue>),
    Nested(DiagnosticSink),
}

impl Serialize for DiagnosticValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => value.serialize(serializer),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Nested(sink) => sink.serialize(serializer),
        }
    }
}

impl From<Value> for DiagnosticValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for DiagnosticValue {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_string()))
    }
}

impl From<String> for DiagnosticValue {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

impl From<bool> for DiagnosticValue {
    fn from(value: bool) -> Self {
        Self::Value(Value::Bool(value))
    }
}

impl From<u64> for DiagnosticValue {
    fn from(value: u64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<usize> for DiagnosticValue {
    fn from(value: usize) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<i64> for DiagnosticValue {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<Vec<String>> for DiagnosticValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values.into_iter().map(DiagnosticValue::from).collect())
    }
}

impl From<DiagnosticSink> for DiagnosticValue {
    fn from(sink: DiagnosticSink) -> Self {
        Self::Nested(sink)
    }
}

/// 순서가 유지되는 이름 → 값 트리
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticSink {
    entries: Vec<(String, DiagnosticValue)>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 항목 추가 (같은 이름이 있으면 교체)
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<DiagnosticValue>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    /// 하위 트리를 만들어 추가
    pub fn section(
        &mut self,
        name: impl Into<String>,
        build: impl FnOnce(&mut DiagnosticSink),
    ) -> &mut Self {
        let mut child = DiagnosticSink::new();
        build(&mut child);
        self.add(name, child)
    }

    pub fn get(&self, name: &str) -> Option<&DiagnosticValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// 하위 트리 조회
    pub fn nested(&self, name: &str) -> Option<&DiagnosticSink> {
        match self.get(name) {
            Some(DiagnosticValue::Nested(sink)) => Some(sink),
            _ => None,
        }
    }

    /// 이름 (추가 순)
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for DiagnosticSink {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ============================================================================
// CompositeLog
// ============================================================================

/// 컴포지트 로그
#[derive(Debug, Clone)]
pub struct CompositeLog {
    root: DiagnosticSink,
}

impl CompositeLog {
    /// 애플리케이션 토폴로지 수집
    pub fn capture(app: &CompositeApplication) -> Self {
        let container = app.container();
        let catalog = app.catalog();

        let mut root = DiagnosticSink::new();
        root.section("application", |summary| {
            summary
                .add("phase", app.phase().to_string())
                .add("plugins", app.plugins().len())
                .add("modules", app.module_count())
                .add("services", container.len());
        });

        root.section("plugins", |plugins| {
            for plugin in app.plugins() {
                let manifest = plugin.manifest();
                let owned = catalog.types_of(plugin.id());

                plugins.section(plugin.id(), |entry| {
                    entry
                        .add("name", manifest.name.as_str())
                        .add("classification", manifest.classification.to_string())
                        .add(
                            "assembly",
                            format!("{} {}", manifest.assembly_name, manifest.assembly_version),
                        );
                    if !manifest.description.is_empty() {
                        entry.add("description", manifest.description.as_str());
                    }

                    entry.section("modules", |modules| {
                        for slot in plugin.slots() {
                            let Some(ctx) = slot.context() else {
                                continue;
                            };
                            modules.section(slot.name(), |sink| slot.module().log(ctx, sink));
                        }
                    });

                    entry.section("known_type_contracts", |contracts| {
                        for ty in owned.iter().filter(|t| t.is_known_type_contract()) {
                            let implementations: Vec<String> =
                                ty.implementations().iter().map(|r| r.to_string()).collect();
                            contracts.add(ty.name(), implementations);
                        }
                    });

                    entry.section("known_type_implementations", |implementations| {
                        for ty in owned.iter().filter(|t| t.is_known_type_implementation()) {
                            implementations.section(ty.name(), |binding| {
                                let contracts: Vec<String> =
                                    ty.satisfies().iter().map(|c| c.to_string()).collect();
                                binding
                                    .add("contracts", contracts)
                                    .add("discovered_by", ty.discovered_by().to_vec());
                            });
                        }
                    });

                    let registered: Vec<String> = owned
                        .iter()
                        .filter(|t| container.contains_named(t.name()))
                        .map(|t| t.name().to_string())
                        .collect();
                    entry.add("registered_types", registered);

                    let services: Vec<String> = container
                        .registrations()
                        .iter()
                        .filter(|r| r.provider() == plugin.id())
                        .map(|r| r.key().to_string())
                        .collect();
                    entry.add("services", services);
                });
            }
        });

        Self { root }
    }

    pub fn root(&self) -> &DiagnosticSink {
        &self.root
    }

    /// 플러그인 하나의 항목
    pub fn plugin(&self, id: &str) -> Option<&DiagnosticSink> {
        self.root.nested("plugins").and_then(|p| p.nested(id))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.root)?)
    }

    /// tracing으로 출력
    pub fn emit(&self) -> Result<()> {
        let json = serde_json::to_string(&self.root)?;
        info!(topology = %json, "Composite log");
        Ok(())
    }
}
