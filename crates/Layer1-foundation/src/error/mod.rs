//! Error types for Keystone
//!
//! 컴포지션/라이프사이클 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// 모듈 하나의 훅 실패 기록 (Stop 단계 집계용)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFailure {
    /// 실패한 단계 이름
    pub phase: String,

    /// 소유 플러그인 ID
    pub plugin: String,

    /// 모듈 이름
    pub module: String,

    /// 원인 메시지
    pub message: String,
}

impl std::fmt::Display for ModuleFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}::{} failed during {}: {}",
            self.plugin, self.module, self.phase, self.message
        )
    }
}

/// Keystone 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 컴포지션 관련
    // ========================================================================
    #[error("Duplicate module: {module} is already added to plugin {plugin}")]
    DuplicateModule { plugin: String, module: String },

    #[error("Duplicate module name: plugin {plugin} already has a module named {name}")]
    DuplicateModuleName { plugin: String, name: String },

    #[error("Duplicate config: {config} is already added to plugin {plugin}")]
    DuplicateConfig { plugin: String, config: String },

    /// 모듈 컨텍스트에서 조회한 경우 `module`이 채워진다
    #[error("Missing config: {} has no config of type {config}", config_owner(.plugin, .module))]
    MissingConfig {
        plugin: String,
        module: Option<String>,
        config: String,
    },

    #[error("Multiple host plugins: {rejected} cannot be added, {existing} is already the host")]
    MultipleHost { existing: String, rejected: String },

    #[error("No host plugin registered")]
    MissingHost,

    #[error("Duplicate plugin: {0} is already registered")]
    DuplicatePlugin(String),

    #[error("Duplicate {registry} entry '{name}': claimed by {existing} and {rejected}")]
    DuplicateRegistryEntry {
        registry: String,
        name: String,
        existing: String,
        rejected: String,
    },

    #[error("Module context already assigned: {plugin}::{module}")]
    ContextAlreadyAssigned { plugin: String, module: String },

    // ========================================================================
    // 라이프사이클 관련
    // ========================================================================
    #[error("Module {plugin}::{module} failed during {phase}: {message}")]
    ModuleFailed {
        phase: String,
        plugin: String,
        module: String,
        message: String,
    },

    #[error("Stop failed for {} module(s): {}", .0.len(), join_failures(.0))]
    StopFailed(Vec<ModuleFailure>),

    #[error("Cannot {operation} while application is {current}")]
    InvalidPhase { operation: String, current: String },

    // ========================================================================
    // 서비스 컨테이너 관련
    // ========================================================================
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Service type mismatch: {key} is not a {expected}")]
    ServiceTypeMismatch { key: String, expected: String },

    #[error("Circular service dependency: {}", .chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

fn join_failures(failures: &[ModuleFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn config_owner(plugin: &str, module: &Option<String>) -> String {
    match module {
        Some(module) => format!("module {}::{}", plugin, module),
        None => format!("plugin {}", plugin),
    }
}

impl Error {
    /// 컴포지션 단계에서 발생하는 치명적 에러인지 확인
    pub fn is_composition_error(&self) -> bool {
        matches!(
            self,
            Error::DuplicateModule { .. }
                | Error::DuplicateModuleName { .. }
                | Error::DuplicateConfig { .. }
                | Error::MissingConfig { .. }
                | Error::MultipleHost { .. }
                | Error::MissingHost
                | Error::DuplicatePlugin(_)
                | Error::DuplicateRegistryEntry { .. }
                | Error::ContextAlreadyAssigned { .. }
        )
    }

    /// 모듈 훅 실패 에러 생성 헬퍼
    pub fn module_failed(
        phase: impl Into<String>,
        plugin: impl Into<String>,
        module: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::ModuleFailed {
            phase: phase.into(),
            plugin: plugin.into(),
            module: module.into(),
            message: message.into(),
        }
    }

    /// 단계 위반 에러 생성 헬퍼
    pub fn invalid_phase(operation: impl Into<String>, current: impl std::fmt::Display) -> Self {
        Error::InvalidPhase {
            operation: operation.into(),
            current: current.to_string(),
        }
    }

    /// 중복 레지스트리 항목 에러 생성 헬퍼
    pub fn duplicate_entry(
        registry: impl Into<String>,
        name: impl Into<String>,
        existing: impl Into<String>,
        rejected: impl Into<String>,
    ) -> Self {
        Error::DuplicateRegistryEntry {
            registry: registry.into(),
            name: name.into(),
            existing: existing.into(),
            rejected: rejected.into(),
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composition_errors_are_classified() {
        let err = Error::MultipleHost {
            existing: "host.a".into(),
            rejected: "host.b".into(),
        };
        assert!(err.is_composition_error());
        assert!(err.to_string().contains("host.b"));

        let err = Error::module_failed("start", "core.clock", "ClockModule", "boom");
        assert!(!err.is_composition_error());
        assert_eq!(
            err.to_string(),
            "Module core.clock::ClockModule failed during start: boom"
        );
    }

    #[test]
    fn test_stop_failed_lists_every_module() {
        let err = Error::StopFailed(vec![
            ModuleFailure {
                phase: "stop".into(),
                plugin: "p1".into(),
                module: "A".into(),
                message: "socket closed".into(),
            },
            ModuleFailure {
                phase: "stop".into(),
                plugin: "p2".into(),
                module: "B".into(),
                message: "timeout".into(),
            },
        ]);

        let msg = err.to_string();
        assert!(msg.starts_with("Stop failed for 2 module(s)"));
        assert!(msg.contains("p1::A"));
        assert!(msg.contains("p2::B"));
    }

    #[test]
    fn test_missing_config_names_module_when_known() {
        let err = Error::MissingConfig {
            plugin: "clock".into(),
            module: Some("ticker".into()),
            config: "ClockConfig".into(),
        };
        assert_eq!(
            err.to_string(),
            "Missing config: module clock::ticker has no config of type ClockConfig"
        );

        let err = Error::MissingConfig {
            plugin: "clock".into(),
            module: None,
            config: "ClockConfig".into(),
        };
        assert_eq!(
            err.to_string(),
            "Missing config: plugin clock has no config of type ClockConfig"
        );
    }

    #[test]
    fn test_circular_dependency_message() {
        let err = Error::CircularDependency {
            chain: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Circular service dependency: a -> b -> a");
        assert!(!err.is_composition_error());
    }

    #[test]
    fn test_from_str() {
        let err: Error = "oops".into();
        assert!(matches!(err, Error::Internal(ref s) if s == "oops"));
    }
}
