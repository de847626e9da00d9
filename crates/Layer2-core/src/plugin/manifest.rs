//! Plugin Manifest - 플러그인 메타데이터 정의

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 플러그인 버전
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct PluginVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PluginVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// 버전 문자열 파싱 (예: "1.2.3")
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return None;
        }

        Some(Self {
            major: parts[0].parse().ok()?,
            minor: parts[1].parse().ok()?,
            patch: parts[2].parse().ok()?,
        })
    }
}

impl std::fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Default for PluginVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

/// 플러그인 분류
///
/// 컴포지션에는 정확히 하나의 `Host`가 있어야 한다.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PluginClass {
    /// 실행 중인 프로세스 자체
    Host,

    /// 애플리케이션 전용 플러그인
    App,

    /// 재사용 가능한 공통(프레임워크) 플러그인
    Core,
}

impl PluginClass {
    /// 애플리케이션 쪽(App/Host) 분류인지 확인
    pub fn is_application_side(&self) -> bool {
        matches!(self, Self::App | Self::Host)
    }
}

impl std::fmt::Display for PluginClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::App => write!(f, "app"),
            Self::Core => write!(f, "core"),
        }
    }
}

/// 플러그인 매니페스트 - 정적 식별 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    /// 고유 플러그인 ID (예: "keystone.messaging")
    pub id: String,

    /// 표시 이름
    pub name: String,

    /// 설명
    pub description: String,

    /// 분류
    pub classification: PluginClass,

    /// 빌드 산출물 이름 (기본값: ID)
    pub assembly_name: String,

    /// 빌드 산출물 버전
    pub assembly_version: PluginVersion,

    /// 추가 메타데이터
    pub metadata: BTreeMap<String, String>,
}

impl PluginManifest {
    /// 새 매니페스트 생성
    pub fn new(id: impl Into<String>, name: impl Into<String>, classification: PluginClass) -> Self {
        let id = id.into();
        Self {
            assembly_name: id.clone(),
            id,
            name: name.into(),
            description: String::new(),
            classification,
            assembly_version: PluginVersion::default(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn host(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, PluginClass::Host)
    }

    pub fn app(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, PluginClass::App)
    }

    pub fn core(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, PluginClass::Core)
    }

    /// 빌더 패턴: 설명 설정
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// 빌더 패턴: 산출물 정보 설정
    pub fn with_assembly(mut self, name: impl Into<String>, version: PluginVersion) -> Self {
        self.assembly_name = name.into();
        self.assembly_version = version;
        self
    }

    /// 빌더 패턴: 메타데이터 추가
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
