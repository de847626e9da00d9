//! Settings - 외부 설정 트리
//!
//! 플러그인/모듈이 읽기 전용으로 소비하는 계층형 설정.
//! 경로는 점(`.`)으로 구분한다 (예: `"plugins.greeter"`).

use super::AttributeBag;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// 계층형 설정
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    root: Value,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }
}

impl Settings {
    /// 빈 설정
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON 값에서 생성
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// JSON 문자열에서 생성
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(Self::from_value(serde_json::from_str(content)?))
    }

    /// TOML 문자열에서 생성
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let value: toml::Value = toml::from_str(content)?;
        let root = serde_json::to_value(value)?;
        Ok(Self::from_value(root))
    }

    /// 루트 값
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// 경로의 섹션 조회
    pub fn section(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(&self.root);
        }

        path.split('.')
            .try_fold(&self.root, |node, segment| node.get(segment))
    }

    /// 섹션 존재 여부
    pub fn contains(&self, path: &str) -> bool {
        self.section(path).is_some()
    }

    /// 섹션을 타입으로 바인딩
    pub fn bind<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let section = self
            .section(path)
            .ok_or_else(|| Error::Config(format!("settings section '{}' not found", path)))?;

        serde_json::from_value(section.clone())
            .map_err(|e| Error::Config(format!("cannot bind settings section '{}': {}", path, e)))
    }

    /// 섹션을 타입으로 바인딩 - 섹션이 없으면 기본값
    pub fn bind_or_default<T: DeserializeOwned + Default>(&self, path: &str) -> Result<T> {
        if self.contains(path) {
            self.bind(path)
        } else {
            Ok(T::default())
        }
    }

    /// 섹션을 속성 모음으로 조회
    pub fn attributes(&self, path: &str) -> AttributeBag {
        self.section(path)
            .cloned()
            .map(AttributeBag::from_value)
            .unwrap_or_default()
    }

    /// 다른 설정을 병합 (later가 earlier를 오버라이드, 객체는 재귀 병합)
    pub fn merge(mut self, later: Settings) -> Self {
        merge_values(&mut self.root, later.root);
        self
    }
}

fn merge_values(earlier: &mut Value, later: Value) {
    match (earlier, later) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
