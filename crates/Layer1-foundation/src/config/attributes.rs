//! Attribute Bag - 이름 붙은 속성 모음
//!
//! 키 → JSON 값 맵에 타입 지정 접근자를 제공한다.
//! 기본 접근자는 `Option`/`Result`를 돌려주고, 값이 반드시 있어야 하는 경우에만
//! `require`를 사용한다.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 키 → 값 속성 모음
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeBag {
    values: Map<String, Value>,
}

impl AttributeBag {
    /// 빈 속성 모음 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON 객체에서 생성 (객체가 아니면 빈 모음)
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(values) => Self { values },
            _ => Self::default(),
        }
    }

    /// 빌더 패턴: 속성 추가
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// 속성 설정 (기존 값 반환)
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// 속성 제거
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// 원시 값 조회
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// 타입 지정 조회 (없거나 타입이 맞지 않으면 None)
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.try_get(key).ok().flatten()
    }

    /// 타입 지정 조회 - 타입 불일치는 에러로 구분
    pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
                Error::Config(format!("attribute '{}' has an unexpected type: {}", key, e))
            }),
        }
    }

    /// 필수 속성 조회
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.try_get(key)?
            .ok_or_else(|| Error::Config(format!("required attribute '{}' is missing", key)))
    }

    /// 조회, 없으면 기본값
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// JSON 값으로 변환
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}
