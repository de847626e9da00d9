//! Type Descriptor - 플러그인이 노출하는 타입의 정적 설명
//!
//! 런타임 리플렉션 대신 각 플러그인/모듈이 노출 타입 목록을 직접 제공한다.
//! Contract는 문자열 태그(`ContractId`)로 식별한다.

use crate::registry::Container;
use keystone_foundation::Result;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;

/// 컨테이너가 보관하는 서비스 인스턴스
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// 서비스 팩토리 - 중첩 resolve를 위해 컨테이너를 받는다
pub type ServiceFactory = Arc<dyn Fn(&Container) -> Result<ServiceInstance> + Send + Sync>;

// ============================================================================
// ContractId
// ============================================================================

/// Known-type contract 식별자
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(String);

impl ContractId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContractId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContractId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ContractId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ============================================================================
// TypeKind
// ============================================================================

/// 타입 종류
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// 상태 없는 마커 capability (known-type contract)
    Contract,

    /// 추상 타입 - contract를 구현해도 known-type implementation이 아님
    Abstract { implements: Vec<ContractId> },

    /// 구체 타입
    Concrete { implements: Vec<ContractId> },
}

// ============================================================================
// TypeDescriptor
// ============================================================================

/// 노출 타입 설명
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    factory: Option<ServiceFactory>,
}

impl TypeDescriptor {
    /// Contract 타입 (이름이 곧 ContractId)
    pub fn contract(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Contract,
            factory: None,
        }
    }

    /// 구체 타입
    pub fn concrete(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Concrete { implements: vec![] },
            factory: None,
        }
    }

    /// 추상 타입
    pub fn abstract_type(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Abstract { implements: vec![] },
            factory: None,
        }
    }

    /// 빌더 패턴: 구현하는 contract 추가 (contract 타입에는 무시됨)
    pub fn implementing(mut self, contract: impl Into<ContractId>) -> Self {
        match &mut self.kind {
            TypeKind::Concrete { implements } | TypeKind::Abstract { implements } => {
                let contract = contract.into();
                if !implements.contains(&contract) {
                    implements.push(contract);
                }
            }
            TypeKind::Contract => {}
        }
        self
    }

    /// 빌더 패턴: 원시 팩토리 설정
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Container) -> Result<ServiceInstance> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// 빌더 패턴: 타입 지정 팩토리 설정
    pub fn producing<T, F>(self, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        self.with_factory(move |container| {
            let instance: ServiceInstance = Arc::new(factory(container)?);
            Ok(instance)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn factory(&self) -> Option<&ServiceFactory> {
        self.factory.as_ref()
    }

    pub fn is_contract(&self) -> bool {
        matches!(self.kind, TypeKind::Contract)
    }

    pub fn is_concrete(&self) -> bool {
        matches!(self.kind, TypeKind::Concrete { .. })
    }

    /// 선언된 구현 contract 목록
    pub fn implements(&self) -> &[ContractId] {
        match &self.kind {
            TypeKind::Concrete { implements } | TypeKind::Abstract { implements } => implements,
            TypeKind::Contract => &[],
        }
    }

    /// contract 타입이면 자신의 ContractId
    pub fn contract_id(&self) -> Option<ContractId> {
        self.is_contract().then(|| ContractId::new(self.name.clone()))
    }
}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("has_factory", &self.factory.is_some())
            .finish()
    }
}
