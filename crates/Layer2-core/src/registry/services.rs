//! Service Registry - ServicesRegistered 단계의 서비스 선언 모음
//!
//! 모든 모듈이 선언을 추가한 뒤 한 번 `build()`되어 `Container`가 된다.
//! 이름 키는 컴포지션 전체에서 유일하고, contract 키는 여러 제공자를 허용한다.

use super::container::Container;
use super::names::NameRegistry;
use crate::types::{ContractId, PluginType, ServiceFactory, ServiceInstance};
use keystone_foundation::{Error, Result};
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// ServiceKey
// ============================================================================

/// 서비스 조회 키
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceKey {
    /// 이름으로 생성 가능한 서비스
    Named(String),

    /// contract로 생성 가능한 서비스 (여러 구현 허용)
    Contract(ContractId),
}

impl ServiceKey {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn contract(id: impl Into<ContractId>) -> Self {
        Self::Contract(id.into())
    }
}

impl std::fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Contract(id) => write!(f, "contract:{}", id),
        }
    }
}

// ============================================================================
// Registration
// ============================================================================

#[derive(Clone)]
pub(crate) enum ServiceSource {
    Instance(ServiceInstance),
    Factory(ServiceFactory),
    /// 다른 이름 키를 가리킴 (contract → 구현 서비스)
    Alias(String),
}

/// 등록된 서비스 선언 하나
#[derive(Clone)]
pub struct Registration {
    key: ServiceKey,
    provider: String,
    type_name: String,
    pub(crate) source: ServiceSource,
}

impl Registration {
    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    /// 선언한 플러그인 ID
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// 생성되는 타입 이름
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key)
            .field("provider", &self.provider)
            .field("type_name", &self.type_name)
            .finish()
    }
}

// ============================================================================
// ServiceRegistry
// ============================================================================

/// 서비스 선언 레지스트리 (봉인 전)
pub struct ServiceRegistry {
    names: NameRegistry<()>,
    registrations: Vec<Registration>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            names: NameRegistry::new("service"),
            registrations: Vec::new(),
        }
    }

    /// 특정 플러그인 이름으로 선언하는 핸들
    pub fn registrar(&mut self, provider: impl Into<String>) -> ServiceRegistrar<'_> {
        ServiceRegistrar {
            registry: self,
            provider: provider.into(),
        }
    }

    fn push(
        &mut self,
        provider: &str,
        key: ServiceKey,
        type_name: String,
        source: ServiceSource,
    ) -> Result<()> {
        if let ServiceKey::Named(name) = &key {
            self.names.claim(name, provider, ())?;
        }

        debug!(provider = %provider, key = %key, type_name = %type_name, "Service declared");
        self.registrations.push(Registration {
            key,
            provider: provider.to_string(),
            type_name,
            source,
        });
        Ok(())
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// 선언을 봉인하고 resolve 가능한 컨테이너 생성
    pub fn build(self) -> Container {
        Container::new(self.registrations)
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// ServiceRegistrar - 플러그인 범위의 선언 핸들
// ============================================================================

/// 모듈에게 전달되는 선언 핸들
pub struct ServiceRegistrar<'a> {
    registry: &'a mut ServiceRegistry,
    provider: String,
}

impl ServiceRegistrar<'_> {
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// 이미 만들어진 인스턴스 등록
    pub fn add_instance<T: Any + Send + Sync>(&mut self, name: &str, value: T) -> Result<()> {
        let instance: ServiceInstance = Arc::new(value);
        self.registry.push(
            &self.provider,
            ServiceKey::named(name),
            std::any::type_name::<T>().to_string(),
            ServiceSource::Instance(instance),
        )
    }

    /// 팩토리로 생성되는 싱글턴 등록
    pub fn add_factory<T, F>(&mut self, name: &str, factory: F) -> Result<()>
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        let factory: ServiceFactory = Arc::new(move |container: &Container| {
            let instance: ServiceInstance = Arc::new(factory(container)?);
            Ok(instance)
        });
        self.registry.push(
            &self.provider,
            ServiceKey::named(name),
            std::any::type_name::<T>().to_string(),
            ServiceSource::Factory(factory),
        )
    }

    /// 이름 서비스를 contract로도 조회 가능하게 연결
    pub fn add_contract(&mut self, contract: impl Into<ContractId>, name: &str) -> Result<()> {
        self.registry.push(
            &self.provider,
            ServiceKey::Contract(contract.into()),
            name.to_string(),
            ServiceSource::Alias(name.to_string()),
        )
    }

    /// 스캔된 타입을 생성 가능한 서비스로 등록
    ///
    /// 타입 이름으로 등록하고, 만족시키는 모든 contract에 연결한다.
    pub fn add_type(&mut self, ty: &PluginType) -> Result<()> {
        let factory = ty.descriptor().factory().cloned().ok_or_else(|| {
            Error::Config(format!(
                "type {} from plugin {} has no factory",
                ty.name(),
                ty.owner()
            ))
        })?;

        self.registry.push(
            &self.provider,
            ServiceKey::named(ty.name()),
            ty.name().to_string(),
            ServiceSource::Factory(factory),
        )?;

        for contract in ty.satisfies() {
            self.add_contract(contract.clone(), ty.name())?;
        }
        Ok(())
    }
}
