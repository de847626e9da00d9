//! Container - 봉인된 런타임 서비스 컨테이너
//!
//! 팩토리 서비스는 처음 resolve될 때 생성되어 싱글턴으로 캐시된다.
//! 팩토리 실행 중에는 캐시 락을 잡지 않으므로 팩토리 안에서 다른 서비스를 resolve할 수 있다.
//! 팩토리는 동기 호출이므로, 생성 중인 등록은 스레드별 스택으로 추적해 순환을 감지한다.

use super::services::{Registration, ServiceKey, ServiceSource};
use crate::types::{ContractId, ServiceInstance};
use keystone_foundation::{Error, Result};
use parking_lot::Mutex;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

thread_local! {
    /// 현재 스레드에서 생성 중인 팩토리 (컨테이너 주소, 등록 인덱스)
    static BUILDING: RefCell<Vec<(usize, usize)>> = const { RefCell::new(Vec::new()) };
}

/// 팩토리 실행 동안 BUILDING 스택에 머무는 항목
struct BuildingGuard;

impl BuildingGuard {
    fn enter(entry: (usize, usize)) -> Self {
        BUILDING.with(|stack| stack.borrow_mut().push(entry));
        BuildingGuard
    }
}

impl Drop for BuildingGuard {
    fn drop(&mut self) {
        BUILDING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// resolve 가능한 서비스 컨테이너
pub struct Container {
    registrations: Vec<Registration>,

    /// 키 → 등록 인덱스 (등록 순)
    index: HashMap<ServiceKey, Vec<usize>>,

    /// 생성된 싱글턴 (등록 인덱스 → 인스턴스)
    singletons: Mutex<HashMap<usize, ServiceInstance>>,
}

impl Container {
    pub(crate) fn new(registrations: Vec<Registration>) -> Self {
        let mut index: HashMap<ServiceKey, Vec<usize>> = HashMap::new();
        for (idx, registration) in registrations.iter().enumerate() {
            index
                .entry(registration.key().clone())
                .or_default()
                .push(idx);
        }

        Self {
            registrations,
            index,
            singletons: Mutex::new(HashMap::new()),
        }
    }

    /// 빈 컨테이너
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    fn instance_at(&self, idx: usize) -> Result<ServiceInstance> {
        match &self.registrations[idx].source {
            ServiceSource::Instance(instance) => Ok(Arc::clone(instance)),
            ServiceSource::Alias(name) => self.resolve_raw(&ServiceKey::named(name.clone())),
            ServiceSource::Factory(factory) => {
                if let Some(existing) = self.singletons.lock().get(&idx) {
                    return Ok(Arc::clone(existing));
                }

                let entry = (self as *const Container as usize, idx);
                if let Some(chain) = self.cycle_through(entry) {
                    return Err(Error::CircularDependency { chain });
                }

                let created = {
                    let _building = BuildingGuard::enter(entry);
                    factory(self)?
                };
                let mut singletons = self.singletons.lock();
                Ok(Arc::clone(singletons.entry(idx).or_insert(created)))
            }
        }
    }

    /// `entry`가 이미 생성 중이면 순환 경로의 서비스 키 목록
    fn cycle_through(&self, entry: (usize, usize)) -> Option<Vec<String>> {
        BUILDING.with(|stack| {
            let stack = stack.borrow();
            let start = stack.iter().position(|building| *building == entry)?;
            let chain = stack[start..]
                .iter()
                .chain(std::iter::once(&entry))
                .map(|&(_, idx)| self.registrations[idx].key().to_string())
                .collect();
            Some(chain)
        })
    }

    /// 키의 첫 번째 등록을 타입 지정 없이 resolve
    pub fn resolve_raw(&self, key: &ServiceKey) -> Result<ServiceInstance> {
        let idx = self
            .index
            .get(key)
            .and_then(|indices| indices.first())
            .copied()
            .ok_or_else(|| Error::ServiceNotFound(key.to_string()))?;
        self.instance_at(idx)
    }

    /// 이름으로 resolve
    pub fn resolve<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        let key = ServiceKey::named(name);
        downcast(&key, self.resolve_raw(&key)?)
    }

    /// 이름으로 resolve (없거나 타입이 다르면 None)
    pub fn try_resolve<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.resolve(name).ok()
    }

    /// contract의 첫 번째 구현 resolve
    pub fn resolve_contract<T: Any + Send + Sync>(&self, contract: &ContractId) -> Result<Arc<T>> {
        let key = ServiceKey::Contract(contract.clone());
        downcast(&key, self.resolve_raw(&key)?)
    }

    /// contract의 모든 구현 resolve (등록 순)
    pub fn resolve_all<T: Any + Send + Sync>(&self, contract: &ContractId) -> Result<Vec<Arc<T>>> {
        let key = ServiceKey::Contract(contract.clone());
        let Some(indices) = self.index.get(&key) else {
            return Ok(Vec::new());
        };

        indices
            .iter()
            .map(|&idx| downcast(&key, self.instance_at(idx)?))
            .collect()
    }

    pub fn contains(&self, key: &ServiceKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn contains_named(&self, name: &str) -> bool {
        self.contains(&ServiceKey::named(name))
    }

    /// 모든 등록 (진단용)
    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// 이미 생성된 싱글턴 수
    pub fn instantiated(&self) -> usize {
        self.singletons.lock().len()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("registrations", &self.registrations.len())
            .field("instantiated", &self.instantiated())
            .finish()
    }
}

fn downcast<T: Any + Send + Sync>(key: &ServiceKey, instance: ServiceInstance) -> Result<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| Error::ServiceTypeMismatch {
            key: key.to_string(),
            expected: std::any::type_name::<T>().to_string(),
        })
}
