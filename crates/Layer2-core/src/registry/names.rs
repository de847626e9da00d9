//! Name Registry - 플러그인 간 외부 이름 점유
//!
//! 큐/네임스페이스/서비스 이름처럼 컴포지션 전체에서 유일해야 하는 이름을 관리한다.
//! 같은 이름을 두 번 점유하면 `DuplicateRegistryEntry`.

use keystone_foundation::{Error, Result};
use std::collections::HashMap;

struct NameEntry<T> {
    name: String,
    owner: String,
    value: T,
}

/// 외부 이름 레지스트리
pub struct NameRegistry<T> {
    /// 레지스트리 종류 (에러 메시지용, 예: "queue")
    kind: String,

    /// 점유 순서대로
    entries: Vec<NameEntry<T>>,

    index: HashMap<String, usize>,
}

impl<T> NameRegistry<T> {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// 이름 점유
    pub fn claim(&mut self, name: &str, owner: &str, value: T) -> Result<()> {
        if let Some(&idx) = self.index.get(name) {
            return Err(Error::duplicate_entry(
                self.kind.clone(),
                name,
                self.entries[idx].owner.clone(),
                owner,
            ));
        }

        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push(NameEntry {
            name: name.to_string(),
            owner: owner.to_string(),
            value,
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&idx| &self.entries[idx].value)
    }

    pub fn owner_of(&self, name: &str) -> Option<&str> {
        self.index
            .get(name)
            .map(|&idx| self.entries[idx].owner.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// (이름, 소유자, 값) - 점유 순서대로
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &T)> {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.owner.as_str(), &e.value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
