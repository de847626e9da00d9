//! Plugin Config - 플러그인별 설정 객체 저장소
//!
//! 구체 타입마다 최대 하나씩 등록된다.

use keystone_foundation::{Error, Result};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
struct ConfigEntry {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

/// 플러그인 설정 객체 모음 (타입 → 값)
#[derive(Clone, Default)]
pub struct ConfigSet {
    /// 소유 플러그인 ID (에러 메시지용)
    plugin_id: String,

    entries: HashMap<TypeId, ConfigEntry>,

    /// 등록 순서 (진단용)
    order: Vec<TypeId>,
}

impl ConfigSet {
    pub fn new(plugin_id: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// 설정 객체 등록 - 같은 타입을 두 번 등록하면 Duplicate-config
    pub fn add<T: Any + Send + Sync>(&mut self, config: T) -> Result<()> {
        let type_id = TypeId::of::<T>();
        let type_name = std::any::type_name::<T>();

        if self.entries.contains_key(&type_id) {
            return Err(Error::DuplicateConfig {
                plugin: self.plugin_id.clone(),
                config: type_name.to_string(),
            });
        }

        self.entries.insert(
            type_id,
            ConfigEntry {
                type_name,
                value: Arc::new(config),
            },
        );
        self.order.push(type_id);
        Ok(())
    }

    /// 설정 객체 조회 - 등록되지 않았으면 Missing-config
    pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        self.try_get::<T>().ok_or_else(|| Error::MissingConfig {
            plugin: self.plugin_id.clone(),
            module: None,
            config: std::any::type_name::<T>().to_string(),
        })
    }

    /// 설정 객체 조회 (없으면 None)
    pub fn try_get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| Arc::clone(&entry.value).downcast::<T>().ok())
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// 등록된 설정 타입 이름 (등록 순)
    pub fn type_names(&self) -> Vec<&'static str> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .map(|entry| entry.type_name)
            .collect()
    }

    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ConfigSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigSet")
            .field("plugin_id", &self.plugin_id)
            .field("types", &self.type_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct QueueConfig {
        name: String,
    }

    #[derive(Debug)]
    struct RetryConfig;

    #[test]
    fn test_add_and_get() {
        let mut configs = ConfigSet::new("orders");
        configs
            .add(QueueConfig {
                name: "orders.in".into(),
            })
            .unwrap();

        let queue = configs.get::<QueueConfig>().unwrap();
        assert_eq!(queue.name, "orders.in");
        assert!(configs.contains::<QueueConfig>());
        assert!(configs.try_get::<RetryConfig>().is_none());
    }

    #[test]
    fn test_duplicate_config_is_rejected() {
        let mut configs = ConfigSet::new("orders");
        configs.add(QueueConfig { name: "a".into() }).unwrap();

        let err = configs.add(QueueConfig { name: "b".into() }).unwrap_err();
        assert!(matches!(err, Error::DuplicateConfig { ref plugin, .. } if plugin == "orders"));

        // 첫 번째 값은 그대로 유지
        assert_eq!(configs.get::<QueueConfig>().unwrap().name, "a");
        assert_eq!(configs.len(), 1);
    }

    #[test]
    fn test_missing_config_is_deterministic() {
        let configs = ConfigSet::new("orders");

        for _ in 0..3 {
            let err = configs.get::<RetryConfig>().unwrap_err();
            match err {
                Error::MissingConfig {
                    plugin,
                    module,
                    config,
                } => {
                    assert_eq!(plugin, "orders");
                    assert_eq!(module, None);
                    assert!(config.ends_with("RetryConfig"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_type_names_keep_registration_order() {
        let mut configs = ConfigSet::new("orders");
        configs.add(RetryConfig).unwrap();
        configs.add(QueueConfig { name: "q".into() }).unwrap();

        let names = configs.type_names();
        assert!(names[0].ends_with("RetryConfig"));
        assert!(names[1].ends_with("QueueConfig"));
    }
}
