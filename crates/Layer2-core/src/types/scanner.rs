//! Type Scanner - 플러그인 분류 검증 및 노출 타입 수집
//!
//! 컴포지션 시 한 번만 실행되며 결과는 이후 변경되지 않는다.

use super::catalog::{PluginType, PluginTypes, TypeCatalog};
use crate::plugin::{Plugin, PluginClass};
use crate::registry::NameRegistry;
use keystone_foundation::{Error, Result};
use tracing::{debug, info};

/// 타입 스캐너
pub struct TypeScanner;

impl TypeScanner {
    /// 정확히 하나의 Host 플러그인이 있는지 검사
    pub fn classify(plugins: &[Plugin]) -> Result<()> {
        let mut host: Option<&str> = None;

        for plugin in plugins {
            if plugin.classification() != PluginClass::Host {
                continue;
            }
            if let Some(existing) = host {
                return Err(Error::MultipleHost {
                    existing: existing.to_string(),
                    rejected: plugin.id().to_string(),
                });
            }
            host = Some(plugin.id());
        }

        if host.is_none() {
            return Err(Error::MissingHost);
        }
        Ok(())
    }

    /// 모든 플러그인의 노출 타입을 수집
    ///
    /// 타입 이름은 컴포지션 전체에서 유일해야 한다.
    pub fn scan(plugins: &[Plugin]) -> Result<TypeCatalog> {
        Self::classify(plugins)?;

        let mut names: NameRegistry<()> = NameRegistry::new("type");
        let mut catalog = TypeCatalog::default();

        for plugin in plugins {
            let mut types = Vec::new();

            let module_types = plugin
                .slots()
                .iter()
                .flat_map(|slot| slot.module().exposed_types());

            for descriptor in plugin.exposed_types().iter().cloned().chain(module_types) {
                names.claim(descriptor.name(), plugin.id(), ())?;
                debug!(
                    plugin = %plugin.id(),
                    type_name = %descriptor.name(),
                    contract = descriptor.is_contract(),
                    "Discovered type"
                );
                types.push(PluginType::new(plugin.id(), plugin.classification(), descriptor));
            }

            catalog.plugins.push(PluginTypes {
                plugin_id: plugin.id().to_string(),
                classification: plugin.classification(),
                types,
            });
        }

        info!(
            plugins = catalog.plugins.len(),
            types = catalog.len(),
            "Type scan complete"
        );
        Ok(catalog)
    }
}
