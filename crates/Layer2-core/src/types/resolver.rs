//! Known-Type Resolver - contract와 구현 타입의 교차 바인딩
//!
//! 바인딩은 `PluginType` 레코드의 메타데이터로만 기록된다.

use super::catalog::{TypeCatalog, TypeRef};
use super::descriptor::ContractId;
use std::collections::HashMap;
use tracing::{debug, info};

/// 바인딩 하나: 구현 → contract
struct Binding {
    implementation: TypeRef,
    contract: ContractId,
    contract_owner: String,
}

/// Known-type 해석기
pub struct KnownTypeResolver;

impl KnownTypeResolver {
    /// 모든 contract에 대해 구현 타입을 찾아 기록한다. 바인딩 수를 반환.
    pub fn resolve(catalog: &mut TypeCatalog) -> usize {
        let contracts: HashMap<ContractId, String> = catalog
            .iter()
            .filter_map(|t| {
                t.descriptor()
                    .contract_id()
                    .map(|id| (id, t.owner().to_string()))
            })
            .collect();

        let mut bindings = Vec::new();
        for ty in catalog.iter().filter(|t| t.descriptor().is_concrete()) {
            for contract in ty.descriptor().implements() {
                match contracts.get(contract) {
                    Some(owner) => bindings.push(Binding {
                        implementation: ty.type_ref(),
                        contract: contract.clone(),
                        contract_owner: owner.clone(),
                    }),
                    None => debug!(
                        type_name = %ty.name(),
                        contract = %contract,
                        "Contract is not declared by any plugin"
                    ),
                }
            }
        }

        let count = bindings.len();
        for binding in bindings {
            if let Some(implementation) = catalog.find_mut(&binding.implementation) {
                implementation.is_known_type_implementation = true;
                implementation.satisfies.push(binding.contract.clone());
                if !implementation
                    .discovered_by
                    .contains(&binding.contract_owner)
                {
                    implementation.discovered_by.push(binding.contract_owner.clone());
                }
            }

            let contract_ref = TypeRef {
                plugin: binding.contract_owner,
                name: binding.contract.as_str().to_string(),
            };
            if let Some(contract) = catalog.find_mut(&contract_ref) {
                contract.implementations.push(binding.implementation);
            }
        }

        info!(
            contracts = contracts.len(),
            bindings = count,
            "Known types resolved"
        );
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{Plugin, PluginManifest};
    use crate::types::{TypeDescriptor, TypeScanner};

    fn composition() -> Vec<Plugin> {
        vec![
            Plugin::new(PluginManifest::host("host", "Host")),
            Plugin::new(PluginManifest::core("messaging", "Messaging"))
                .with_type(TypeDescriptor::contract("messaging.Handler"))
                .with_type(
                    TypeDescriptor::concrete("messaging.DeadLetterHandler")
                        .implementing("messaging.Handler"),
                ),
            Plugin::new(PluginManifest::core("health", "Health"))
                .with_type(TypeDescriptor::contract("health.Check")),
            Plugin::new(PluginManifest::app("orders", "Orders"))
                .with_type(
                    TypeDescriptor::concrete("orders.PlacedHandler")
                        .implementing("messaging.Handler")
                        .implementing("health.Check"),
                )
                .with_type(
                    TypeDescriptor::abstract_type("orders.BaseHandler")
                        .implementing("messaging.Handler"),
                )
                .with_type(
                    TypeDescriptor::concrete("orders.Unbound").implementing("unknown.Contract"),
                ),
        ]
    }

    #[test]
    fn test_bindings_recorded_on_both_sides() {
        let mut catalog = TypeScanner::scan(&composition()).unwrap();
        let count = KnownTypeResolver::resolve(&mut catalog);
        assert_eq!(count, 3);

        let placed = catalog.find("orders.PlacedHandler").unwrap();
        assert!(placed.is_known_type_implementation());
        assert_eq!(placed.satisfies().len(), 2);
        assert_eq!(placed.discovered_by(), &["messaging".to_string(), "health".to_string()]);

        let handler = catalog.find("messaging.Handler").unwrap();
        let impls: Vec<_> = handler.implementations().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(impls, vec!["messaging.DeadLetterHandler", "orders.PlacedHandler"]);
    }

    #[test]
    fn test_abstract_and_unbound_are_not_implementations() {
        let mut catalog = TypeScanner::scan(&composition()).unwrap();
        KnownTypeResolver::resolve(&mut catalog);

        assert!(!catalog
            .find("orders.BaseHandler")
            .unwrap()
            .is_known_type_implementation());
        assert!(!catalog
            .find("orders.Unbound")
            .unwrap()
            .is_known_type_implementation());
    }
}
