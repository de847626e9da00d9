//! Plugin definition - 매니페스트 + 모듈 + 설정 + 노출 타입

use super::config::ConfigSet;
use super::manifest::{PluginClass, PluginManifest};
use super::traits::PluginModule;
use crate::context::ModuleContext;
use crate::types::TypeDescriptor;
use keystone_foundation::{Error, Result, Settings};
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::sync::{Arc, OnceLock};

// ============================================================================
// ModuleSlot - 플러그인 안의 모듈 하나
// ============================================================================

/// 모듈과 그 컨텍스트를 담는 슬롯
pub struct ModuleSlot {
    type_id: TypeId,
    type_name: &'static str,
    module: Box<dyn PluginModule>,

    /// build() 시 정확히 한 번 할당
    context: OnceLock<Arc<ModuleContext>>,
}

impl ModuleSlot {
    fn new<M: PluginModule + 'static>(module: M) -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            type_name: std::any::type_name::<M>(),
            module: Box::new(module),
            context: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.module.name()
    }

    /// 모듈 구체 타입 이름
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn module(&self) -> &dyn PluginModule {
        self.module.as_ref()
    }

    pub(crate) fn module_mut(&mut self) -> &mut Box<dyn PluginModule> {
        &mut self.module
    }

    /// 할당된 컨텍스트 (build 전에는 None)
    pub fn context(&self) -> Option<&Arc<ModuleContext>> {
        self.context.get()
    }

    /// 컨텍스트 할당 - 두 번째 할당은 `ContextAlreadyAssigned`
    pub(crate) fn assign_context(&self, context: ModuleContext) -> Result<()> {
        let plugin = context.plugin_id().to_string();
        self.context
            .set(Arc::new(context))
            .map_err(|_| Error::ContextAlreadyAssigned {
                plugin,
                module: self.name().to_string(),
            })
    }
}

impl std::fmt::Debug for ModuleSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleSlot")
            .field("name", &self.name())
            .field("type_name", &self.type_name)
            .field("has_context", &self.context.get().is_some())
            .finish()
    }
}

// ============================================================================
// Plugin
// ============================================================================

/// 플러그인 정의
///
/// 모듈과 설정은 플러그인 생성 시점에 선언되며 build 이후에는 변경되지 않는다.
///
/// ```ignore
/// let plugin = Plugin::new(PluginManifest::app("orders", "Orders"))
///     .with_config(OrdersConfig::default())?
///     .with_module(OrdersModule::new())?
///     .with_type(TypeDescriptor::concrete("orders.PlacedHandler").implementing("messaging.Handler"));
/// ```
pub struct Plugin {
    manifest: PluginManifest,

    /// 선언 순서 유지 (Start 순서 = 선언 순서)
    slots: Vec<ModuleSlot>,

    configs: Arc<ConfigSet>,

    /// 플러그인 수준 노출 타입
    types: Vec<TypeDescriptor>,
}

impl Plugin {
    pub fn new(manifest: PluginManifest) -> Self {
        let configs = Arc::new(ConfigSet::new(manifest.id.clone()));
        Self {
            manifest,
            slots: Vec::new(),
            configs,
            types: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    pub fn classification(&self) -> PluginClass {
        self.manifest.classification
    }

    pub fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    // ========================================================================
    // 모듈
    // ========================================================================

    /// 모듈 추가
    ///
    /// 같은 구체 타입을 두 번 추가하면 Duplicate-module.
    /// 모듈 이름은 이벤트, 에러, 컴포지트 로그의 키이므로 플러그인 안에서 고유해야 한다.
    pub fn add_module<M: PluginModule + 'static>(&mut self, module: M) -> Result<()> {
        let type_id = TypeId::of::<M>();
        if self.slots.iter().any(|slot| slot.type_id == type_id) {
            return Err(Error::DuplicateModule {
                plugin: self.manifest.id.clone(),
                module: std::any::type_name::<M>().to_string(),
            });
        }
        if self.slots.iter().any(|slot| slot.name() == module.name()) {
            return Err(Error::DuplicateModuleName {
                plugin: self.manifest.id.clone(),
                name: module.name().to_string(),
            });
        }

        self.slots.push(ModuleSlot::new(module));
        Ok(())
    }

    /// 빌더 패턴: 모듈 추가
    pub fn with_module<M: PluginModule + 'static>(mut self, module: M) -> Result<Self> {
        self.add_module(module)?;
        Ok(self)
    }

    pub fn slots(&self) -> &[ModuleSlot] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [ModuleSlot] {
        &mut self.slots
    }

    pub fn module_count(&self) -> usize {
        self.slots.len()
    }

    // ========================================================================
    // 설정
    // ========================================================================

    /// 설정 객체 추가 - 같은 구체 타입을 두 번 추가하면 Duplicate-config
    pub fn add_config<T: Any + Send + Sync>(&mut self, config: T) -> Result<()> {
        Arc::make_mut(&mut self.configs).add(config)
    }

    /// 빌더 패턴: 설정 객체 추가
    pub fn with_config<T: Any + Send + Sync>(mut self, config: T) -> Result<Self> {
        self.add_config(config)?;
        Ok(self)
    }

    /// 외부 설정의 섹션을 바인딩해 설정 객체로 추가
    pub fn bind_config<T>(&mut self, settings: &Settings, path: &str) -> Result<()>
    where
        T: DeserializeOwned + Any + Send + Sync,
    {
        let config: T = settings.bind(path)?;
        self.add_config(config)
    }

    pub fn configs(&self) -> &Arc<ConfigSet> {
        &self.configs
    }

    // ========================================================================
    // 노출 타입
    // ========================================================================

    /// 빌더 패턴: 플러그인 수준 노출 타입 추가
    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.push(descriptor);
        self
    }

    pub fn exposed_types(&self) -> &[TypeDescriptor] {
        &self.types
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("id", &self.manifest.id)
            .field("classification", &self.manifest.classification)
            .field("modules", &self.slots)
            .field("configs", &self.configs.len())
            .field("types", &self.types.len())
            .finish()
    }
}
