//! Type Catalog - 스캔된 타입 레코드와 가시성 뷰

use super::descriptor::{ContractId, TypeDescriptor};
use crate::plugin::PluginClass;
use std::sync::Arc;

/// 다른 플러그인의 타입을 가리키는 비소유 참조
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub plugin: String,
    pub name: String,
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.plugin)
    }
}

// ============================================================================
// PluginType - 발견된 타입 하나
// ============================================================================

/// 발견된 타입 레코드
#[derive(Debug, Clone)]
pub struct PluginType {
    owner: String,
    owner_class: PluginClass,
    descriptor: TypeDescriptor,

    pub(crate) is_known_type_contract: bool,
    pub(crate) is_known_type_implementation: bool,

    /// 구현으로 인정된 contract 목록
    pub(crate) satisfies: Vec<ContractId>,

    /// 이 구현이 만족시키는 contract를 선언한 플러그인들
    pub(crate) discovered_by: Vec<String>,

    /// contract인 경우: 바인딩된 구현 목록
    pub(crate) implementations: Vec<TypeRef>,
}

impl PluginType {
    pub(crate) fn new(owner: &str, owner_class: PluginClass, descriptor: TypeDescriptor) -> Self {
        let is_contract = descriptor.is_contract();
        Self {
            owner: owner.to_string(),
            owner_class,
            descriptor,
            is_known_type_contract: is_contract,
            is_known_type_implementation: false,
            satisfies: Vec::new(),
            discovered_by: Vec::new(),
            implementations: Vec::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn owner_class(&self) -> PluginClass {
        self.owner_class
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn is_known_type_contract(&self) -> bool {
        self.is_known_type_contract
    }

    pub fn is_known_type_implementation(&self) -> bool {
        self.is_known_type_implementation
    }

    pub fn satisfies(&self) -> &[ContractId] {
        &self.satisfies
    }

    pub fn discovered_by(&self) -> &[String] {
        &self.discovered_by
    }

    pub fn implementations(&self) -> &[TypeRef] {
        &self.implementations
    }

    pub fn type_ref(&self) -> TypeRef {
        TypeRef {
            plugin: self.owner.clone(),
            name: self.name().to_string(),
        }
    }
}

// ============================================================================
// TypeCatalog - 컴포지션 전체 타입 목록 (해석 후 불변)
// ============================================================================

/// 플러그인 하나가 소유한 타입들
#[derive(Debug, Clone)]
pub struct PluginTypes {
    pub plugin_id: String,
    pub classification: PluginClass,
    pub types: Vec<PluginType>,
}

/// 스캔 결과 전체
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    pub(crate) plugins: Vec<PluginTypes>,
}

impl TypeCatalog {
    /// 플러그인 등록 순서대로
    pub fn plugins(&self) -> &[PluginTypes] {
        &self.plugins
    }

    /// 특정 플러그인이 소유한 타입
    pub fn types_of(&self, plugin_id: &str) -> &[PluginType] {
        self.plugins
            .iter()
            .find(|p| p.plugin_id == plugin_id)
            .map(|p| p.types.as_slice())
            .unwrap_or(&[])
    }

    /// 모든 타입
    pub fn iter(&self) -> impl Iterator<Item = &PluginType> {
        self.plugins.iter().flat_map(|p| p.types.iter())
    }

    /// 이름으로 조회
    pub fn find(&self, name: &str) -> Option<&PluginType> {
        self.iter().find(|t| t.name() == name)
    }

    /// contract 레코드 조회
    pub fn contract(&self, id: &ContractId) -> Option<&PluginType> {
        self.iter()
            .find(|t| t.is_known_type_contract && t.name() == id.as_str())
    }

    pub fn len(&self) -> usize {
        self.plugins.iter().map(|p| p.types.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn find_mut(&mut self, type_ref: &TypeRef) -> Option<&mut PluginType> {
        self.plugins
            .iter_mut()
            .filter(|p| p.plugin_id == type_ref.plugin)
            .flat_map(|p| p.types.iter_mut())
            .find(|t| t.name() == type_ref.name)
    }
}

// ============================================================================
// TypeView - 모듈에게 보이는 타입 범위
// ============================================================================

/// 가시성 범위
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// 컴포지션 전체 (Core 플러그인 모듈)
    Composition,

    /// App + Host 플러그인 소유 타입만
    Application,
}

impl Visibility {
    /// 플러그인 분류에 따른 기본 가시성
    pub fn for_class(class: PluginClass) -> Self {
        match class {
            PluginClass::Core => Self::Composition,
            PluginClass::App | PluginClass::Host => Self::Application,
        }
    }

    pub fn admits(&self, owner_class: PluginClass) -> bool {
        match self {
            Self::Composition => true,
            Self::Application => owner_class.is_application_side(),
        }
    }
}

/// 가시성이 적용된 읽기 전용 타입 뷰
#[derive(Debug, Clone)]
pub struct TypeView {
    catalog: Arc<TypeCatalog>,
    visibility: Visibility,
}

impl TypeView {
    pub fn new(catalog: Arc<TypeCatalog>, visibility: Visibility) -> Self {
        Self {
            catalog,
            visibility,
        }
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    /// 보이는 모든 타입
    pub fn types(&self) -> impl Iterator<Item = &PluginType> {
        let visibility = self.visibility;
        self.catalog
            .iter()
            .filter(move |t| visibility.admits(t.owner_class()))
    }

    /// 보이는 contract
    pub fn contracts(&self) -> impl Iterator<Item = &PluginType> {
        self.types().filter(|t| t.is_known_type_contract())
    }

    /// 보이는 known-type implementation
    pub fn implementations(&self) -> impl Iterator<Item = &PluginType> {
        self.types().filter(|t| t.is_known_type_implementation())
    }

    /// 특정 contract의 구현 중 이 뷰에 보이는 것
    pub fn implementations_of<'a>(
        &'a self,
        contract: &'a ContractId,
    ) -> impl Iterator<Item = &'a PluginType> + 'a {
        self.implementations()
            .filter(move |t| t.satisfies().contains(contract))
    }

    pub fn find(&self, name: &str) -> Option<&PluginType> {
        self.types().find(|t| t.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.types().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
