//! # keystone-foundation
//!
//! Foundation layer for Keystone:
//! - Error: 컴포지션/라이프사이클 에러 분류 (Duplicate-module, Missing-config, Multiple-host 등)
//! - Config: 외부 설정 제공자 (Settings, AttributeBag, SettingsLoader)
//!
//! 상위 레이어(`keystone-core`)는 이 크레이트의 `Error`/`Result`만 사용합니다.

pub mod config;
pub mod error;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, ModuleFailure, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    load_settings_from_file, strip_json_comments, AttributeBag, Settings, SettingsLayer,
    SettingsLoader, SETTINGS_DIR_NAME,
};
