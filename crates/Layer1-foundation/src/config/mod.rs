//! Config - 외부 설정 제공자
//!
//! - `attributes.rs` - 타입 지정 접근자를 가진 키/값 속성 모음
//! - `settings.rs` - 계층형 설정 트리와 섹션 바인딩
//! - `loader.rs` - 레벨별 설정 파일 로드/병합

mod attributes;
mod loader;
mod settings;

pub use attributes::AttributeBag;
pub use loader::{
    load_settings_from_file, strip_json_comments, SettingsLayer, SettingsLoader, SETTINGS_DIR_NAME,
};
pub use settings::Settings;
