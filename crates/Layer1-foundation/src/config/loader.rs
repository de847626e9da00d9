//! Settings Loader - 레이어별 설정 파일 병합
//!
//! 레이어 (뒤쪽이 앞쪽을 덮어씀):
//!
//! 1. [`SettingsLayer::User`] - `~/.keystone/settings.json`
//! 2. [`SettingsLayer::Project`] - `.keystone/settings.json`
//! 3. [`SettingsLayer::Local`] - `.keystone/settings.local.json` (gitignored)
//!
//! `.toml` 확장자 파일은 TOML로, 나머지는 주석을 허용하는 JSON으로 읽는다.
//! 없는 레이어는 건너뛰고, 읽을 수 없는 레이어는 경고 후 건너뛴다.

use super::Settings;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 설정 폴더 이름
pub const SETTINGS_DIR_NAME: &str = ".keystone";

const SETTINGS_FILE: &str = "settings.json";
const LOCAL_SETTINGS_FILE: &str = "settings.local.json";

// ============================================================================
// SettingsLayer
// ============================================================================

/// 설정 레이어
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsLayer {
    User,
    Project,
    Local,

    /// `with_paths`로 지정된 n번째 파일
    Explicit(usize),
}

impl std::fmt::Display for SettingsLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Project => write!(f, "project"),
            Self::Local => write!(f, "local"),
            Self::Explicit(idx) => write!(f, "explicit#{}", idx),
        }
    }
}

// ============================================================================
// SettingsLoader
// ============================================================================

/// 레이어 설정 로더
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    /// 낮은 우선순위부터
    layers: Vec<(SettingsLayer, PathBuf)>,
}

impl SettingsLoader {
    /// user / project / local 레이어
    ///
    /// 홈 디렉터리를 알 수 없으면 user 레이어는 없다.
    pub fn new(working_dir: &Path) -> Self {
        let project_dir = working_dir.join(SETTINGS_DIR_NAME);
        let user = dirs::home_dir()
            .map(|home| (SettingsLayer::User, home.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE)));

        let layers = user
            .into_iter()
            .chain([
                (SettingsLayer::Project, project_dir.join(SETTINGS_FILE)),
                (SettingsLayer::Local, project_dir.join(LOCAL_SETTINGS_FILE)),
            ])
            .collect();

        Self { layers }
    }

    /// 명시된 파일들을 순서대로 레이어로 사용
    pub fn with_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let layers = paths
            .into_iter()
            .enumerate()
            .map(|(idx, path)| (SettingsLayer::Explicit(idx), path))
            .collect();
        Self { layers }
    }

    /// 모든 레이어 (낮은 우선순위부터)
    pub fn layers(&self) -> impl Iterator<Item = (SettingsLayer, &Path)> {
        self.layers.iter().map(|(layer, path)| (*layer, path.as_path()))
    }

    /// 파일이 존재하는 레이어
    pub fn present_layers(&self) -> Vec<SettingsLayer> {
        self.layers()
            .filter(|(_, path)| path.is_file())
            .map(|(layer, _)| layer)
            .collect()
    }

    /// 존재하는 레이어를 모두 읽어 병합
    pub fn load_all(&self) -> Result<Settings> {
        let merged = self
            .layers()
            .filter(|(_, path)| path.is_file())
            .fold(Settings::new(), |merged, (layer, path)| {
                match load_settings_from_file(path) {
                    Ok(settings) => {
                        info!(layer = %layer, path = %path.display(), "Settings layer loaded");
                        merged.merge(settings)
                    }
                    Err(err) => {
                        warn!(
                            layer = %layer,
                            path = %path.display(),
                            error = %err,
                            "Skipping unreadable settings layer"
                        );
                        merged
                    }
                }
            });

        Ok(merged)
    }

    /// 특정 파일만 로드 (파일이 없으면 에러)
    pub fn load_from(&self, path: &Path) -> Result<Settings> {
        if !path.is_file() {
            return Err(Error::Config(format!(
                "settings file not found: {}",
                path.display()
            )));
        }
        load_settings_from_file(path)
    }
}

// ============================================================================
// 유틸리티 함수
// ============================================================================

/// 파일에서 설정 로드
pub fn load_settings_from_file(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;

    let is_toml = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    let settings = if is_toml {
        Settings::from_toml_str(&content).map_err(|e| {
            Error::Config(format!("Invalid settings at {}: {}", path.display(), e))
        })?
    } else {
        let content = strip_json_comments(&content);
        Settings::from_json_str(&content).map_err(|e| {
            Error::Config(format!("Invalid settings at {}: {}", path.display(), e))
        })?
    };

    debug!("Loaded settings from {}", path.display());

    Ok(settings)
}

/// JSON 주석 제거 (// 및 /* */)
pub fn strip_json_comments(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape_next = false;

    while let Some(c) = chars.next() {
        if escape_next {
            output.push(c);
            escape_next = false;
            continue;
        }

        if c == '\\' && in_string {
            output.push(c);
            escape_next = true;
            continue;
        }

        if c == '"' {
            in_string = !in_string;
            output.push(c);
            continue;
        }

        if !in_string && c == '/' {
            match chars.peek() {
                Some('/') => {
                    // 라인 주석 스킵
                    for c in chars.by_ref() {
                        if c == '\n' {
                            output.push(c);
                            break;
                        }
                    }
                    continue;
                }
                Some('*') => {
                    // 블록 주석 스킵
                    chars.next();
                    while let Some(c) = chars.next() {
                        if c == '*' && chars.peek() == Some(&'/') {
                            chars.next();
                            break;
                        }
                    }
                    continue;
                }
                _ => {}
            }
        }

        output.push(c);
    }

    output
}
