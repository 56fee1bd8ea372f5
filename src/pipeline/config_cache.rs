use serde::Serialize;
use std::path::{Path, PathBuf};

use super::BuildMode;

pub const CACHE_FILE_NAME: &str = "CMakeCache.txt";

pub fn cache_file(build_dir: &Path) -> PathBuf {
    build_dir.join(CACHE_FILE_NAME)
}

/// What an existing configuration cache says about the build it configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheState {
    /// `CMAKE_BUILD_TYPE`; `None` when unset or empty (multi-config generators).
    pub build_type: Option<String>,
    pub coverage_enabled: bool,
}

impl CacheState {
    /// Parses `KEY:TYPE=VALUE` lines of a CMake cache.
    pub fn parse(content: &str, coverage_option: &str) -> Self {
        let mut state = CacheState::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
                continue;
            }
            let Some((key_and_type, value)) = line.split_once('=') else {
                continue;
            };
            let key = key_and_type.split(':').next().unwrap_or(key_and_type);
            if key == "CMAKE_BUILD_TYPE" {
                let value = value.trim();
                state.build_type = (!value.is_empty()).then(|| value.to_string());
            } else if key == coverage_option {
                state.coverage_enabled = is_cmake_true(value.trim());
            }
        }
        state
    }

    /// Whether a build in `mode`, with or without coverage instrumentation,
    /// can reuse this cache.
    ///
    /// A cache without a build type only fits a multi-config generator, which
    /// picks the mode at build time.
    pub fn is_compatible(&self, mode: BuildMode, coverage: bool, multi_config: bool) -> bool {
        if self.coverage_enabled != coverage {
            return false;
        }
        match &self.build_type {
            None => multi_config,
            Some(build_type) => BuildMode::from_cmake(build_type) == Some(mode),
        }
    }
}

fn is_cmake_true(value: &str) -> bool {
    matches!(value.to_ascii_uppercase().as_str(), "ON" | "TRUE" | "YES" | "Y" | "1")
}

/// Reads the cache in `build_dir`. `Ok(None)` when the build is unconfigured.
pub fn load(build_dir: &Path, coverage_option: &str) -> Result<Option<CacheState>, std::io::Error> {
    let path = cache_file(build_dir);
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)?;
    let state = CacheState::parse(&content, coverage_option);
    log::debug!("Configuration cache {:?}: {:?}", path, state);
    Ok(Some(state))
}
