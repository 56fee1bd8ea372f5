use std::path::{Path, PathBuf};

use super::Platform;
use crate::pipeline::BuildMode;

/// Where inside the build directory the native library lands and what it is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    pub library_name: String,
    pub output_subdir: PathBuf,
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        ArtifactLayout {
            library_name: "Yini".to_string(),
            output_subdir: PathBuf::from("src"),
        }
    }
}

pub fn shared_library_extension(platform: Platform) -> Option<&'static str> {
    match platform {
        Platform::Linux => Some("so"),
        Platform::MacOs => Some("dylib"),
        Platform::Windows => Some("dll"),
        Platform::Unrecognized => None,
    }
}

/// Path of the compiled native shared library.
///
/// Pure: the same inputs always give the same path, and nothing is checked on
/// disk. Returns `None` for an unrecognized platform.
pub fn resolve_artifact_path(
    build_dir: &Path,
    platform: Platform,
    mode: BuildMode,
    layout: &ArtifactLayout,
) -> Option<PathBuf> {
    let extension = shared_library_extension(platform)?;
    let file_name = match platform {
        Platform::Windows => format!("{}.{}", layout.library_name, extension),
        _ => format!("lib{}.{}", layout.library_name, extension),
    };

    let mut path = build_dir.join(&layout.output_subdir);
    if platform.is_multi_config() {
        path.push(mode.as_str());
    }
    path.push(file_name);
    Some(path)
}

/// Path of a native executable built at `relative` (extension-less) inside the
/// build directory, following the same per-platform conventions.
pub fn resolve_executable_path(
    build_dir: &Path,
    platform: Platform,
    mode: BuildMode,
    relative: &Path,
) -> Option<PathBuf> {
    let file_name = relative.file_name()?.to_string_lossy().into_owned();
    let mut path = build_dir.to_path_buf();
    if let Some(parent) = relative.parent() {
        path.push(parent);
    }
    match platform {
        Platform::Linux | Platform::MacOs => path.push(file_name),
        Platform::Windows => {
            path.push(mode.as_str());
            path.push(format!("{}.exe", file_name));
        }
        Platform::Unrecognized => return None,
    }
    Some(path)
}
