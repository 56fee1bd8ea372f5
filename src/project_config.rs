//! Project layout settings, optionally read from `yini-build.toml` at the
//! project root. Every key has a default matching the YINI repository, so the
//! file only needs the keys a project wants to change.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::platform::artifact::ArtifactLayout;
use crate::Error;

pub const SETTINGS_FILE_NAME: &str = "yini-build.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectSettings {
    /// Build output directory, relative to the project root.
    pub build_dir: PathBuf,
    /// Base name of the native shared library (without prefix or extension).
    pub library_name: String,
    /// Directory inside the build directory that holds the shared library.
    pub library_subdir: PathBuf,
    /// CMake option switched on for coverage builds.
    pub coverage_option: String,
    /// CMake target that runs the tests and writes the coverage report.
    pub coverage_target: String,
    pub docs_target: String,
    /// Native benchmark executable, relative to the build directory, without extension.
    pub native_bench_executable: PathBuf,
    pub managed_test_project: PathBuf,
    pub managed_bench_project: PathBuf,
    pub managed_bench_filter: String,
    /// Environment variable naming the dependency manager root.
    pub toolchain_root_var: String,
    /// Toolchain file relative to that root.
    pub toolchain_file: PathBuf,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        ProjectSettings {
            build_dir: PathBuf::from("build"),
            library_name: "Yini".to_string(),
            library_subdir: PathBuf::from("src"),
            coverage_option: "YINI_ENABLE_COVERAGE".to_string(),
            coverage_target: "coverage".to_string(),
            docs_target: "doc".to_string(),
            native_bench_executable: PathBuf::from("tests/yini_bench"),
            managed_test_project: PathBuf::from("csharp/Yini.Tests/Yini.Tests.csproj"),
            managed_bench_project: PathBuf::from("csharp/Yini.Tests"),
            managed_bench_filter: "*BindingBenchmarks*".to_string(),
            toolchain_root_var: "VCPKG_ROOT".to_string(),
            toolchain_file: PathBuf::from("scripts/buildsystems/vcpkg.cmake"),
        }
    }
}

impl ProjectSettings {
    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid project settings: {}", e)))
    }

    /// Reads `explicit` if given (it must exist), otherwise
    /// `<project_root>/yini-build.toml` if present, otherwise the defaults.
    pub fn load(project_root: &Path, explicit: Option<&Path>) -> Result<Self, Error> {
        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(Error::Config(format!("Settings file {:?} does not exist.", path)));
                }
                path.to_path_buf()
            }
            None => {
                let path = project_root.join(SETTINGS_FILE_NAME);
                if !path.is_file() {
                    log::debug!("No {} found, using default project settings.", SETTINGS_FILE_NAME);
                    return Ok(ProjectSettings::default());
                }
                path
            }
        };

        log::info!("Loading project settings from {:?}", path);
        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid project settings in {:?}: {}", path, e)))
    }

    pub fn artifact_layout(&self) -> ArtifactLayout {
        ArtifactLayout {
            library_name: self.library_name.clone(),
            output_subdir: self.library_subdir.clone(),
        }
    }
}
