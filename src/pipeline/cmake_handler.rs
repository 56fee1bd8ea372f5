use std::path::{Path, PathBuf};

use super::{BuildConfiguration, ToolchainHandler};
use crate::utils::command_runner::Invocation;

/// Builds the cmake/ctest command lines for the native library.
pub struct CMakeHandler;

impl ToolchainHandler for CMakeHandler {
    fn toolchain_name(&self) -> &'static str {
        "CMake"
    }

    fn detect(&self, project_root: &Path) -> bool {
        project_root.join("CMakeLists.txt").exists()
    }
}

impl CMakeHandler {
    pub fn new() -> Self {
        CMakeHandler
    }

    /// `cmake -S <root> -B <build> -DCMAKE_BUILD_TYPE=<mode> ...`
    ///
    /// `coverage_option` is switched ON when given. Operator-supplied args go
    /// last so they can override anything before them.
    pub fn configure(
        &self,
        project_root: &Path,
        config: &BuildConfiguration,
        coverage_option: Option<&str>,
        toolchain_file: Option<&Path>,
    ) -> Invocation {
        let mut inv = Invocation::new("cmake")
            .arg("-S")
            .arg(project_root.to_string_lossy())
            .arg("-B")
            .arg(config.build_dir().to_string_lossy())
            .arg(format!("-DCMAKE_BUILD_TYPE={}", config.mode()));

        if let Some(option) = coverage_option {
            inv = inv.arg(format!("-D{}=ON", option));
        }
        if let Some(file) = toolchain_file {
            inv = inv.arg(format!("-DCMAKE_TOOLCHAIN_FILE={}", file.to_string_lossy()));
        }
        inv.args(config.extra_toolchain_args().iter().cloned())
            .current_dir(project_root)
    }

    /// `cmake --build <build> --config <mode>`, honouring `--target` and `--jobs`.
    pub fn build(&self, config: &BuildConfiguration) -> Invocation {
        let mut inv = self.build_base(config);
        if let Some(target) = config.target() {
            inv = inv.arg("--target").arg(target);
        }
        if let Some(jobs) = config.jobs() {
            inv = inv.arg("--parallel").arg(jobs.to_string());
        }
        inv
    }

    /// Builds one named target, e.g. the coverage report or the docs.
    pub fn build_target(&self, config: &BuildConfiguration, target: &str) -> Invocation {
        self.build_base(config).arg("--target").arg(target)
    }

    pub fn test(&self, config: &BuildConfiguration) -> Invocation {
        Invocation::new("ctest")
            .arg("--output-on-failure")
            .arg("--test-dir")
            .arg(config.build_dir().to_string_lossy())
            .arg("-C")
            .arg(config.mode().as_str())
    }

    /// Without `--install-prefix` the prefix recorded at configure time is used.
    pub fn install(&self, config: &BuildConfiguration) -> Invocation {
        let inv = Invocation::new("cmake")
            .arg("--install")
            .arg(config.build_dir().to_string_lossy())
            .arg("--config")
            .arg(config.mode().as_str());
        match config.install_prefix() {
            Some(prefix) => inv.arg("--prefix").arg(prefix.to_string_lossy()),
            None => inv,
        }
    }

    fn build_base(&self, config: &BuildConfiguration) -> Invocation {
        Invocation::new("cmake")
            .arg("--build")
            .arg(config.build_dir().to_string_lossy())
            .arg("--config")
            .arg(config.mode().as_str())
    }
}

/// The dependency manager's CMake toolchain file, if its root is known and
/// the file is actually there.
pub fn toolchain_integration_file(toolchain_root: Option<&Path>, relative: &Path) -> Option<PathBuf> {
    let root = toolchain_root?;
    let file = root.join(relative);
    if file.is_file() {
        log::debug!("Using toolchain file {:?}", file);
        Some(file)
    } else {
        log::debug!("Toolchain file {:?} not found; configuring without it.", file);
        None
    }
}

/// Same as [`toolchain_integration_file`], with the root read from `variable`.
pub fn toolchain_integration_from_env(variable: &str, relative: &Path) -> Option<PathBuf> {
    let root = std::env::var_os(variable).filter(|v| !v.is_empty()).map(PathBuf::from);
    toolchain_integration_file(root.as_deref(), relative)
}
