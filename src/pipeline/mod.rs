//! The `pipeline` module contains the core logic for sequencing the native
//! (CMake) and managed (dotnet) toolchains: which phases an action needs, how
//! each toolchain is invoked, and how the configuration cache is judged.

pub mod cmake_handler;
pub mod config_cache;
pub mod dotnet_handler;
pub mod phase_controller;

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Optimization/instrumentation profile of a native build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
pub enum BuildMode {
    #[value(name = "Debug")]
    Debug,
    #[value(name = "Release")]
    Release,
    #[value(name = "RelWithDebInfo")]
    RelWithDebInfo,
    #[value(name = "MinSizeRel")]
    MinSizeRel,
}

impl BuildMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Debug => "Debug",
            BuildMode::Release => "Release",
            BuildMode::RelWithDebInfo => "RelWithDebInfo",
            BuildMode::MinSizeRel => "MinSizeRel",
        }
    }

    /// Parses a `CMAKE_BUILD_TYPE` value. CMake compares these case-insensitively.
    pub fn from_cmake(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "debug" => Some(BuildMode::Debug),
            "release" => Some(BuildMode::Release),
            "relwithdebinfo" => Some(BuildMode::RelWithDebInfo),
            "minsizerel" => Some(BuildMode::MinSizeRel),
            _ => None,
        }
    }

    /// The mode coverage instrumentation needs.
    pub fn instrumented() -> Self {
        BuildMode::Debug
    }

    /// The mode benchmarks need.
    pub fn optimized() -> Self {
        BuildMode::Release
    }

    /// dotnet only knows Debug and Release.
    pub fn managed_configuration(&self) -> &'static str {
        match self {
            BuildMode::Debug => "Debug",
            BuildMode::Release | BuildMode::RelWithDebInfo | BuildMode::MinSizeRel => "Release",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the operator asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Clean,
    Configure,
    Build,
    Test,
    Coverage,
    #[value(alias = "bench")]
    Benchmark,
    Docs,
    Install,
    All,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Clean => "clean",
            Action::Configure => "configure",
            Action::Build => "build",
            Action::Test => "test",
            Action::Coverage => "coverage",
            Action::Benchmark => "benchmark",
            Action::Docs => "docs",
            Action::Install => "install",
            Action::All => "all",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One invocation's unit of work. Built once from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionRequest {
    action: Action,
    requested_mode: BuildMode,
}

impl ActionRequest {
    pub fn new(action: Action, requested_mode: BuildMode) -> Self {
        ActionRequest { action, requested_mode }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn requested_mode(&self) -> BuildMode {
        self.requested_mode
    }
}

/// Operator-supplied knobs that do not depend on the effective mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub build_dir: PathBuf,
    pub extra_toolchain_args: Vec<String>,
    pub target: Option<String>,
    pub jobs: Option<u32>,
    pub install_prefix: Option<PathBuf>,
}

/// Settings of the native build for this invocation, with the effective mode.
/// Never changes once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfiguration {
    mode: BuildMode,
    options: BuildOptions,
}

impl BuildConfiguration {
    pub fn new(mode: BuildMode, options: BuildOptions) -> Self {
        BuildConfiguration { mode, options }
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn build_dir(&self) -> &Path {
        &self.options.build_dir
    }

    pub fn extra_toolchain_args(&self) -> &[String] {
        &self.options.extra_toolchain_args
    }

    pub fn target(&self) -> Option<&str> {
        self.options.target.as_deref()
    }

    pub fn jobs(&self) -> Option<u32> {
        self.options.jobs
    }

    pub fn install_prefix(&self) -> Option<&Path> {
        self.options.install_prefix.as_deref()
    }
}

/// A toolchain the pipeline drives (CMake for the native library, dotnet for
/// the managed binding).
///
/// Phases call `detect` before handing work to a toolchain, so a project that
/// lacks the toolchain's inputs fails with a detection error instead of an
/// opaque tool exit code.
pub trait ToolchainHandler {
    /// Returns the human-readable name of the toolchain.
    ///
    /// # Returns
    /// A static name such as "CMake", used in log and error messages.
    fn toolchain_name(&self) -> &'static str;

    /// Detects if the project at the given path has what this toolchain needs.
    ///
    /// # Arguments
    /// * `project_root` - The root directory of the project.
    ///
    /// # Returns
    /// `true` if the toolchain's project files are present, `false` otherwise.
    fn detect(&self, project_root: &Path) -> bool;
}
