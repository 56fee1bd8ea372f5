use std::path::Path;

use super::{BuildMode, ToolchainHandler};
use crate::project_config::ProjectSettings;
use crate::utils::command_runner::Invocation;

/// Builds the dotnet command lines for the managed binding.
pub struct DotnetHandler<'a> {
    settings: &'a ProjectSettings,
}

impl ToolchainHandler for DotnetHandler<'_> {
    fn toolchain_name(&self) -> &'static str {
        "dotnet"
    }

    fn detect(&self, project_root: &Path) -> bool {
        project_root.join(&self.settings.managed_test_project).exists()
    }
}

impl<'a> DotnetHandler<'a> {
    pub fn new(settings: &'a ProjectSettings) -> Self {
        DotnetHandler { settings }
    }

    /// Whether the managed benchmark project exists under `project_root`.
    pub fn has_benchmark_project(&self, project_root: &Path) -> bool {
        project_root.join(&self.settings.managed_bench_project).exists()
    }

    /// `dotnet test <project> --configuration <Debug|Release>`
    pub fn test(&self, project_root: &Path, mode: BuildMode) -> Invocation {
        Invocation::new("dotnet")
            .arg("test")
            .arg(project_root.join(&self.settings.managed_test_project).to_string_lossy())
            .arg("--configuration")
            .arg(mode.managed_configuration())
            .current_dir(project_root)
    }

    /// Benchmarks always run the Release configuration of the managed side.
    pub fn benchmark(&self, project_root: &Path) -> Invocation {
        Invocation::new("dotnet")
            .arg("run")
            .arg("--project")
            .arg(project_root.join(&self.settings.managed_bench_project).to_string_lossy())
            .arg("-c")
            .arg(BuildMode::optimized().managed_configuration())
            .arg("--")
            .arg("--filter")
            .arg(self.settings.managed_bench_filter.as_str())
            .current_dir(project_root)
    }
}
