//! Decides which phases an action needs and runs them one after another.
//!
//! Planning is a pure function of the request and the configuration cache, so
//! the mode overrides and reconfigure decisions can be inspected (and printed
//! with `--dry-run`) before anything is executed. Execution stops at the first
//! failing process and hands its exit code back unchanged.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use super::cmake_handler::CMakeHandler;
use super::config_cache::{self, CacheState};
use super::dotnet_handler::DotnetHandler;
use super::{Action, ActionRequest, BuildConfiguration, BuildMode, BuildOptions, ToolchainHandler};
use crate::platform::artifact::{resolve_artifact_path, resolve_executable_path, shared_library_extension};
use crate::platform::env_bridge::bridge_environment;
use crate::platform::Platform;
use crate::project_config::ProjectSettings;
use crate::utils::command_runner::{run_checked, CommandExecutor, FailureKind, Invocation};
use crate::utils::file_system;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Remove the build directory and stop.
    Clean,
    /// Delete and recreate the build directory before configuring.
    Reset,
    Configure,
    Build,
    NativeTest,
    ManagedTest,
    CoverageReport,
    NativeBenchmark,
    ManagedBenchmark,
    Docs,
    Install,
}

impl Phase {
    pub fn state(&self) -> PipelineState {
        match self {
            Phase::Clean => PipelineState::Cleaning,
            Phase::Reset | Phase::Configure => PipelineState::Configuring,
            Phase::Build => PipelineState::Building,
            Phase::NativeTest | Phase::ManagedTest => PipelineState::Testing,
            Phase::CoverageReport => PipelineState::CoverageRunning,
            Phase::NativeBenchmark | Phase::ManagedBenchmark => PipelineState::BenchmarkRunning,
            Phase::Docs => PipelineState::DocsGenerating,
            Phase::Install => PipelineState::Installing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Cleaning,
    Configuring,
    Building,
    Testing,
    CoverageRunning,
    BenchmarkRunning,
    DocsGenerating,
    Installing,
    Done,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A requested mode replaced because the action cannot produce a meaningful
/// result with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeOverride {
    pub from: BuildMode,
    pub to: BuildMode,
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    pub action: Action,
    pub requested_mode: BuildMode,
    pub effective_mode: BuildMode,
    pub mode_override: Option<ModeOverride>,
    /// Configure with coverage instrumentation.
    pub coverage: bool,
    pub phases: Vec<Phase>,
}

impl ExecutionPlan {
    pub fn runs(&self, phase: Phase) -> bool {
        self.phases.contains(&phase)
    }
}

fn override_mode(requested: BuildMode, required: BuildMode, reason: &'static str) -> (BuildMode, Option<ModeOverride>) {
    if requested == required {
        (requested, None)
    } else {
        (
            required,
            Some(ModeOverride {
                from: requested,
                to: required,
                reason,
            }),
        )
    }
}

/// Invocation facts, besides action and mode, that shape the plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanFlags {
    /// `--install-prefix` was given; `all` then ends with an install.
    pub install_prefix_given: bool,
    /// Extra configure arguments were given after `--`. They only take effect
    /// through a configure run, so an existing cache is configured again.
    pub configure_args_given: bool,
    /// The platform's generator picks the mode at build time.
    pub multi_config: bool,
}

impl PlanFlags {
    pub fn new(options: &BuildOptions, platform: Platform) -> Self {
        PlanFlags {
            install_prefix_given: options.install_prefix.is_some(),
            configure_args_given: !options.extra_toolchain_args.is_empty(),
            multi_config: platform.is_multi_config(),
        }
    }
}

/// Configure phases needed before building in `mode`. An incompatible cache is
/// never reused: the directory is reset first.
fn configure_phases(cache: Option<&CacheState>, mode: BuildMode, flags: PlanFlags, always: bool) -> Vec<Phase> {
    match cache {
        None => vec![Phase::Configure],
        Some(state) if !state.is_compatible(mode, false, flags.multi_config) => vec![Phase::Reset, Phase::Configure],
        Some(_) if always || flags.configure_args_given => vec![Phase::Configure],
        Some(_) => Vec::new(),
    }
}

fn after_configure(cache: Option<&CacheState>, mode: BuildMode, flags: PlanFlags, rest: &[Phase]) -> Vec<Phase> {
    let mut phases = configure_phases(cache, mode, flags, false);
    phases.extend_from_slice(rest);
    phases
}

/// Works out the phases for `request` given the current configuration cache.
pub fn plan(request: &ActionRequest, cache: Option<&CacheState>, flags: PlanFlags) -> ExecutionPlan {
    let action = request.action();
    let requested_mode = request.requested_mode();
    let (effective_mode, mode_override) = match action {
        Action::Coverage => override_mode(
            requested_mode,
            BuildMode::instrumented(),
            "coverage requires an instrumented Debug build",
        ),
        Action::Benchmark => override_mode(
            requested_mode,
            BuildMode::optimized(),
            "benchmarks must run against a fully optimized Release build",
        ),
        _ => (requested_mode, None),
    };

    let phases = match action {
        Action::Clean => vec![Phase::Clean],
        Action::Coverage => vec![Phase::Reset, Phase::Configure, Phase::Build, Phase::CoverageReport],
        Action::Configure => configure_phases(cache, effective_mode, flags, true),
        Action::Build => after_configure(cache, effective_mode, flags, &[Phase::Build]),
        Action::Test => after_configure(
            cache,
            effective_mode,
            flags,
            &[Phase::Build, Phase::NativeTest, Phase::ManagedTest],
        ),
        Action::Benchmark => after_configure(
            cache,
            effective_mode,
            flags,
            &[Phase::Build, Phase::NativeBenchmark, Phase::ManagedBenchmark],
        ),
        Action::Docs => after_configure(cache, effective_mode, flags, &[Phase::Docs]),
        Action::Install => after_configure(cache, effective_mode, flags, &[Phase::Build, Phase::Install]),
        Action::All => {
            let mut phases = after_configure(
                cache,
                effective_mode,
                flags,
                &[Phase::Build, Phase::NativeTest, Phase::ManagedTest, Phase::Docs],
            );
            if flags.install_prefix_given {
                phases.push(Phase::Install);
            }
            phases
        }
    };

    ExecutionPlan {
        action,
        requested_mode,
        effective_mode,
        mode_override,
        coverage: action == Action::Coverage,
        phases,
    }
}

/// Runs planned phases against the real (or a fake) command executor.
pub struct PhaseController<'a, E: CommandExecutor + ?Sized> {
    executor: &'a mut E,
    settings: &'a ProjectSettings,
    project_root: PathBuf,
    platform: Platform,
    toolchain_file: Option<PathBuf>,
    state: PipelineState,
}

impl<'a, E: CommandExecutor + ?Sized> PhaseController<'a, E> {
    pub fn new(executor: &'a mut E, settings: &'a ProjectSettings, project_root: PathBuf, platform: Platform) -> Self {
        PhaseController {
            executor,
            settings,
            project_root,
            platform,
            toolchain_file: None,
            state: PipelineState::Idle,
        }
    }

    /// CMake toolchain file injected into every configure.
    pub fn with_toolchain_file(mut self, toolchain_file: Option<PathBuf>) -> Self {
        self.toolchain_file = toolchain_file;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Reads the configuration cache and plans `request`. Mode overrides are
    /// logged here as warnings.
    pub fn plan(&self, request: &ActionRequest, options: &BuildOptions) -> Result<ExecutionPlan, Error> {
        let cache = config_cache::load(&options.build_dir, &self.settings.coverage_option)?;
        let flags = PlanFlags::new(options, self.platform);
        let plan = plan(request, cache.as_ref(), flags);

        if let Some(mode_override) = &plan.mode_override {
            log::warn!(
                "Warning: {} was requested with mode {}, but {}. Overriding mode to {}.",
                plan.action,
                mode_override.from,
                mode_override.reason,
                mode_override.to
            );
        }
        if plan.runs(Phase::Reset) && cache.is_some() {
            log::warn!(
                "Existing configuration in {:?} does not match the requested settings; it will be discarded.",
                options.build_dir
            );
        }
        if flags.configure_args_given {
            if !plan.runs(Phase::Configure) {
                log::warn!(
                    "Extra configure arguments {:?} are ignored by {}.",
                    options.extra_toolchain_args,
                    plan.action
                );
            } else if cache.is_some() && !plan.runs(Phase::Reset) {
                log::info!(
                    "Re-running configure to apply extra arguments {:?}.",
                    options.extra_toolchain_args
                );
            }
        }
        log::debug!("Execution plan: {:?}", plan);
        Ok(plan)
    }

    /// Plans and runs `request`.
    pub fn execute(&mut self, request: &ActionRequest, options: BuildOptions) -> Result<ExecutionPlan, Error> {
        let plan = self.plan(request, &options)?;
        self.run_plan(&plan, options)?;
        Ok(plan)
    }

    pub fn run_plan(&mut self, plan: &ExecutionPlan, options: BuildOptions) -> Result<(), Error> {
        let config = BuildConfiguration::new(plan.effective_mode, options);
        for phase in &plan.phases {
            self.transition(phase.state());
            self.run_phase(*phase, &config, plan.coverage)?;
        }
        self.transition(PipelineState::Done);
        Ok(())
    }

    fn transition(&mut self, next: PipelineState) {
        if self.state != next {
            log::debug!("Pipeline state: {} -> {}", self.state, next);
            self.state = next;
        }
    }

    fn run_phase(&mut self, phase: Phase, config: &BuildConfiguration, coverage: bool) -> Result<(), Error> {
        let cmake = CMakeHandler::new();
        let build_dir = config.build_dir();

        match phase {
            Phase::Clean => {
                log::info!("Cleaning build directory...");
                file_system::remove_dir_if_exists(build_dir).map_err(Error::FileSystem)?;
                log::info!("Clean complete.");
            }
            Phase::Reset => {
                log::info!("Cleaning build directory for a fresh configure...");
                file_system::recreate_dir(build_dir).map_err(Error::FileSystem)?;
            }
            Phase::Configure => {
                self.require(&cmake)?;
                file_system::ensure_dir_exists(build_dir).map_err(Error::FileSystem)?;
                if coverage {
                    log::info!("Configuring for coverage...");
                } else {
                    log::info!("Configuring CMake (config: {})...", config.mode());
                }
                let coverage_option = coverage.then(|| self.settings.coverage_option.as_str());
                let inv = cmake.configure(&self.project_root, config, coverage_option, self.toolchain_file.as_deref());
                self.run(&inv, FailureKind::Configuration)?;
            }
            Phase::Build => {
                log::info!("Building project (config: {})...", config.mode());
                self.run(&cmake.build(config), FailureKind::Build)?;
                log::info!("Build complete.");
            }
            Phase::NativeTest => {
                log::info!("Running native tests...");
                self.run(&cmake.test(config), FailureKind::Verification)?;
            }
            Phase::ManagedTest => {
                log::info!("Running managed tests...");
                let dotnet = DotnetHandler::new(self.settings);
                self.require(&dotnet)?;
                let env = self.native_environment(config)?;
                let inv = dotnet.test(&self.project_root, config.mode()).envs(env);
                self.run(&inv, FailureKind::Verification)?;
                log::info!("Tests complete.");
            }
            Phase::CoverageReport => {
                log::info!("Building and running coverage target...");
                let inv = cmake.build_target(config, &self.settings.coverage_target);
                self.run(&inv, FailureKind::Verification)?;
                log::info!("Coverage report generated in {:?}", build_dir.join("coverage_html"));
            }
            Phase::NativeBenchmark => {
                log::info!("Running native benchmarks...");
                let env = self.native_environment(config)?;
                let executable = self.bench_executable(config)?;
                let inv = Invocation::new(executable).current_dir(build_dir).envs(env);
                self.run(&inv, FailureKind::Verification)?;
            }
            Phase::ManagedBenchmark => {
                log::info!("Running managed benchmarks...");
                let dotnet = DotnetHandler::new(self.settings);
                self.require(&dotnet)?;
                if !dotnet.has_benchmark_project(&self.project_root) {
                    return Err(Error::Detection(format!(
                        "No managed benchmark project found at {:?}.",
                        self.project_root.join(&self.settings.managed_bench_project)
                    )));
                }
                let env = self.native_environment(config)?;
                let inv = dotnet.benchmark(&self.project_root).envs(env);
                self.run(&inv, FailureKind::Verification)?;
                log::info!("Benchmarks complete.");
            }
            Phase::Docs => {
                log::info!("Generating documentation...");
                let inv = cmake.build_target(config, &self.settings.docs_target);
                self.run(&inv, FailureKind::Build)?;
                log::info!("Documentation generation complete.");
            }
            Phase::Install => {
                log::info!("Installing...");
                self.run(&cmake.install(config), FailureKind::Build)?;
            }
        }
        Ok(())
    }

    fn run(&mut self, inv: &Invocation, failure: FailureKind) -> Result<(), Error> {
        run_checked(&mut *self.executor, inv, failure).map(|_| ())
    }

    fn require(&self, handler: &dyn ToolchainHandler) -> Result<(), Error> {
        if handler.detect(&self.project_root) {
            Ok(())
        } else {
            Err(Error::Detection(format!(
                "No {} project found in {:?}.",
                handler.toolchain_name(),
                self.project_root
            )))
        }
    }

    /// Resolves the native library, checks it exists, and returns the
    /// loader environment a process needs to find it.
    fn native_environment(&self, config: &BuildConfiguration) -> Result<std::collections::BTreeMap<String, String>, Error> {
        let artifact = self.require_artifact(config)?;
        Ok(bridge_environment(self.platform, &artifact))
    }

    fn require_artifact(&self, config: &BuildConfiguration) -> Result<PathBuf, Error> {
        let layout = self.settings.artifact_layout();
        let path = resolve_artifact_path(config.build_dir(), self.platform, config.mode(), &layout).ok_or_else(|| {
            Error::ArtifactResolution(format!(
                "no native library naming convention is known for platform '{}'",
                self.platform
            ))
        })?;

        if path.is_file() {
            log::debug!("Native artifact found at {:?}", path);
            return Ok(path);
        }

        let mut msg = format!("expected native library at {:?}, but it does not exist", path);
        let candidates = shared_library_extension(self.platform)
            .map(|ext| file_system::find_files_by_extension(config.build_dir(), ext))
            .unwrap_or_default();
        if !candidates.is_empty() {
            msg.push_str("; libraries found in the build directory: ");
            msg.push_str(&display_paths(&candidates));
        }
        Err(Error::ArtifactResolution(msg))
    }

    fn bench_executable(&self, config: &BuildConfiguration) -> Result<PathBuf, Error> {
        let relative = &self.settings.native_bench_executable;
        let path = resolve_executable_path(config.build_dir(), self.platform, config.mode(), relative)
            .ok_or_else(|| {
                Error::ArtifactResolution(format!(
                    "cannot locate benchmark executable {:?} on platform '{}'",
                    relative, self.platform
                ))
            })?;
        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::ArtifactResolution(format!(
                "expected benchmark executable at {:?}, but it does not exist",
                path
            )))
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Absolute build directory: `explicit` if given, else the settings' default,
/// relative paths taken from `project_root`.
pub fn resolve_build_dir(project_root: &Path, explicit: Option<&Path>, settings: &ProjectSettings) -> PathBuf {
    project_root.join(explicit.unwrap_or(&settings.build_dir))
}
