//! `yini_build` drives the two toolchains of the YINI project from one command
//! line: the CMake build of the native library and the dotnet build of its
//! managed binding. It compiles nothing itself; it decides which phases to run,
//! hands each external tool the right arguments and environment, and stops at
//! the first failure with that tool's exit code.
//!
//! ## Features
//! - Configures only when the CMake cache is missing or no longer matches the
//!   requested build (mode change, coverage instrumentation).
//! - Runs native tests before managed tests, with the loader path pointing at
//!   the freshly built native library.
//! - Coverage always runs in Debug on a freshly configured build directory.
//! - Benchmarks always run against a Release build.
//! - Picks up a vcpkg toolchain file from `VCPKG_ROOT` when present.
//!
//! ## Usage (CLI)
//! ```bash
//! yini_build test --config Debug
//! yini_build coverage
//! yini_build all --install-prefix /opt/yini -- -GNinja
//! ```

pub mod app_config;
pub mod pipeline;
pub mod platform;
pub mod project_config;
pub mod utils;

use app_config::AppConfig;
use pipeline::cmake_handler::toolchain_integration_from_env;
use pipeline::phase_controller::{resolve_build_dir, ExecutionPlan, PhaseController};
use pipeline::{ActionRequest, BuildOptions};
use platform::Platform;
use project_config::ProjectSettings;
use utils::command_runner::{CommandExecutor, SystemExecutor};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Project detection failed: {0}")]
    Detection(String),
    #[error("Configure step `{command}` failed with exit code {exit_code}")]
    ConfigurationFailure { command: String, exit_code: i32 },
    #[error("Build step `{command}` failed with exit code {exit_code}")]
    BuildFailure { command: String, exit_code: i32 },
    #[error("Verification step `{command}` failed with exit code {exit_code}")]
    VerificationFailure { command: String, exit_code: i32 },
    #[error("Native artifact resolution failed: {0}")]
    ArtifactResolution(String),
    #[error("Command execution failed: {0}")]
    Command(String),
    #[error("File system operation failed: {0}")]
    FileSystem(String),
    #[error("Failed to render plan: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Exit code for the orchestrator: a failing tool's own code, else 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ConfigurationFailure { exit_code, .. }
            | Error::BuildFailure { exit_code, .. }
            | Error::VerificationFailure { exit_code, .. } => *exit_code,
            _ => 1,
        }
    }
}

pub fn run() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init().ok();

    let config = AppConfig::new();
    run_with(&config, &mut SystemExecutor::new(), Platform::current()).map(|_| ())
}

/// Runs the parsed command line against `executor` as if on `platform`.
pub fn run_with<E>(config: &AppConfig, executor: &mut E, platform: Platform) -> Result<ExecutionPlan, Error>
where
    E: CommandExecutor + ?Sized,
{
    if !config.project_root.is_dir() {
        return Err(Error::Config(format!(
            "Project root {:?} does not exist or is not a directory.",
            config.project_root
        )));
    }
    let project_root = config.project_root.canonicalize()?;
    let settings = ProjectSettings::load(&project_root, config.settings.as_deref())?;

    log::info!("Running '{}' for project at {:?} on {}", config.action, project_root, platform);
    log::debug!("Using configuration: {:?}", config);

    let options = BuildOptions {
        build_dir: resolve_build_dir(&project_root, config.build_dir.as_deref(), &settings),
        extra_toolchain_args: config.toolchain_args.clone(),
        target: config.target.clone(),
        jobs: config.jobs,
        install_prefix: config.install_prefix.clone(),
    };
    let request = ActionRequest::new(config.action, config.build_config);
    let toolchain_file = toolchain_integration_from_env(&settings.toolchain_root_var, &settings.toolchain_file);

    let mut controller =
        PhaseController::new(executor, &settings, project_root, platform).with_toolchain_file(toolchain_file);
    let plan = controller.plan(&request, &options)?;

    if config.dry_run {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(plan);
    }

    controller.run_plan(&plan, options)?;
    log::info!("'{}' finished successfully.", request.action());
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::phase_controller::Phase;
    use crate::pipeline::{Action, BuildMode};
    use crate::utils::testutil::{RecordingExecutor, Workspace};
    use clap::Parser;

    fn parse(ws: &Workspace, args: &[&str]) -> AppConfig {
        let root = ws.root().to_string_lossy().into_owned();
        let mut argv = vec!["yini_build", "--project-root", root.as_str()];
        argv.extend_from_slice(args);
        AppConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn exit_code_passes_tool_codes_through() {
        let err = Error::VerificationFailure {
            command: "ctest".to_string(),
            exit_code: 42,
        };
        assert_eq!(err.exit_code(), 42);
        assert_eq!(Error::Config("x".to_string()).exit_code(), 1);
    }

    #[test]
    fn dry_run_plans_without_executing() {
        let ws = Workspace::new();
        let mut exec = RecordingExecutor::new();

        let plan = run_with(&parse(&ws, &["benchmark", "--config", "Debug", "--dry-run"]), &mut exec, Platform::Linux).unwrap();

        assert_eq!(plan.action, Action::Benchmark);
        assert_eq!(plan.effective_mode, BuildMode::Release);
        assert!(plan.runs(Phase::Configure));
        assert!(exec.invocations.is_empty());
        assert!(!ws.build_dir().exists());
    }

    #[test]
    fn settings_file_changes_build_dir() {
        let ws = Workspace::new();
        std::fs::write(ws.root().join("yini-build.toml"), "build_dir = \"out\"\n").unwrap();
        let mut exec = ws.executor();

        run_with(&parse(&ws, &["configure"]), &mut exec, Platform::Linux).unwrap();

        let canonical = ws.root().canonicalize().unwrap();
        assert!(canonical.join("out").join("CMakeCache.txt").is_file());
        assert!(!ws.build_dir().exists());
    }

    #[test]
    fn missing_project_root_is_a_config_error() {
        let ws = Workspace::new();
        let missing = ws.root().join("nope").to_string_lossy().into_owned();
        let config = AppConfig::try_parse_from(["yini_build", "build", "--project-root", missing.as_str()]).unwrap();

        let err = run_with(&config, &mut RecordingExecutor::new(), Platform::Linux).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
