//! Test doubles for driving the pipeline without real toolchains.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::pipeline::BuildOptions;
use crate::project_config::ProjectSettings;
use crate::utils::command_runner::{CommandExecutor, Invocation, ProcessOutcome};
use crate::Error;

struct ScriptedFailure {
    program: String,
    arg: Option<String>,
    exit_code: i32,
}

/// Records every invocation and imitates what cmake leaves on disk: a cache
/// file after configuring and the given artifacts after building.
#[derive(Default)]
pub(crate) struct RecordingExecutor {
    pub invocations: Vec<Invocation>,
    failures: Vec<ScriptedFailure>,
    build_outputs: Vec<PathBuf>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make invocations of `program` (optionally only those carrying `arg`) exit with `exit_code`.
    pub fn fail_when(mut self, program: &str, arg: Option<&str>, exit_code: i32) -> Self {
        self.failures.push(ScriptedFailure {
            program: program.to_string(),
            arg: arg.map(str::to_string),
            exit_code,
        });
        self
    }

    /// Files a successful `cmake --build` creates.
    pub fn creates_on_build(mut self, path: impl Into<PathBuf>) -> Self {
        self.build_outputs.push(path.into());
        self
    }

    pub fn calls_to(&self, program: &str) -> Vec<&Invocation> {
        self.invocations.iter().filter(|inv| inv.program.ends_with(program)).collect()
    }

    pub fn calls_with(&self, program: &str, arg: &str) -> Vec<&Invocation> {
        self.calls_to(program).into_iter().filter(|inv| inv.has_arg(arg)).collect()
    }

    fn write_cache(inv: &Invocation) -> Result<(), Error> {
        let Some(pos) = inv.args.iter().position(|a| a == "-B") else {
            return Ok(());
        };
        let Some(build_dir) = inv.args.get(pos + 1) else {
            return Ok(());
        };
        let mut cache = String::new();
        for arg in &inv.args {
            if let Some(define) = arg.strip_prefix("-D") {
                if let Some((key, value)) = define.split_once('=') {
                    let ty = if value == "ON" { "BOOL" } else { "STRING" };
                    cache.push_str(&format!("{}:{}={}\n", key, ty, value));
                }
            }
        }
        std::fs::create_dir_all(build_dir)?;
        std::fs::write(Path::new(build_dir).join("CMakeCache.txt"), cache)?;
        Ok(())
    }

    fn create_build_outputs(&self) -> Result<(), Error> {
        for path in &self.build_outputs {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, "")?;
        }
        Ok(())
    }
}

impl CommandExecutor for RecordingExecutor {
    fn execute(&mut self, invocation: &Invocation) -> Result<ProcessOutcome, Error> {
        self.invocations.push(invocation.clone());

        let failure = self.failures.iter().find(|f| {
            invocation.program.ends_with(&f.program) && f.arg.as_deref().map_or(true, |a| invocation.has_arg(a))
        });
        if let Some(failure) = failure {
            return Ok(ProcessOutcome {
                exit_code: failure.exit_code,
                combined_output: vec!["simulated failure".to_string()],
            });
        }

        if invocation.program.ends_with("cmake") {
            if invocation.has_arg("-S") {
                Self::write_cache(invocation)?;
            } else if invocation.has_arg("--build") && !invocation.has_arg("--target") {
                self.create_build_outputs()?;
            }
        }

        Ok(ProcessOutcome {
            exit_code: 0,
            combined_output: vec!["ok".to_string()],
        })
    }
}

/// A throwaway project with a CMakeLists.txt and the managed test project.
pub(crate) struct Workspace {
    pub temp: TempDir,
    pub settings: ProjectSettings,
}

impl Workspace {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let settings = ProjectSettings::default();
        std::fs::write(temp.path().join("CMakeLists.txt"), "project(Yini)\n").unwrap();
        let managed = temp.path().join(&settings.managed_test_project);
        std::fs::create_dir_all(managed.parent().unwrap()).unwrap();
        std::fs::write(&managed, "<Project />").unwrap();
        Workspace { temp, settings }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root().join("build")
    }

    pub fn options(&self) -> BuildOptions {
        BuildOptions {
            build_dir: self.build_dir(),
            ..BuildOptions::default()
        }
    }

    /// Linux location of the native library.
    pub fn artifact(&self) -> PathBuf {
        self.build_dir().join("src").join("libYini.so")
    }

    /// Linux location of the native benchmark binary.
    pub fn bench_executable(&self) -> PathBuf {
        self.build_dir().join("tests").join("yini_bench")
    }

    /// Pretend an earlier run configured the build directory.
    pub fn configure_previously(&self, cache: &str) {
        std::fs::create_dir_all(self.build_dir()).unwrap();
        std::fs::write(self.build_dir().join("CMakeCache.txt"), cache).unwrap();
    }

    /// Executor that produces the library and benchmark binary when building.
    pub fn executor(&self) -> RecordingExecutor {
        RecordingExecutor::new()
            .creates_on_build(self.artifact())
            .creates_on_build(self.bench_executable())
    }
}
