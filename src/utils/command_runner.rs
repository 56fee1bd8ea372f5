use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;

use crate::Error;

/// One external process to start: argv, optional working directory and the
/// variables overlaid on top of the inherited environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Invocation {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Adds environment overrides. Later entries win on key collision.
    pub fn envs(mut self, env: BTreeMap<String, String>) -> Self {
        self.env.extend(env);
        self
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Exit code and every line the process printed, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub exit_code: i32,
    pub combined_output: Vec<String>,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Which error a non-zero exit code turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Configuration,
    Build,
    Verification,
}

impl FailureKind {
    pub fn into_error(self, command: String, exit_code: i32) -> Error {
        match self {
            FailureKind::Configuration => Error::ConfigurationFailure { command, exit_code },
            FailureKind::Build => Error::BuildFailure { command, exit_code },
            FailureKind::Verification => Error::VerificationFailure { command, exit_code },
        }
    }
}

/// Starts external processes. The pipeline only talks to toolchains through
/// this trait so tests can substitute a recording fake.
pub trait CommandExecutor {
    fn execute(&mut self, invocation: &Invocation) -> Result<ProcessOutcome, Error>;
}

/// Runs processes for real, echoing their output line by line as it arrives.
#[derive(Debug, Default)]
pub struct SystemExecutor;

impl SystemExecutor {
    pub fn new() -> Self {
        SystemExecutor
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

impl CommandExecutor for SystemExecutor {
    fn execute(&mut self, invocation: &Invocation) -> Result<ProcessOutcome, Error> {
        log::debug!(
            "Running command: {} (in {:?})",
            invocation,
            invocation.current_dir.as_deref().unwrap_or_else(|| std::path::Path::new("."))
        );

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        if let Some(dir) = &invocation.current_dir {
            cmd.current_dir(dir);
        }
        cmd.envs(&invocation.env);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            Error::Command(format!(
                "Failed to execute command '{}': {}. Is it installed and in your PATH?",
                invocation.program.display(),
                e
            ))
        })?;

        let (tx, rx) = mpsc::channel::<(Stream, String)>();
        let mut pumps = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            pumps.push(spawn_pump(stdout, Stream::Stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(spawn_pump(stderr, Stream::Stderr, tx.clone()));
        }
        drop(tx);

        let mut combined_output = Vec::new();
        for (stream, line) in rx {
            match stream {
                Stream::Stdout => {
                    let _ = writeln!(io::stdout().lock(), "{}", line);
                }
                Stream::Stderr => {
                    let _ = writeln!(io::stderr().lock(), "{}", line);
                }
            }
            combined_output.push(line);
        }
        for pump in pumps {
            if pump.join().is_err() {
                log::warn!("Output reader for '{}' panicked; output may be incomplete.", invocation);
            }
        }

        let status = child.wait()?;
        Ok(ProcessOutcome {
            exit_code: exit_code_of(status),
            combined_output,
        })
    }
}

fn spawn_pump<R>(reader: R, stream: Stream, tx: mpsc::Sender<(Stream, String)>) -> thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let reader = BufReader::new(reader);
        for line in reader.split(b'\n') {
            match line {
                Ok(mut bytes) => {
                    while bytes.last() == Some(&b'\r') {
                        bytes.pop();
                    }
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    if tx.send((stream, text)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    })
}

fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Runs `invocation` and turns a non-zero exit code into a fatal error of the
/// given kind, carrying the same exit code.
pub fn run_checked<E>(executor: &mut E, invocation: &Invocation, failure: FailureKind) -> Result<ProcessOutcome, Error>
where
    E: CommandExecutor + ?Sized,
{
    log::info!("Executing: {}", invocation);
    if !invocation.env.is_empty() {
        log::info!("Environment overlay: {:?}", invocation.env);
    }

    let outcome = executor.execute(invocation)?;
    if outcome.success() {
        log::debug!("Command '{}' executed successfully.", invocation);
        Ok(outcome)
    } else {
        log::error!(
            "Command '{}' failed with exit code {} ({} lines of output shown above).",
            invocation,
            outcome.exit_code,
            outcome.combined_output.len()
        );
        Err(failure.into_error(invocation.to_string(), outcome.exit_code))
    }
}
