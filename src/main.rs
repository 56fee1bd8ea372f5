use yini_build::Error;

fn main() {
    if let Err(e) = yini_build::run() {
        log::error!("Application error: {}", e);
        match &e {
            Error::Io(io_err) => eprintln!("Error: A file system I/O error occurred: {}", io_err),
            Error::Config(msg) => eprintln!("Error: Configuration issue: {}", msg),
            Error::Detection(msg) => eprintln!("Error: Project detection failed: {}", msg),
            Error::ConfigurationFailure { command, exit_code } => {
                eprintln!("Error: Configure step failed (exit code {}): {}", exit_code, command)
            }
            Error::BuildFailure { command, exit_code } => {
                eprintln!("Error: Build step failed (exit code {}): {}", exit_code, command)
            }
            Error::VerificationFailure { command, exit_code } => {
                eprintln!("Error: Verification step failed (exit code {}): {}", exit_code, command)
            }
            Error::ArtifactResolution(msg) => eprintln!("Error: Native artifact not available: {}", msg),
            Error::Command(msg) => eprintln!("Error: External command execution failed: {}", msg),
            Error::FileSystem(msg) => eprintln!("Error: File system operation failed: {}", msg),
            Error::Json(json_err) => eprintln!("Error: Could not render the execution plan: {}", json_err),
        }
        std::process::exit(e.exit_code());
    }
}
