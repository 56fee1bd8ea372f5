use clap::Parser;
use std::path::PathBuf;

use crate::pipeline::{Action, BuildMode};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct AppConfig {
    /// Action to perform
    #[clap(value_enum)]
    pub action: Action,

    /// Build configuration (coverage forces Debug, benchmark forces Release)
    #[clap(long = "config", visible_alias = "build-type", value_enum, ignore_case = true, default_value = "Release")]
    pub build_config: BuildMode,

    /// Build only this native target
    #[clap(long)]
    pub target: Option<String>,

    /// Parallel build jobs
    #[clap(short, long)]
    pub jobs: Option<u32>,

    /// Build output directory (default: `build` under the project root)
    #[clap(long)]
    pub build_dir: Option<PathBuf>,

    /// Install prefix; also makes `all` finish with an install
    #[clap(long)]
    pub install_prefix: Option<PathBuf>,

    /// Root of the project to build
    #[clap(short, long, value_parser, default_value = ".")]
    pub project_root: PathBuf,

    /// Project settings file (default: yini-build.toml in the project root, if present)
    #[clap(long)]
    pub settings: Option<PathBuf>,

    /// Print the execution plan as JSON instead of running it
    #[clap(long)]
    pub dry_run: bool,

    /// Extra arguments passed to the configure step
    #[clap(last = true)]
    pub toolchain_args: Vec<String>,
}

impl AppConfig {
    pub fn new() -> Self {
        AppConfig::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_release_in_current_directory() {
        let config = AppConfig::try_parse_from(["yini_build", "build"]).unwrap();
        assert_eq!(config.action, Action::Build);
        assert_eq!(config.build_config, BuildMode::Release);
        assert_eq!(config.project_root, PathBuf::from("."));
        assert!(config.toolchain_args.is_empty());
    }

    #[test]
    fn build_type_alias_and_case_insensitive_modes() {
        let config = AppConfig::try_parse_from(["yini_build", "test", "--build-type", "debug"]).unwrap();
        assert_eq!(config.build_config, BuildMode::Debug);

        let config = AppConfig::try_parse_from(["yini_build", "test", "--config", "MinSizeRel"]).unwrap();
        assert_eq!(config.build_config, BuildMode::MinSizeRel);
    }

    #[test]
    fn trailing_args_go_to_configure() {
        let config = AppConfig::try_parse_from(["yini_build", "configure", "-j", "4", "--", "-GNinja", "-DFOO=1"]).unwrap();
        assert_eq!(config.jobs, Some(4));
        assert_eq!(config.toolchain_args, vec!["-GNinja", "-DFOO=1"]);
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(AppConfig::try_parse_from(["yini_build", "deploy"]).is_err());
        assert!(AppConfig::try_parse_from(["yini_build", "build", "--config", "Profile"]).is_err());
    }

    #[test]
    fn bench_alias_parses() {
        let config = AppConfig::try_parse_from(["yini_build", "bench"]).unwrap();
        assert_eq!(config.action, Action::Benchmark);
    }
}
