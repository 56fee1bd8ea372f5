//! Host platform knowledge: where the native build puts its shared library
//! and what the dynamic loader needs to find it.

pub mod artifact;
pub mod env_bridge;

use std::fmt;

/// Host operating system families the native build is known to support.
///
/// `Unrecognized` is explicit so callers fail instead of guessing a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Unrecognized,
}

impl Platform {
    /// Detect the platform this process runs on.
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Maps an `std::env::consts::OS` identifier.
    pub fn from_os(os: &str) -> Self {
        match os {
            "linux" => Platform::Linux,
            "macos" => Platform::MacOs,
            "windows" => Platform::Windows,
            _ => Platform::Unrecognized,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
            Platform::Unrecognized => "unrecognized",
        }
    }

    /// Multi-configuration generators (Visual Studio) put outputs in a
    /// per-mode subdirectory.
    pub fn is_multi_config(&self) -> bool {
        matches!(self, Platform::Windows)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
