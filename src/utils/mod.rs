//! The `utils` module provides helper functions for common tasks such as
//! running external commands and file system operations. These utilities are
//! used by the pipeline to drive the native and managed toolchains.

pub mod command_runner;
pub mod file_system;

#[cfg(test)]
pub(crate) mod testutil;
