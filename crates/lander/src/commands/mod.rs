//! CLI subcommands.

pub mod dev;
pub mod init;
pub mod package;
pub mod serve;
pub mod transform;
