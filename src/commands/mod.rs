//! Command layer behind the `nym` binary: resolves configuration, drives the pipeline
//! and prints status lines.

pub mod config;
mod current;
mod init;
mod install;
mod list;
mod ls_remote;
mod use_version;

pub use current::current;
pub use init::init;
pub use install::install;
pub use list::list;
pub use ls_remote::ls_remote;
pub use use_version::use_version;
