pub mod archive;
pub mod catalog;
pub mod commands;
pub mod download;
pub mod error;
pub mod http;
pub mod install;
pub mod paths;
pub mod platform;
pub mod runtime;
pub mod switch;
