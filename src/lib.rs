pub mod build;
pub mod cache;
pub mod commands;
pub mod error;
pub mod linker;
pub mod manifest;
pub mod materialize;
pub mod runtime;
pub mod tool;
