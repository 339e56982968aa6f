//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML settings file, writes a default one
//! on first run, and resolves the platform config directory.  Nothing outside
//! this module knows the file format.

pub mod config;
