//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the `aws`,
//! `docker`, and `ssh` CLI adapters, marker files, config, and key files.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod aws;
pub mod command_runner;
pub mod config;
pub mod docker;
pub mod fs;
pub mod markers;
pub mod ssh;
