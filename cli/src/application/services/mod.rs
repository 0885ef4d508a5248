//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod bootstrap;
pub mod config_service;
pub mod inventory;
pub mod notebook;
pub mod provision;
pub mod reconcile;
pub mod terminate;
pub mod tunnel;
