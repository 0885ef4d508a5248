//! Command implementations

pub mod clean;
pub mod config;
pub mod create;
pub mod list;
pub mod makefile;
pub mod notebook;
pub mod remove;
pub mod tunnel;
pub mod version;

/// Resolves on Ctrl-C. Never resolves if the signal handler cannot be installed.
pub async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
