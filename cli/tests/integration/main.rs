//! Integration tests for the dev-machine CLI
//!
//! These tests spawn the actual binary and test end-to-end behavior. None of
//! them reach the cloud: every case stops before the first `aws` call.

mod cli_tests;
