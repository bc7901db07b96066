//! Integration tests for the rollout CLI
//!
//! These tests spawn the actual binary and test end-to-end behavior.
//! Nothing here opens a network connection: deploys go through `--dry-run`
//! or fail during configuration.

mod cli_tests;
