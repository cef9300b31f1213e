//! Cross-crate integration tests for the mesh control plane.
//!
//! Run with: `cargo test --package integration-tests`

#[cfg(test)]
mod common;
#[cfg(test)]
mod load_tests;
#[cfg(test)]
mod mesh_tests;
#[cfg(test)]
mod snapshot_tests;
