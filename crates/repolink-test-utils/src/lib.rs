//! Shared test utilities for the repolink workspace.
//!
//! This crate provides standardised fixtures so crate test suites don't each
//! build their own temp trees and fake hosts. It is a dev-dependency only and
//! is never published.
//!
//! # Modules
//!
//! - [`git`]: `.git` marker fixtures
//! - [`tree`]: [`TestTree`], a project root and a workspace root side by side
//! - [`host`]: [`ManualHost`], a scripted host collaborator
//! - [`store`]: [`MemoryPolicyStore`], an in-memory policy store

pub mod git;
pub mod host;
pub mod store;
pub mod tree;

pub use host::ManualHost;
pub use store::MemoryPolicyStore;
pub use tree::TestTree;
