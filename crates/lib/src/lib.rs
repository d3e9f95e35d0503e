//! anvil-lib: core of the Anvil package manager.
//!
//! Anvil fetches source trees, works out how to build them, installs the
//! result under a per-package prefix and publishes the executables on a
//! shared bin directory:
//! - `build`: build plan detection over a ranked rule list
//! - `execute`: running plan steps with the prepared toolchain environment
//! - `link`: publishing entry points into the bin directory
//! - `index`: the local package index and its registry checkout
//! - `forge`: the end-to-end pipeline and maintenance operations

pub mod build;
pub mod config;
pub mod consts;
pub mod diagnostics;
pub mod execute;
pub mod forge;
pub mod fs;
pub mod git;
pub mod index;
pub mod link;
pub mod platform;
pub mod release;
pub mod util;
