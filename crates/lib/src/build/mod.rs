//! Build plan detection.
//!
//! Turns a source tree into a [`BuildPlan`]: an ordered list of shell and
//! native steps, the entry points the build is expected to produce, and
//! per-project metadata.
//!
//! # Submodules
//!
//! - [`detect`] - ranked rule registry and the [`Detector`] that walks it
//! - [`rules`] - the built-in ecosystem rules
//! - [`manifest`] - the explicit `anvil.json` manifest
//! - [`actions`] - native collection steps
//! - [`host`] - toolchain lookup and system package installation

pub mod actions;
pub mod detect;
pub mod host;
pub mod manifest;
pub mod rules;
mod types;

pub use detect::{DetectContext, Detector, Rule};
pub use host::{PathToolchain, PlatformPackages, SystemPackages, Toolchain};
pub use manifest::Manifest;
pub use types::*;
