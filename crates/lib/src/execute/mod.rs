//! Build step execution.

pub mod cmd;
pub mod env;
pub mod types;

pub use cmd::ProcessRunner;
pub use env::{BuildEnv, EnvOverrides, resolve_pic, resolve_runtime};
pub use types::ExecuteError;
