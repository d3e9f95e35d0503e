//! Filesystem helpers shared by the build, link and maintenance paths.

pub mod copy;
pub mod exec;
pub mod remove;

pub use copy::{copy_files_into, copy_tree};
pub use exec::{is_executable, set_executable};
pub use remove::{RemoveOutcome, SafeRemover, make_writable};
