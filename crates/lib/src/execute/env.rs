//! Compiler environment shared by every step of one build.
//!
//! On the MSVC toolchain a single C runtime (`/MD` or `/MT`) is pinned for the
//! whole build so objects from different steps link together. On POSIX hosts
//! position-independent code can be forced through `CFLAGS`/`CXXFLAGS`.

use std::collections::BTreeMap;

use tracing::debug;

use crate::build::{MsvcRuntime, PlanMetadata};
use crate::config::AnvilConfig;

const CMAKE_RUNTIME_DEFINE: &str = "-DCMAKE_MSVC_RUNTIME_LIBRARY=";
const CL_RUNTIME_FLAGS: &[&str] = &["/MD", "/MT", "/MDd", "/MTd"];
const PIC_FLAG: &str = "-fPIC";

/// Per-invocation overrides; `None` defers to the manifest and environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
  pub msvc_runtime: Option<MsvcRuntime>,
  pub force_pic: Option<bool>,
}

/// Runtime choice: invocation, then manifest, then environment, then MD.
pub fn resolve_runtime(
  invocation: Option<MsvcRuntime>,
  manifest: Option<MsvcRuntime>,
  env: Option<MsvcRuntime>,
) -> MsvcRuntime {
  invocation.or(manifest).or(env).unwrap_or_default()
}

/// PIC choice with the same precedence; the environment is a plain toggle.
pub fn resolve_pic(invocation: Option<bool>, manifest: Option<bool>, env: bool) -> bool {
  invocation.or(manifest).unwrap_or(env)
}

#[derive(Debug, Clone, Default)]
pub struct BuildEnv {
  runtime: Option<MsvcRuntime>,
  vars: BTreeMap<String, String>,
}

impl BuildEnv {
  /// Environment for the host toolchain.
  pub fn for_host(config: &AnvilConfig, overrides: &EnvOverrides, metadata: &PlanMetadata) -> Self {
    let runtime = crate::platform::is_msvc().then(|| {
      resolve_runtime(overrides.msvc_runtime, metadata.msvc_runtime, config.msvc_runtime)
    });
    let pic = !cfg!(windows) && resolve_pic(overrides.force_pic, metadata.force_pic, config.force_pic);
    Self::new(runtime, pic, |key| std::env::var(key).ok())
  }

  /// `runtime` is `Some` only when targeting MSVC; `lookup` reads the base
  /// environment the adjustments are layered on.
  pub fn new(runtime: Option<MsvcRuntime>, pic: bool, lookup: impl Fn(&str) -> Option<String>) -> Self {
    let mut vars = BTreeMap::new();

    if let Some(runtime) = runtime {
      vars.insert("CL".to_string(), with_cl_runtime(lookup("CL").as_deref(), runtime));
      vars.insert("CMAKE_MSVC_RUNTIME_LIBRARY".to_string(), runtime.cmake_value().to_string());
    }

    if pic {
      for key in ["CFLAGS", "CXXFLAGS"] {
        vars.insert(key.to_string(), with_pic(lookup(key).as_deref()));
      }
    }

    debug!(runtime = ?runtime, pic, vars = ?vars, "prepared build environment");
    Self { runtime, vars }
  }

  pub fn runtime(&self) -> Option<MsvcRuntime> {
    self.runtime
  }

  /// Variables set on top of the inherited environment.
  pub fn vars(&self) -> &BTreeMap<String, String> {
    &self.vars
  }

  /// Pin the runtime on CMake configure invocations.
  pub fn rewrite(&self, cmd: &str) -> String {
    match self.runtime {
      Some(runtime) if is_cmake_configure(cmd) => with_cmake_runtime(cmd, runtime),
      _ => cmd.to_string(),
    }
  }
}

/// Replace any runtime flag in `CL`, or prepend one.
fn with_cl_runtime(existing: Option<&str>, runtime: MsvcRuntime) -> String {
  let existing = existing.unwrap_or("").trim();
  if existing.is_empty() {
    return runtime.cl_flag().to_string();
  }

  let mut replaced = false;
  let tokens: Vec<&str> = existing
    .split_whitespace()
    .map(|token| {
      if CL_RUNTIME_FLAGS.contains(&token) {
        replaced = true;
        runtime.cl_flag()
      } else {
        token
      }
    })
    .collect();

  if replaced {
    tokens.join(" ")
  } else {
    format!("{} {}", runtime.cl_flag(), existing)
  }
}

fn with_pic(existing: Option<&str>) -> String {
  match existing.map(str::trim).filter(|v| !v.is_empty()) {
    Some(flags) if flags.split_whitespace().any(|f| f == PIC_FLAG) => flags.to_string(),
    Some(flags) => format!("{} {}", flags, PIC_FLAG),
    None => PIC_FLAG.to_string(),
  }
}

/// A `cmake` invocation that configures a tree (not `--build`/`--install`).
fn is_cmake_configure(cmd: &str) -> bool {
  let mut tokens = cmd.split_whitespace().peekable();
  while let Some(token) = tokens.next() {
    let program = token.trim_matches('"').rsplit(['/', '\\']).next().unwrap_or(token);
    if program.eq_ignore_ascii_case("cmake") || program.eq_ignore_ascii_case("cmake.exe") {
      return !matches!(tokens.peek(), Some(&"--build") | Some(&"--install"));
    }
  }
  false
}

fn with_cmake_runtime(cmd: &str, runtime: MsvcRuntime) -> String {
  let define = format!("{}{}", CMAKE_RUNTIME_DEFINE, runtime.cmake_value());
  match cmd.find(CMAKE_RUNTIME_DEFINE) {
    Some(start) => {
      let end = cmd[start..]
        .find(char::is_whitespace)
        .map(|offset| start + offset)
        .unwrap_or(cmd.len());
      format!("{}{}{}", &cmd[..start], define, &cmd[end..])
    }
    None => format!("{} {}", cmd, define),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn no_env(_: &str) -> Option<String> {
    None
  }

  #[test]
  fn runtime_precedence() {
    use MsvcRuntime::*;
    assert_eq!(resolve_runtime(None, None, None), Md);
    assert_eq!(resolve_runtime(None, None, Some(Mt)), Mt);
    assert_eq!(resolve_runtime(None, Some(Md), Some(Mt)), Md);
    assert_eq!(resolve_runtime(Some(Mt), Some(Md), Some(Md)), Mt);
  }

  #[test]
  fn pic_precedence() {
    assert!(!resolve_pic(None, None, false));
    assert!(resolve_pic(None, None, true));
    assert!(!resolve_pic(None, Some(false), true));
    assert!(resolve_pic(Some(true), Some(false), false));
  }

  #[test]
  fn cl_runtime_is_replaced_or_prepended() {
    assert_eq!(with_cl_runtime(None, MsvcRuntime::Mt), "/MT");
    assert_eq!(with_cl_runtime(Some("/nologo /MD /O2"), MsvcRuntime::Mt), "/nologo /MT /O2");
    assert_eq!(with_cl_runtime(Some("/nologo"), MsvcRuntime::Md), "/MD /nologo");
  }

  #[test]
  fn msvc_env_sets_cl_and_cmake_variable() {
    let env = BuildEnv::new(Some(MsvcRuntime::Mt), false, |key| {
      (key == "CL").then(|| "/MD".to_string())
    });
    assert_eq!(env.vars().get("CL").map(String::as_str), Some("/MT"));
    assert_eq!(
      env.vars().get("CMAKE_MSVC_RUNTIME_LIBRARY").map(String::as_str),
      Some("MultiThreaded")
    );
  }

  #[test]
  fn pic_appends_once() {
    let env = BuildEnv::new(None, true, |key| match key {
      "CFLAGS" => Some("-O2".to_string()),
      "CXXFLAGS" => Some("-O2 -fPIC".to_string()),
      _ => None,
    });
    assert_eq!(env.vars().get("CFLAGS").map(String::as_str), Some("-O2 -fPIC"));
    assert_eq!(env.vars().get("CXXFLAGS").map(String::as_str), Some("-O2 -fPIC"));
  }

  #[test]
  fn no_adjustments_by_default() {
    let env = BuildEnv::new(None, false, no_env);
    assert!(env.vars().is_empty());
    assert_eq!(env.rewrite("cmake .."), "cmake ..");
  }

  #[test]
  fn cmake_configure_gets_runtime_define() {
    let env = BuildEnv::new(Some(MsvcRuntime::Md), false, no_env);
    assert_eq!(
      env.rewrite("cmake -S . -B build"),
      "cmake -S . -B build -DCMAKE_MSVC_RUNTIME_LIBRARY=MultiThreadedDLL"
    );
    assert_eq!(
      env.rewrite("cd build && cmake .. -DCMAKE_MSVC_RUNTIME_LIBRARY=MultiThreaded -A x64"),
      "cd build && cmake .. -DCMAKE_MSVC_RUNTIME_LIBRARY=MultiThreadedDLL -A x64"
    );
  }

  #[test]
  fn cmake_build_and_other_commands_are_untouched() {
    let env = BuildEnv::new(Some(MsvcRuntime::Mt), false, no_env);
    assert_eq!(env.rewrite("cmake --build build"), "cmake --build build");
    assert_eq!(env.rewrite("make -j4"), "make -j4");
  }
}
