//! Host platform facts used by detection, release lookup and the build
//! environment.

pub mod arch;
pub mod os;
pub mod paths;

use std::fmt;

use arch::Arch;
use os::Os;

/// The host pair a prebuilt release has to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
  pub arch: Arch,
  pub os: Os,
}

impl Platform {
  pub fn new(arch: Arch, os: Os) -> Self {
    Self { arch, os }
  }

  /// `None` on hosts anvil has no release naming for.
  pub fn current() -> Option<Self> {
    Some(Self::new(Arch::current()?, Os::current()?))
  }

  /// Whether a release asset name looks like a prebuilt for this platform.
  ///
  /// Any OS or architecture token is enough.
  pub fn matches_asset(&self, asset_name: &str) -> bool {
    let name = asset_name.to_lowercase();
    !name.is_empty()
      && self
        .os
        .asset_tokens()
        .iter()
        .chain(self.arch.asset_tokens())
        .any(|token| name.contains(token))
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.arch, self.os)
  }
}

/// Whether builds on this host use the MSVC toolchain family.
pub fn is_msvc() -> bool {
  cfg!(target_os = "windows")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn displays_as_arch_os() {
    assert_eq!(Platform::new(Arch::Aarch64, Os::MacOs).to_string(), "aarch64-darwin");
    assert_eq!(Platform::new(Arch::X86_64, Os::Windows).to_string(), "x86_64-windows");
  }

  #[test]
  fn asset_matching_uses_os_and_arch_tokens() {
    let linux = Platform::new(Arch::X86_64, Os::Linux);
    assert!(linux.matches_asset("tool-x86_64-unknown-linux-gnu.tar.gz"));
    assert!(linux.matches_asset("tool-amd64.deb"));
    assert!(!linux.matches_asset("checksums.txt"));
    assert!(!linux.matches_asset(""));
  }
}
