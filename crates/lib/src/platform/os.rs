use std::fmt;

/// Host operating systems anvil builds on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
}

impl Os {
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Name used in platform strings; macOS is `darwin`.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::Windows => "windows",
    }
  }

  /// Keys accepted for this OS in a manifest `build` table, most specific first.
  pub fn manifest_keys(&self) -> &'static [&'static str] {
    match self {
      Self::Linux => &["linux"],
      Self::MacOs => &["darwin", "macos"],
      Self::Windows => &["windows"],
    }
  }

  /// Substrings that mark a release asset as built for this OS.
  pub fn asset_tokens(&self) -> &'static [&'static str] {
    match self {
      Self::Linux => &["linux", "tar.gz", "tar.xz", "tgz"],
      Self::MacOs => &["mac", "darwin", "dylib", "tar.gz", "zip"],
      Self::Windows => &["win", "windows", ".exe", "zip"],
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  #[cfg(target_os = "linux")]
  fn detects_linux() {
    assert_eq!(Os::current(), Some(Os::Linux));
  }

  #[test]
  fn macos_accepts_both_manifest_spellings() {
    assert_eq!(Os::MacOs.manifest_keys(), &["darwin", "macos"]);
  }
}
