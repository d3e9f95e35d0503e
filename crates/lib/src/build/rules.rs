//! Built-in detection rules, highest priority first.

use std::path::Path;

use tracing::warn;
use walkdir::WalkDir;

use crate::build::detect::{DetectContext, Rule};
use crate::build::manifest::Manifest;
use crate::build::{BuildPlan, BuildStep, NativeAction};
use crate::platform::os::Os;

const MAKEFILES: &[&str] = &["Makefile", "GNUmakefile", "makefile"];
const MAKE_PROGRAMS: &[&str] = &["make", "gmake", "mingw32-make", "nmake"];
const ARCHIVE_EXTENSIONS: &[&str] = &[".tar.xz", ".7z", ".tar.bz2", ".tar.gz", ".tgz", ".tar", ".zip"];

pub fn default_rules() -> Vec<Rule> {
  vec![
    Rule {
      name: "manifest",
      matches: |src| Manifest::path_in(src).is_file(),
      plan: manifest_plan,
    },
    Rule {
      name: "setup.py",
      matches: |src| has(src, "setup.py"),
      plan: |ctx| {
        let cmd = format!("{} -m pip install . --target \"{{PREFIX}}\" --upgrade", python(ctx));
        Some(shell_plan("setup.py", [cmd]))
      },
    },
    Rule {
      name: "requirements.txt",
      matches: |src| has(src, "requirements.txt"),
      plan: |ctx| {
        let cmd = format!("{} -m pip install -r requirements.txt --target \"{{PREFIX}}\"", python(ctx));
        Some(shell_plan("requirements.txt", [cmd]))
      },
    },
    Rule {
      name: "autotools",
      matches: |src| has(src, "configure"),
      plan: |ctx| {
        Some(shell_plan(
          "autotools",
          [
            "./configure --prefix=\"{PREFIX}\"".to_string(),
            format!("make -j{}", ctx.jobs),
            "make install".to_string(),
          ],
        ))
      },
    },
    Rule {
      name: "makefile",
      matches: |src| MAKEFILES.iter().any(|m| has(src, m)),
      plan: makefile_plan,
    },
    Rule {
      name: "cmake",
      matches: |src| has(src, "CMakeLists.txt"),
      plan: cmake_plan,
    },
    Rule {
      name: "cargo",
      matches: |src| has(src, "Cargo.toml"),
      plan: cargo_plan,
    },
    Rule {
      name: "go",
      matches: |src| has(src, "go.mod") || has(src, "main.go") || first_with_extension(src, "go").is_some(),
      plan: go_plan,
    },
    Rule {
      name: "node",
      matches: |src| has(src, "package.json"),
      plan: |_| Some(shell_plan("node", ["npm install", "npm run build || true"])),
    },
    Rule {
      name: "pyproject",
      matches: |src| has(src, "pyproject.toml"),
      plan: |ctx| {
        let cmd = format!("{} -m pip install . --target \"{{PREFIX}}\" --upgrade", python(ctx));
        Some(shell_plan("pyproject", [cmd]))
      },
    },
    Rule {
      name: "ninja",
      matches: |src| has(src, "build.ninja"),
      plan: |ctx| {
        Some(shell_plan(
          "ninja",
          [format!("ninja -j{}", ctx.jobs), "ninja install || true".to_string()],
        ))
      },
    },
    Rule {
      name: "meson",
      matches: |src| has(src, "meson.build"),
      plan: |_| {
        Some(shell_plan(
          "meson",
          [
            "meson setup build",
            "ninja -C build",
            "ninja -C build install --destdir=\"{PREFIX}\" || true",
          ],
        ))
      },
    },
    Rule {
      name: "gem",
      matches: |src| first_with_extension(src, "gemspec").is_some(),
      plan: |ctx| {
        let gemspec = first_with_extension(ctx.source, "gemspec")?;
        Some(shell_plan(
          "gem",
          [
            format!("gem build {}", gemspec),
            "gem install *.gem --install-dir \"{PREFIX}\" --bindir \"{PREFIX}/bin\" --no-document".to_string(),
          ],
        ))
      },
    },
    Rule {
      name: "swift",
      matches: |src| has(src, "Package.swift"),
      plan: |_| Some(with_native("swift", "swift build -c release", NativeAction::CopySwiftArtifacts)),
    },
    Rule {
      name: "scons",
      matches: |src| has(src, "SConstruct"),
      plan: |_| {
        Some(shell_plan(
          "scons",
          ["scons PREFIX=\"{PREFIX}\"", "scons install PREFIX=\"{PREFIX}\" || true"],
        ))
      },
    },
    Rule {
      name: "gradle",
      matches: |src| has(src, "build.gradle") || has(src, "gradlew"),
      plan: |ctx| {
        let gradle = if has(ctx.source, "gradlew") { "./gradlew" } else { "gradle" };
        Some(with_native(
          "gradle",
          format!("{} build", gradle),
          NativeAction::CopyGradleArtifacts,
        ))
      },
    },
    Rule {
      name: "bazel",
      matches: |src| has(src, "WORKSPACE") || has(src, "BUILD"),
      plan: |_| Some(with_native("bazel", "bazel build //...", NativeAction::CopyBazelArtifacts)),
    },
    Rule {
      name: "dotnet",
      matches: |src| first_with_extension(src, "csproj").is_some(),
      plan: |_| Some(shell_plan("dotnet", ["dotnet publish -c Release -o \"{PREFIX}\""])),
    },
    Rule {
      name: "zig",
      matches: |src| has(src, "build.zig") || has(src, "zig.toml"),
      plan: |_| Some(with_native("zig", "zig build -Drelease-safe", NativeAction::CopyZigArtifacts)),
    },
    Rule {
      name: "maven",
      matches: |src| has(src, "pom.xml"),
      plan: |_| Some(with_native("maven", "mvn package", NativeAction::CopyMavenArtifacts)),
    },
    Rule {
      name: "archive",
      matches: |src| find_archive(src).is_some(),
      plan: |ctx| {
        let (file, ext) = find_archive(ctx.source)?;
        let cmd = if ext == ".zip" {
          format!("unzip -o \"{}\" -d \"{{PREFIX}}\"", file)
        } else {
          format!("tar -xf \"{}\" -C \"{{PREFIX}}\"", file)
        };
        Some(shell_plan("archive", [cmd]))
      },
    },
    Rule {
      name: "mercurial",
      matches: |src| has(src, ".hg"),
      plan: |_| Some(shell_plan("mercurial", ["hg pull", "hg update"])),
    },
    Rule {
      name: "subversion",
      matches: |src| has(src, ".svn"),
      plan: |_| Some(shell_plan("subversion", ["svn update"])),
    },
    Rule {
      name: "copy",
      matches: |_| true,
      plan: |ctx| {
        warn!(source = %ctx.source.display(), "no build system detected, copying files as-is");
        Some(BuildPlan::new("copy", vec![BuildStep::Native(NativeAction::CopyAll)]))
      },
    },
  ]
}

fn has(src: &Path, name: &str) -> bool {
  src.join(name).exists()
}

fn shell_plan<I, S>(detected: &'static str, cmds: I) -> BuildPlan
where
  I: IntoIterator<Item = S>,
  S: Into<String>,
{
  BuildPlan::new(detected, cmds.into_iter().map(BuildStep::shell).collect())
}

fn with_native(detected: &'static str, cmd: impl Into<String>, action: NativeAction) -> BuildPlan {
  BuildPlan::new(detected, vec![BuildStep::shell(cmd), BuildStep::Native(action)])
}

/// Name of the source directory, used for single-binary builds.
fn dir_name(src: &Path) -> String {
  src
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| "app".to_string())
}

/// Sorted top-level file names.
fn top_level_files(src: &Path) -> Vec<String> {
  let Ok(entries) = std::fs::read_dir(src) else {
    return Vec::new();
  };
  let mut names: Vec<String> = entries
    .filter_map(Result::ok)
    .filter(|e| e.path().is_file())
    .map(|e| e.file_name().to_string_lossy().into_owned())
    .collect();
  names.sort();
  names
}

fn first_with_extension(src: &Path, ext: &str) -> Option<String> {
  let suffix = format!(".{}", ext);
  top_level_files(src).into_iter().find(|n| n.ends_with(&suffix))
}

fn find_archive(src: &Path) -> Option<(String, &'static str)> {
  let files = top_level_files(src);
  ARCHIVE_EXTENSIONS
    .iter()
    .find_map(|ext| files.iter().find(|f| f.ends_with(ext)).map(|f| (f.clone(), *ext)))
}

fn python(ctx: &DetectContext<'_>) -> &'static str {
  if ctx.toolchain.find("python3").is_some() {
    "python3"
  } else {
    "python"
  }
}

fn manifest_plan(ctx: &DetectContext<'_>) -> Option<BuildPlan> {
  let manifest = match Manifest::load(ctx.source) {
    Ok(Some(manifest)) => manifest,
    Ok(None) => return None,
    Err(e) => {
      warn!(error = %e, "ignoring unusable manifest");
      return None;
    }
  };

  if !manifest.build_dependencies.is_empty()
    && let Err(e) = ctx.packages.install(&manifest.build_dependencies)
  {
    warn!(error = %e, "failed to install build dependencies");
  }

  let steps = manifest.steps_for(ctx.os).iter().map(BuildStep::shell).collect();
  Some(BuildPlan {
    detected: "manifest",
    steps,
    binaries: manifest.binaries.iter().cloned().collect(),
    metadata: manifest.metadata(),
    dependencies: manifest.dependencies.clone(),
  })
}

fn has_install_target(src: &Path) -> bool {
  MAKEFILES.iter().any(|name| {
    std::fs::read_to_string(src.join(name))
      .map(|content| content.starts_with("install:") || content.contains("\ninstall:"))
      .unwrap_or(false)
  })
}

fn makefile_plan(ctx: &DetectContext<'_>) -> Option<BuildPlan> {
  let Some(make) = MAKE_PROGRAMS.iter().find(|p| ctx.toolchain.find(p).is_some()) else {
    warn!("make not found on PATH; install build tools or add an anvil.json");
    return Some(BuildPlan::empty("makefile"));
  };

  let mut steps = vec![if *make == "nmake" {
    BuildStep::shell("nmake")
  } else {
    BuildStep::shell(format!("{} -j{}", make, ctx.jobs))
  }];

  if has_install_target(ctx.source) {
    steps.push(BuildStep::shell(format!("{} install PREFIX=\"{{PREFIX}}\"", make)));
    steps.push(BuildStep::shell(format!("{} install DESTDIR=\"{{PREFIX}}\"", make)));
    return Some(BuildPlan::new("makefile", steps));
  }

  if has(ctx.source, "go.mod") {
    let name = dir_name(ctx.source);
    steps.push(BuildStep::shell(format!("go build -o \"{{PREFIX}}/bin/{}\" ./...", name)));
    return Some(BuildPlan::new("makefile", steps).with_binaries([name]));
  }

  steps.push(BuildStep::Native(NativeAction::CopyBuildBins));
  Some(BuildPlan::new("makefile", steps))
}

fn cmake_plan(ctx: &DetectContext<'_>) -> Option<BuildPlan> {
  let mut configure = "cmake -S . -B build -DCMAKE_INSTALL_PREFIX=\"{PREFIX}\"".to_string();
  if ctx.os == Some(Os::Windows) {
    configure.push_str(" -A x64");
  }
  Some(shell_plan(
    "cmake",
    [
      configure,
      format!("cmake --build build --config Release --parallel {}", ctx.jobs),
      "cmake --install build --config Release".to_string(),
    ],
  ))
}

/// `src/main.rs`, a non-empty `src/bin/`, or a `[[bin]]` table.
fn has_cargo_binary(src: &Path, cargo_toml: &str) -> bool {
  if src.join("src").join("main.rs").exists() {
    return true;
  }
  let bin_dir = src.join("src").join("bin");
  if std::fs::read_dir(&bin_dir).is_ok_and(|mut entries| entries.next().is_some()) {
    return true;
  }
  cargo_toml.contains("[[bin]]")
}

fn cargo_plan(ctx: &DetectContext<'_>) -> Option<BuildPlan> {
  let cargo_toml = std::fs::read_to_string(ctx.source.join("Cargo.toml")).unwrap_or_default();
  let release = BuildStep::shell("cargo build --release");

  if cargo_toml.contains("[workspace]") && !cargo_toml.contains("[package]") {
    return Some(BuildPlan::new(
      "cargo",
      vec![
        release,
        BuildStep::Native(NativeAction::CopyCargoBins),
        BuildStep::Native(NativeAction::CopyCargoLibs),
      ],
    ));
  }

  if has_cargo_binary(ctx.source, &cargo_toml) {
    return Some(shell_plan("cargo", ["cargo install --path . --root \"{PREFIX}\""]));
  }

  Some(BuildPlan::new(
    "cargo",
    vec![release, BuildStep::Native(NativeAction::CopyCargoLibs)],
  ))
}

fn has_go_files(dir: &Path) -> bool {
  WalkDir::new(dir)
    .into_iter()
    .filter_map(Result::ok)
    .any(|e| e.file_type().is_file() && e.path().extension().is_some_and(|x| x == "go"))
}

fn go_plan(ctx: &DetectContext<'_>) -> Option<BuildPlan> {
  let name = dir_name(ctx.source);
  let cmd_dir = ctx.source.join("cmd");

  let package = if has(ctx.source, "main.go") {
    Some(".".to_string())
  } else if cmd_dir.join(&name).is_dir() && has_go_files(&cmd_dir.join(&name)) {
    Some(format!("./cmd/{}", name))
  } else if cmd_dir.is_dir() && has_go_files(&cmd_dir) {
    let mut subdirs: Vec<String> = std::fs::read_dir(&cmd_dir)
      .ok()?
      .filter_map(Result::ok)
      .filter(|e| e.path().is_dir() && has_go_files(&e.path()))
      .map(|e| e.file_name().to_string_lossy().into_owned())
      .collect();
    subdirs.sort();
    Some(
      subdirs
        .first()
        .map(|sub| format!("./cmd/{}", sub))
        .unwrap_or_else(|| "./cmd".to_string()),
    )
  } else {
    None
  };

  let Some(package) = package else {
    warn!(source = %ctx.source.display(), "no Go main package found (library-only module), skipping build");
    return Some(BuildPlan::empty("go"));
  };

  let cmd = format!("go build -o \"{{PREFIX}}/bin/{}\" {}", name, package);
  Some(shell_plan("go", [cmd]).with_binaries([name]))
}
