//! Build failure diagnostics.
//!
//! Maps captured stderr from a failed build step to human-readable
//! suggestions. Two signature families are recognized independently:
//!
//! - MSVC `LNK2038` runtime-library mismatch (`/MD` vs `/MT`)
//! - position-independent-code relocation failures on ELF targets
//!
//! Purely advisory: nothing here changes how a build proceeds.

const MISMATCH_MARKER: &str = "' doesn't match value '";
const VALUE_MARKER: &str = "value '";

/// Suggestions for a failed step's stderr; empty when nothing is recognized.
pub fn analyze(stderr: &str) -> Vec<String> {
  let mut suggestions = Vec::new();
  if stderr.is_empty() {
    return suggestions;
  }

  if stderr.contains("LNK2038") && stderr.contains("RuntimeLibrary") {
    match runtime_tags(stderr) {
      Some((left, right)) => suggestions.push(format!(
        "Detected MSVC runtime mismatch between {} and {}. Consider building with a consistent C runtime.",
        left, right
      )),
      None => suggestions.push(
        "Detected MSVC runtime mismatch (LNK2038). Consider building with consistent /MD or /MT options.".to_string(),
      ),
    }
    suggestions.push("Fix options to try:".to_string());
    suggestions.push(
      concat!(
        " - Set environment variable ANVIL_MSVC_RUNTIME=MD (default dynamic CRT)",
        " or ANVIL_MSVC_RUNTIME=MT (static CRT)"
      )
      .to_string(),
    );
    suggestions.push(
      " - For per-package control, add \"msvc_runtime\": \"MD\" or \"MT\" to the project's anvil.json".to_string(),
    );
    suggestions.push(
      " - For CMake projects, pass -DCMAKE_MSVC_RUNTIME_LIBRARY=MultiThreadedDLL or MultiThreaded to match".to_string(),
    );
  }

  if stderr.contains("recompile with -fPIC") || (stderr.contains("relocation") && stderr.contains("R_X86_64")) {
    suggestions.push(
      "Detected link-time relocation errors suggesting -fPIC is required for shared libraries.".to_string(),
    );
    suggestions.push("Fix options to try:".to_string());
    suggestions.push(
      " - Set environment variable ANVIL_FORCE_PIC=1 to add -fPIC to CFLAGS/CXXFLAGS when building".to_string(),
    );
    suggestions.push(
      " - Add \"force_pic\": true to the project's anvil.json, or pass --force-pic to forge".to_string(),
    );
  }

  suggestions
}

/// Extract the two runtime tags from
/// `value 'MD_DynamicRelease' doesn't match value 'MT_StaticRelease'`.
fn runtime_tags(text: &str) -> Option<(String, String)> {
  for (idx, _) in text.match_indices(MISMATCH_MARKER) {
    let before = &text[..idx];
    let Some(start) = before.rfind(VALUE_MARKER) else {
      continue;
    };
    let left = &before[start + VALUE_MARKER.len()..];

    let after = &text[idx + MISMATCH_MARKER.len()..];
    let Some(end) = after.find('\'') else {
      continue;
    };
    let right = &after[..end];

    if let (Some(l), Some(r)) = (runtime_tag(left), runtime_tag(right)) {
      return Some((l.to_string(), r.to_string()));
    }
  }
  None
}

fn runtime_tag(value: &str) -> Option<&str> {
  let (tag, _) = value.split_once('_')?;
  (!tag.is_empty() && tag.chars().all(|c| c.is_ascii_uppercase())).then_some(tag)
}
