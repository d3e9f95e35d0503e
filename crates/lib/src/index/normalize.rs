//! Canonical form of repository URLs.
//!
//! Two index records denote the same repository exactly when their
//! normalized URLs are equal.

/// Normalize a repository URL.
///
/// - surrounding whitespace is trimmed
/// - `user@host:path` becomes `https://host/path`
/// - `ssh://user@host:port/path` becomes `https://host/path`
/// - `http(s)://host/path` has its path stripped of trailing `/` then `.git`
/// - one trailing `/` is dropped and the result lower-cased
pub fn normalize_url(url: &str) -> String {
  let mut url = url.trim().to_string();
  if url.is_empty() {
    return url;
  }

  if !url.contains("://")
    && let Some((user_host, path)) = url.split_once(':')
    && let Some((_, host)) = user_host.split_once('@')
    && !host.is_empty()
  {
    url = format!("https://{}/{}", host, path);
  }

  if url.starts_with("ssh://")
    && let Some((_, netloc, path)) = split_url(&url)
  {
    let host = netloc.rsplit('@').next().unwrap_or(netloc);
    let host = host.split(':').next().unwrap_or(host);
    url = format!("https://{}{}", host, path);
  }

  if let Some((scheme, netloc, path)) = split_url(&url)
    && (scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https"))
    && !netloc.is_empty()
  {
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    url = format!("https://{}{}", netloc.to_lowercase(), path);
  }

  if url.ends_with('/') {
    url.pop();
  }
  url.to_lowercase()
}

/// `(scheme, netloc, path)`; query and fragment are dropped.
fn split_url(url: &str) -> Option<(&str, &str, &str)> {
  let (scheme, rest) = url.split_once("://")?;
  let netloc_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
  let (netloc, tail) = rest.split_at(netloc_end);
  let path_end = tail.find(['?', '#']).unwrap_or(tail.len());
  Some((scheme, netloc, &tail[..path_end]))
}
