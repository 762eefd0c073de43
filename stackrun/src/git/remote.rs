//! Repository identity derived from a git remote URL

use anyhow::Result;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use super::runner::remote_url;

/// Where a remote points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repository {
    /// Hosted repository, normalized to `host/owner/repo`
    Hosted(String),
    /// A path on the local filesystem
    Local(String),
}

/// scp-like syntax: `[user@]host:path`
fn scp_like() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[A-Za-z0-9._~-]+@)?([A-Za-z0-9.-]+):(.+)$").expect("valid regex")
    })
}

impl Repository {
    /// Normalize a remote URL.
    ///
    /// `git@github.com:org/repo.git`, `https://github.com/org/repo` and
    /// `ssh://git@github.com:22/org/repo.git` all become
    /// `github.com/org/repo`.
    pub fn from_remote_url(url: &str) -> Self {
        let url = url.trim();

        if url.starts_with("file://") || url.starts_with('/') || url.starts_with('.') {
            return Repository::Local(url.to_string());
        }

        let normalized = if let Some((_, rest)) = url.split_once("://") {
            let rest = rest.rsplit_once('@').map_or(rest, |(_, r)| r);
            let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
            let host = host.split_once(':').map_or(host, |(h, _)| h);
            format!("{host}/{path}")
        } else if let Some(caps) = scp_like().captures(url) {
            format!("{}/{}", &caps[1], &caps[2])
        } else if url.split('/').next().is_some_and(|host| host.contains('.')) && url.contains('/') {
            // already `host/owner/repo`
            url.to_string()
        } else {
            return Repository::Local(url.to_string());
        };

        let normalized = normalized.trim_end_matches('/');
        let normalized = normalized.strip_suffix(".git").unwrap_or(normalized);
        Repository::Hosted(normalized.to_lowercase())
    }
}

/// Repository identity of the remote called `remote`, `None` if the remote
/// does not exist
pub fn repository_identity(remote: &str, dir: &Path) -> Result<Option<Repository>> {
    Ok(remote_url(remote, dir)?.map(|url| Repository::from_remote_url(&url)))
}
