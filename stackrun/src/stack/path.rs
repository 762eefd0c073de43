//! Canonical, project-absolute stack paths
//!
//! Every stack is keyed by the `/`-separated path of its directory relative
//! to the project root, always starting with `/` (the root itself is `/`).
//! Ordering is plain lexicographic ordering of that string, which is the
//! ordering used everywhere a deterministic iteration order is needed.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Project-absolute path of a stack directory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StackPath(String);

impl StackPath {
    /// The project root
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Build a stack path from a path relative to the project root.
    ///
    /// Returns `None` if the path contains anything other than plain
    /// directory names (`..`, prefixes, or an absolute root).
    pub fn from_relative(rel: &Path) -> Option<Self> {
        let mut segments = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(name) => segments.push(name.to_str()?.to_string()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(Self::from_segments(&segments))
    }

    /// Build a stack path from a filesystem path located under `root`.
    pub fn from_fs_path(root: &Path, path: &Path) -> Option<Self> {
        let rel = path.strip_prefix(root).ok()?;
        Self::from_relative(rel)
    }

    fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        let mut path = String::from("/");
        let joined = segments
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("/");
        path.push_str(&joined);
        Self(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments, empty for the project root
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Last path segment (the directory name), empty for the project root
    pub fn name(&self) -> &str {
        self.segments().last().unwrap_or("")
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Resolve an ordering reference declared by the stack at `self`.
    ///
    /// References starting with `/` are project-absolute; anything else is
    /// relative to `self`. `.` and empty segments are ignored and `..` climbs
    /// one directory. Returns `None` when the reference climbs above the
    /// project root.
    pub fn resolve(&self, reference: &str) -> Option<StackPath> {
        let mut segments: Vec<&str> = if reference.starts_with('/') {
            Vec::new()
        } else {
            self.segments().collect()
        };

        for segment in reference.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop()?;
                }
                name => segments.push(name),
            }
        }

        Some(Self::from_segments(&segments))
    }

    /// Whether `self` is `ancestor` or lies below it
    pub fn is_within(&self, ancestor: &StackPath) -> bool {
        if ancestor.is_root() || self == ancestor {
            return true;
        }
        self.0
            .strip_prefix(ancestor.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Number of segments below the root
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Render `self` relative to `base` for display, e.g. `stacks/a`, `.`
    /// or `../b`.
    pub fn relative_to(&self, base: &StackPath) -> String {
        let own: Vec<&str> = self.segments().collect();
        let from: Vec<&str> = base.segments().collect();
        let common = own
            .iter()
            .zip(from.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut parts: Vec<&str> = std::iter::repeat("..").take(from.len() - common).collect();
        parts.extend_from_slice(&own[common..]);

        if parts.is_empty() {
            ".".to_string()
        } else {
            parts.join("/")
        }
    }

    /// Directory of this stack on disk
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        self.segments().fold(root.to_path_buf(), |acc, s| acc.join(s))
    }
}

impl fmt::Display for StackPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
