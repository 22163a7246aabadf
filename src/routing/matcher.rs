//! Mount matching logic.
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Matching is segment-aware: "/api/bank" does not own "/api/banks"
//! - No regex to guarantee O(n) matching

/// Matches a request path against a route's mount point.
#[derive(Debug, Clone)]
pub struct MountMatcher {
    mount: String,
}

impl MountMatcher {
    pub fn new(mount: impl Into<String>) -> Self {
        Self {
            mount: mount.into(),
        }
    }

    pub fn mount(&self) -> &str {
        &self.mount
    }

    /// Returns the remainder of `path` after the mount, or `None` if the
    /// mount does not own this path. The remainder is empty or starts with '/'.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.mount == "/" {
            return Some(path);
        }
        let rest = path.strip_prefix(self.mount.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}
