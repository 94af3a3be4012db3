//! Root-prefix composition for object keys.
//!
//! Keys are plain strings. The only rewriting done here happens at the
//! junction between a root and a relative path: exactly one `/` separates
//! them. `..`, interior duplicate separators and case are left to the caller.

/// Key separator.
pub const SEPARATOR: char = '/';

/// Resolve `path` against `root`.
///
/// # Arguments
/// * `root` - Root prefix, possibly empty
/// * `path` - Path relative to the root
///
/// # Returns
/// `path` unchanged when `root` is empty, otherwise `root/path` with a single
/// separator at the junction.
pub fn resolve_path(root: &str, path: &str) -> String {
    if root.is_empty() {
        return path.to_string();
    }
    let root: &str = root.trim_end_matches(SEPARATOR);
    let path: &str = path.trim_start_matches(SEPARATOR);
    let mut resolved = String::with_capacity(root.len() + path.len() + 1);
    resolved.push_str(root);
    resolved.push(SEPARATOR);
    resolved.push_str(path);
    resolved
}

/// Compute the root of a sub-view scoped at `sub_path` below `root`.
///
/// Scoping uses the same junction rule as [`resolve_path`], so
/// `scope_root(&scope_root(r, a), b) == scope_root(r, &scope_root(a, b))`.
pub fn scope_root(root: &str, sub_path: &str) -> String {
    resolve_path(root, sub_path)
}
