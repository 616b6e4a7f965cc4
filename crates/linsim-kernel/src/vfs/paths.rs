//! Lexical path helpers.
//!
//! Paths in the tree are absolute, slash-separated strings with no `.`, `..`,
//! empty segments, or trailing slash (except `"/"` itself).

/// Normalize `input` against `cwd`.
///
/// Absolute inputs ignore `cwd`. `..` at the root stays at the root.
pub fn normalize(cwd: &str, input: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    if !input.starts_with('/') {
        segments.extend(cwd.split('/').filter(|s| !s.is_empty()));
    }
    for segment in input.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    from_segments(&segments)
}

/// Join segments into an absolute path.
pub fn from_segments(segments: &[&str]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        out.push_str(segment);
    }
    out
}

/// True if `path` is already in canonical form.
pub fn is_normalized(path: &str) -> bool {
    if path == "/" {
        return true;
    }
    path.starts_with('/')
        && path[1..]
            .split('/')
            .all(|s| !s.is_empty() && s != "." && s != "..")
}

/// Parent path. The root's parent is the root.
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

/// Final segment; empty for the root.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

/// Append one child name to a directory path.
pub fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// True if `path` equals `ancestor` or lies beneath it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor == "/" {
        return true;
    }
    path == ancestor
        || (path.len() > ancestor.len()
            && path.starts_with(ancestor)
            && path.as_bytes()[ancestor.len()] == b'/')
}

/// Re-root `path` from `from` onto `to`. `path` must be within `from`.
pub fn rebase(path: &str, from: &str, to: &str) -> String {
    if path == from {
        return to.to_string();
    }
    let rest = if from == "/" { &path[1..] } else { &path[from.len() + 1..] };
    join(to, rest)
}

/// Successive prefixes of an absolute path, excluding the root:
/// `/a/b/c` → `/a`, `/a/b`, `/a/b/c`.
pub fn prefixes(path: &str) -> impl Iterator<Item = &str> {
    path.char_indices()
        .skip(1)
        .filter(|&(_, c)| c == '/')
        .map(|(idx, _)| &path[..idx])
        .chain(std::iter::once(path).filter(|p| *p != "/"))
}
