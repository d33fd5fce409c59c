//! Path expressions addressing nodes of a configuration tree.
//!
//! Two notations are accepted and may be mixed with brackets:
//!
//! - dotted: `server.listeners[0].port`
//! - comma separated: `server,listeners,0,port`
//!
//! When a path contains a comma, commas and brackets are the only
//! delimiters and dots stay part of the key, so `hosts,example.com,port`
//! addresses the `example.com` key. Otherwise dots delimit as well, except
//! inside brackets: `hosts[example.com].port` addresses the same node.
//! Empty segments are discarded.

use crate::value::ConfigValue;

/// Splits a path expression into its segments.
///
/// # Examples
///
/// ```rust
/// use layerstack_config::path::parse_path;
///
/// assert_eq!(parse_path("a.b[2].c"), vec!["a", "b", "2", "c"]);
/// assert_eq!(parse_path("a,b,2,c"), vec!["a", "b", "2", "c"]);
/// assert_eq!(parse_path("hosts,example.com"), vec!["hosts", "example.com"]);
/// assert_eq!(parse_path("hosts[example.com]"), vec!["hosts", "example.com"]);
/// ```
pub fn parse_path(path: &str) -> Vec<&str> {
    let dots_delimit = !path.contains(',');
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_brackets = false;

    for (i, c) in path.char_indices() {
        let delimits = match c {
            ',' => true,
            '[' => {
                in_brackets = true;
                true
            }
            ']' => {
                in_brackets = false;
                true
            }
            '.' => dots_delimit && !in_brackets,
            _ => false,
        };
        if delimits {
            segments.push(&path[start..i]);
            start = i + c.len_utf8();
        }
    }
    segments.push(&path[start..]);

    segments.retain(|s| !s.is_empty());
    segments
}

/// Walks `root` along the parsed segments of `path`.
///
/// Returns `None` when the path has no segments or when any step is
/// missing; a null or scalar intermediate ends the walk without error.
pub fn resolve<'a>(root: &'a ConfigValue, path: &str) -> Option<&'a ConfigValue> {
    let segments = parse_path(path);
    if segments.is_empty() {
        return None;
    }
    segments
        .into_iter()
        .try_fold(root, |node, segment| node.child(segment))
}
