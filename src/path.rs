//! Pure path translation between logical paths and Dropbox paths.
//!
//! Logical paths never carry a leading slash and never mention the prefix.
//! Dropbox paths are absolute (`/prefix/a/b`), with the account root spelled `""`.

/// Trim surrounding slashes from a configured prefix
pub fn normalize_prefix(prefix: &str) -> String {
    prefix.trim_matches('/').to_string()
}

/// Turn a logical path into the absolute path sent to Dropbox
pub fn apply_prefix(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let path = path.trim_matches('/');

    let joined = match (prefix.is_empty(), path.is_empty()) {
        (true, true) => return String::new(),
        (true, false) => path.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}/{}", prefix, path),
    };

    format!("/{}", joined)
}

/// Strip the prefix from a path returned by Dropbox
///
/// The prefix is matched segment by segment ignoring case (full Unicode
/// lowercasing), since `path_lower` is lowercased while the configured prefix
/// may not be. Paths outside the prefix come back without their leading slash
/// but otherwise untouched.
pub fn remove_prefix(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let path = path.trim_start_matches('/');

    if prefix.is_empty() {
        return path.to_string();
    }

    let mut rest = Some(path);
    for expected in prefix.split('/') {
        let Some(current) = rest else {
            return path.to_string();
        };

        let (segment, tail) = match current.split_once('/') {
            Some((segment, tail)) => (segment, Some(tail)),
            None => (current, None),
        };

        // "prefixed/x" is not under "prefix"
        if segment.to_lowercase() != expected.to_lowercase() {
            return path.to_string();
        }
        rest = tail;
    }

    rest.unwrap_or_default().to_string()
}

/// Rebuild a case-correct display path from a lowercase path and a leaf name
///
/// The parent portion comes from `lower_path` with the prefix removed and the
/// leaf is `name` exactly as the remote reported it.
pub fn display_path(lower_path: &str, name: &str, prefix: &str) -> String {
    let relative = remove_prefix(prefix, lower_path);

    match relative.rsplit_once('/') {
        Some((parent, _)) => format!("{}/{}", parent, name),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_prefix() {
        assert_eq!(apply_prefix("prefix", "something"), "/prefix/something");
        assert_eq!(apply_prefix("prefix", "/something"), "/prefix/something");
        assert_eq!(apply_prefix("/prefix/", "a/b/"), "/prefix/a/b");
        assert_eq!(apply_prefix("prefix", ""), "/prefix");
    }

    #[test]
    fn test_apply_prefix_empty_prefix() {
        assert_eq!(apply_prefix("", "one"), "/one");
        assert_eq!(apply_prefix("", ""), "");
        assert_eq!(apply_prefix("", "/"), "");
    }

    #[test]
    fn test_remove_prefix() {
        assert_eq!(remove_prefix("prefix", "/prefix/something"), "something");
        assert_eq!(remove_prefix("prefix", "/prefix/a/b"), "a/b");
        assert_eq!(remove_prefix("prefix", "/prefix"), "");

        // Relative paths and paths outside the prefix
        assert_eq!(remove_prefix("prefix", "dirname/file"), "dirname/file");
        assert_eq!(remove_prefix("prefix", "/prefixed/file"), "prefixed/file");
        assert_eq!(remove_prefix("prefix", "/other/file"), "other/file");
    }

    #[test]
    fn test_remove_prefix_ignores_case() {
        assert_eq!(remove_prefix("Prefix", "/prefix/dirname"), "dirname");
        assert_eq!(remove_prefix("prefix", "/Prefix/Dirname/File"), "Dirname/File");
    }

    #[test]
    fn test_remove_prefix_non_ascii() {
        assert_eq!(remove_prefix("Über", "/über/x"), "x");
        assert_eq!(remove_prefix("Über/Akten", "/über/akten/Report.pdf"), "Report.pdf");
        assert_eq!(remove_prefix("ÜBER", "/über"), "");

        // Lowercasing "İ" yields "i" plus a combining dot, changing the byte length
        assert_eq!(remove_prefix("İstanbul", "/i\u{307}stanbul/x"), "x");
        assert_eq!(remove_prefix("İstanbul", "/i\u{307}stanbul2/x"), "i\u{307}stanbul2/x");
    }

    #[test]
    fn test_remove_prefix_longer_than_path() {
        assert_eq!(remove_prefix("base/path", "/base"), "base");
        assert_eq!(remove_prefix("base/path", "/base/other/x"), "base/other/x");
    }

    #[test]
    fn test_remove_prefix_nested() {
        assert_eq!(remove_prefix("base/path", "/base/path/config"), "config");
        assert_eq!(remove_prefix("/base/path/", "/base/path/config/sub"), "config/sub");
    }

    #[test]
    fn test_display_path_preserves_leaf_case() {
        assert_eq!(display_path("/prefix/dirname", "Dirname", "prefix"), "Dirname");
        assert_eq!(display_path("/prefix/dirname/file", "File", "prefix"), "dirname/File");
        assert_eq!(display_path("/one", "One", ""), "One");
        assert_eq!(display_path("/über/akten/report.pdf", "Report.pdf", "Über"), "akten/Report.pdf");
    }

    #[test]
    fn test_display_path_is_inverse_of_apply_prefix() {
        let remote = apply_prefix("prefix", "pass/please");
        assert_eq!(display_path(&remote, "please", "prefix"), "pass/please");
    }
}
