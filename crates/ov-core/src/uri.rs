//! `viking://` URI parsing and tenant-prefixed path mapping.
//!
//! These functions are pure and total: they never touch a backend, and they
//! round-trip (`path_to_uri(uri_to_path(u, a), a) == u`).

const SCHEME: &str = "viking://";
const BACKEND_ROOT: &str = "/local";

/// `viking://X` -> `/local/<account_id>/X`; `viking://` -> `/local/<account_id>`.
/// With no `account_id` (or an empty one), the account segment is omitted —
/// this is the ROOT-caller path used to reach `/local/_system/...` and other
/// account-agnostic locations.
pub fn uri_to_path(uri: &str, account_id: Option<&str>) -> String {
    let rest = uri.strip_prefix(SCHEME).unwrap_or(uri);
    let rest = rest.trim_start_matches('/');
    let mut path = BACKEND_ROOT.to_string();
    if let Some(acct) = account_id.filter(|a| !a.is_empty()) {
        path.push('/');
        path.push_str(acct);
    }
    if !rest.is_empty() {
        path.push('/');
        path.push_str(rest);
    }
    path
}

/// Inverse of [`uri_to_path`]. Tolerates being handed an already-`viking://`
/// value (pass-through), per spec.
pub fn path_to_uri(path: &str, account_id: Option<&str>) -> String {
    if path.starts_with(SCHEME) {
        return path.to_string();
    }
    let rest = path.strip_prefix(BACKEND_ROOT).unwrap_or(path);
    let rest = rest.trim_start_matches('/');
    let rest = match account_id.filter(|a| !a.is_empty()) {
        Some(acct) => {
            let prefix = format!("{acct}/");
            rest.strip_prefix(prefix.as_str()).unwrap_or(rest)
        }
        None => rest,
    };
    format!("{SCHEME}{rest}")
}

/// The second URI segment, when the first is one of `user`/`agent`/`session`.
/// `None` for `resources/...` and for the bare structural roots.
pub fn extract_space_from_uri(uri: &str) -> Option<String> {
    let rest = uri.strip_prefix(SCHEME).unwrap_or(uri);
    let mut segments = rest.split('/').filter(|s| !s.is_empty());
    let first = segments.next()?;
    if matches!(first, "user" | "agent" | "session") {
        segments.next().map(|s| s.to_string())
    } else {
        None
    }
}

/// The first URI segment ("resources", "user", "agent", "session", or "" for
/// the bare tenant root).
pub fn extract_top_space(uri: &str) -> &str {
    let rest = uri.strip_prefix(SCHEME).unwrap_or(uri);
    rest.split('/').find(|s| !s.is_empty()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_to_path_with_account() {
        assert_eq!(
            uri_to_path("viking://resources/foo.txt", Some("acme")),
            "/local/acme/resources/foo.txt"
        );
    }

    #[test]
    fn uri_to_path_root() {
        assert_eq!(uri_to_path("viking://", Some("acme")), "/local/acme");
    }

    #[test]
    fn uri_to_path_no_account_for_root() {
        assert_eq!(uri_to_path("viking://_system/accounts.json", None), "/local/_system/accounts.json");
    }

    #[test]
    fn path_to_uri_with_account() {
        assert_eq!(
            path_to_uri("/local/acme/resources/foo.txt", Some("acme")),
            "viking://resources/foo.txt"
        );
    }

    #[test]
    fn path_to_uri_passthrough() {
        assert_eq!(path_to_uri("viking://resources/x", Some("acme")), "viking://resources/x");
    }

    #[test]
    fn round_trip_forward() {
        for (uri, acct) in [
            ("viking://resources/a/b.txt", "acme"),
            ("viking://user/abc123/memories", "tenant-1"),
            ("viking://", "acme"),
        ] {
            let path = uri_to_path(uri, Some(acct));
            assert_eq!(path_to_uri(&path, Some(acct)), normalize(uri));
        }
    }

    fn normalize(uri: &str) -> String {
        if uri == "viking://" {
            "viking://".to_string()
        } else {
            uri.to_string()
        }
    }

    #[test]
    fn round_trip_backward() {
        for path in ["/local/acme/resources/x", "/local/_system/accounts.json"] {
            let uri = path_to_uri(path, None);
            assert_eq!(uri_to_path(&uri, None), path);
        }
    }

    #[test]
    fn extract_space_user() {
        assert_eq!(
            extract_space_from_uri("viking://user/abc123/memories/pref"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn extract_space_agent() {
        assert_eq!(
            extract_space_from_uri("viking://agent/xyz/skills"),
            Some("xyz".to_string())
        );
    }

    #[test]
    fn extract_space_resources_is_none() {
        assert_eq!(extract_space_from_uri("viking://resources/foo"), None);
    }

    #[test]
    fn extract_space_root_is_none() {
        assert_eq!(extract_space_from_uri("viking://"), None);
    }

    #[test]
    fn extract_top_space_variants() {
        assert_eq!(extract_top_space("viking://resources/a"), "resources");
        assert_eq!(extract_top_space("viking://user/x"), "user");
        assert_eq!(extract_top_space("viking://"), "");
    }
}
