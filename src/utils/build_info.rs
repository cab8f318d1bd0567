//! Commit and date stamped in by build.rs, shown by `--version`.

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// One-line version string for the CLI.
pub fn version_line() -> String {
    format!(
        "raid-insurance {} ({} {})",
        env!("CARGO_PKG_VERSION"),
        BUILD_DATE,
        BUILD_COMMIT
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_commit_is_short_hash_or_unknown() {
        assert!(
            BUILD_COMMIT == "unknown"
                || (BUILD_COMMIT.len() == 7
                    && BUILD_COMMIT.chars().all(|c| c.is_ascii_hexdigit()))
        );
    }

    #[test]
    fn test_build_date_is_stamped() {
        assert!(!BUILD_DATE.is_empty());
        assert!(version_line().contains(BUILD_DATE));
    }

    #[test]
    fn test_version_line_mentions_commit() {
        let line = version_line();
        assert!(line.starts_with("raid-insurance "));
        assert!(line.contains(BUILD_COMMIT));
    }
}
