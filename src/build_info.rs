//! Version and revision stamped in by `build.rs`.

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git revision: a short hash, `<hash>+dirty`, or `unknown`.
pub const REVISION: &str = env!("TASKPLAN_BUILD_REV");

/// `0.1.0 (abc1234)`, used in logs.
#[must_use]
pub fn version_string() -> String {
    format!("{VERSION} ({REVISION})")
}

/// `v0.1.0 abc1234` for the TUI header, with a trailing `*` for dirty trees.
#[must_use]
pub fn short_version() -> String {
    match REVISION.strip_suffix("+dirty") {
        Some(hash) => format!("v{VERSION} {hash}*"),
        None => format!("v{VERSION} {REVISION}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_strings_carry_revision() {
        assert_eq!(version_string(), format!("{VERSION} ({REVISION})"));

        let short = short_version();
        assert!(short.starts_with(&format!("v{VERSION} ")));
        assert_eq!(short.ends_with('*'), REVISION.ends_with("+dirty"));
        assert!(!short.contains("+dirty"));
    }
}
