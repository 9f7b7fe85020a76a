//! Build-name and config-section naming conventions.
//!
//! Pure string helpers shared by every event type: formatting canonical
//! build names, mapping event keywords to their config sections, and
//! splitting launch-control targets into their board/variant parts.

/// Suffix of config sections that hold per-event parameters.
const SECTION_SUFFIX: &str = "_params";

/// Final path component of a latest-build lookup key.
const LATEST_BUILD_SUFFIX: &str = "LATEST";

/// Format a canonical build name from its components.
///
/// `build_name("x86-alex", "release", 20, "2015.0.0")` yields
/// `"x86-alex-release/R20-2015.0.0"`. Inputs are interpolated as-is;
/// callers are responsible for well-formed components.
pub fn build_name(board: &str, build_type: &str, milestone: u32, manifest: &str) -> String {
    format!("{}-{}/R{}-{}", board, build_type, milestone, manifest)
}

/// Config section name for an event keyword, e.g. `"nightly"` → `"nightly_params"`.
pub fn section_name(keyword: &str) -> String {
    format!("{}{}", keyword, SECTION_SUFFIX)
}

/// Whether a config section name belongs to an event type.
///
/// Used to tell event parameter sections apart from the rest of the
/// scheduler configuration.
pub fn honored_section(section: &str) -> bool {
    section.ends_with(SECTION_SUFFIX)
}

/// Lookup key for the latest launch-control build of `branch`/`target`.
pub fn latest_build_key(branch: &str, target: &str) -> String {
    format!("{}/{}/{}", branch, target, LATEST_BUILD_SUFFIX)
}

/// Split a launch-control target into `(board, variant)`.
///
/// Targets combine a board name and a build flavor, e.g. `"shamu-eng"` or
/// `"flounder_lte-userdebug"`. The split happens at the last `-` so board
/// names containing underscores pass through intact. Returns `None` when
/// the target has no separator.
pub fn parse_target(target: &str) -> Option<(&str, &str)> {
    target.rsplit_once('-')
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── build_name ──────────────────────────────────────────────────

    #[test]
    fn build_name_formats_components() {
        assert_eq!(
            build_name("x86-alex", "release", 20, "2015.0.0"),
            "x86-alex-release/R20-2015.0.0"
        );
    }

    #[test]
    fn build_name_factory_type() {
        assert_eq!(
            build_name("x86-alex", "factory", 19, "2077.0.5"),
            "x86-alex-factory/R19-2077.0.5"
        );
    }

    // ── section_name / honored_section ──────────────────────────────

    #[test]
    fn section_name_appends_suffix() {
        assert_eq!(section_name("nightly"), "nightly_params");
        assert_eq!(section_name("weekly"), "weekly_params");
    }

    #[test]
    fn honored_section_requires_suffix() {
        assert!(honored_section("nightly_params"));
        assert!(!honored_section("nightly"));
        assert!(!honored_section("general"));
    }

    // ── latest_build_key ────────────────────────────────────────────

    #[test]
    fn latest_build_key_formats_branch_and_target() {
        assert_eq!(
            latest_build_key("git_mnc_release", "shamu-eng"),
            "git_mnc_release/shamu-eng/LATEST"
        );
    }

    // ── parse_target ────────────────────────────────────────────────

    #[test]
    fn parse_target_splits_at_last_dash() {
        assert_eq!(parse_target("shamu-eng"), Some(("shamu", "eng")));
        assert_eq!(
            parse_target("flounder_lte-userdebug"),
            Some(("flounder_lte", "userdebug"))
        );
    }

    #[test]
    fn parse_target_without_separator() {
        assert_eq!(parse_target("shamu"), None);
    }
}
