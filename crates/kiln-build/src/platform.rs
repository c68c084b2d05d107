//! Platform marker filtering
//!
//! A source named `stem.<marker>.<ext>` is tagged for the platform `<marker>` when
//! `<marker>` is one of the recognised marker values. Untagged sources always
//! build; tagged sources build only when their marker is active. A secondary
//! segment that is not a recognised marker (`a.good.cc`) leaves the file untagged.

use serde::{Deserialize, Serialize};

/// Marker values known on every host
pub const DEFAULT_MARKERS: [&str; 4] = ["posix", "linux", "macos", "windows"];

/// Allow-by-absence, deny-by-mismatch platform filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformFilter {
    markers: Vec<String>,
    active: Vec<String>,
}

impl PlatformFilter {
    /// Create a filter. Active markers are always recognised.
    pub fn new<S: Into<String>>(
        markers: impl IntoIterator<Item = S>,
        active: impl IntoIterator<Item = S>,
    ) -> Self {
        let mut known: Vec<String> = Vec::new();
        for marker in markers.into_iter().map(Into::into) {
            if !known.contains(&marker) {
                known.push(marker);
            }
        }
        let mut enabled: Vec<String> = Vec::new();
        for marker in active.into_iter().map(Into::into) {
            if !known.contains(&marker) {
                known.push(marker.clone());
            }
            if !enabled.contains(&marker) {
                enabled.push(marker);
            }
        }
        Self {
            markers: known,
            active: enabled,
        }
    }

    /// Filter that recognises no markers: every file is untagged
    pub fn none() -> Self {
        Self::new(Vec::<String>::new(), Vec::new())
    }

    /// Filter for the given operating system name (`std::env::consts::OS` values)
    pub fn for_os(os: &str) -> Self {
        let active: &[&str] = match os {
            "linux" => &["linux", "posix"],
            "macos" => &["macos", "posix"],
            "windows" => &["windows"],
            "freebsd" | "netbsd" | "openbsd" | "dragonfly" | "solaris" | "illumos" => {
                &["posix"]
            }
            _ => &[],
        };
        Self::new(DEFAULT_MARKERS, active.iter().copied())
    }

    /// Filter for the host this binary runs on
    pub fn host() -> Self {
        Self::for_os(std::env::consts::OS)
    }

    /// Recognised markers
    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Markers of the active target
    pub fn active(&self) -> &[String] {
        &self.active
    }

    /// The recognised platform marker a file name carries, if any
    pub fn marker_of<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        let (rest, _extension) = file_name.rsplit_once('.')?;
        let (_stem, marker) = rest.rsplit_once('.')?;
        self.markers
            .iter()
            .any(|m| m == marker)
            .then_some(marker)
    }

    /// Whether a file name passes the filter
    pub fn accepts(&self, file_name: &str) -> bool {
        match self.marker_of(file_name) {
            None => true,
            Some(marker) => self.active.iter().any(|a| a == marker),
        }
    }
}

impl Default for PlatformFilter {
    fn default() -> Self {
        Self::host()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a.cc", None)]
    #[case("a.posix.cc", Some("posix"))]
    #[case("a.good.cc", None)]
    #[case("posix.cc", None)]
    #[case(".posix.cc", Some("posix"))]
    #[case("net.windows.c", Some("windows"))]
    #[case("noext", None)]
    fn test_marker_of(#[case] name: &str, #[case] expected: Option<&str>) {
        let filter = PlatformFilter::for_os("linux");
        assert_eq!(filter.marker_of(name), expected);
    }

    #[test]
    fn test_linux_accepts_posix_and_linux() {
        let filter = PlatformFilter::for_os("linux");
        assert!(filter.accepts("io.posix.cc"));
        assert!(filter.accepts("io.linux.cc"));
        assert!(!filter.accepts("io.macos.cc"));
        assert!(!filter.accepts("io.windows.cc"));
        assert!(filter.accepts("io.cc"));
    }

    #[test]
    fn test_windows_rejects_posix() {
        let filter = PlatformFilter::for_os("windows");
        assert!(!filter.accepts("io.posix.cc"));
        assert!(filter.accepts("io.windows.cc"));
        assert!(filter.accepts("io.cc"));
    }

    #[test]
    fn test_single_marker_filter() {
        // Only "posix" is recognised and nothing is active.
        let filter = PlatformFilter::new(["posix"], []);
        assert!(!filter.accepts("b.posix.cc"));
        assert!(filter.accepts("b.linux.cc"));
        assert!(filter.accepts("a.good.cc"));
    }

    #[test]
    fn test_active_markers_are_recognised() {
        let filter = PlatformFilter::new(Vec::<String>::new(), vec!["posix".to_string()]);
        assert_eq!(filter.markers(), &["posix".to_string()]);
        assert!(filter.accepts("b.posix.cc"));
    }

    #[test]
    fn test_none_filter_accepts_everything() {
        let filter = PlatformFilter::none();
        assert!(filter.accepts("b.posix.cc"));
        assert!(filter.accepts("b.windows.cc"));
    }

    #[test]
    fn test_unknown_os_has_no_active_markers() {
        let filter = PlatformFilter::for_os("haiku");
        assert!(filter.active().is_empty());
        assert!(!filter.accepts("b.posix.cc"));
    }
}
