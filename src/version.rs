// Numeric version comparison and the running OS version

use std::cmp::Ordering;
use std::process::Command;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// True when the running OS version is at least `target`
///
/// Resolved at runtime; there is no build-time query for the host OS version.
#[macro_export]
macro_rules! system_version_gte {
    ($target:expr) => {
        $crate::version::system_version_at_least($target)
    };
}

/// Compare dot-separated versions component by component
///
/// Each component compares its leading digits numerically and any trailing
/// text lexically, so `10.10 > 10.9` and `13.0b2 > 13.0b1`. When every shared
/// component is equal the version with more components is greater
/// (`10.0.1 > 10.0`, `10.0 > 10`).
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');

    loop {
        match (left.next(), right.next()) {
            (Some(l), Some(r)) => match compare_component(l, r) {
                Ordering::Equal => continue,
                other => return other,
            },
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (None, None) => return Ordering::Equal,
        }
    }
}

/// `version >= target` under [`compare_versions`]
pub fn version_at_least(version: &str, target: &str) -> bool {
    compare_versions(version, target) != Ordering::Less
}

fn compare_component(a: &str, b: &str) -> Ordering {
    let (a_digits, a_rest) = split_digits(a);
    let (b_digits, b_rest) = split_digits(b);

    if a_digits.is_empty() || b_digits.is_empty() {
        return a.cmp(b);
    }

    compare_digits(a_digits, b_digits).then_with(|| a_rest.cmp(b_rest))
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

// Arbitrary-length decimal comparison without parsing
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Version string reported by the running OS, detected once per process
pub fn system_version() -> Option<&'static str> {
    static SYSTEM_VERSION: OnceLock<Option<String>> = OnceLock::new();
    SYSTEM_VERSION
        .get_or_init(|| {
            let version = detect_system_version();
            debug!(?version, "Detected system version");
            version
        })
        .as_deref()
}

/// True when the running OS version is at least `target`; false if unknown
pub fn system_version_at_least(target: &str) -> bool {
    match system_version() {
        Some(version) => version_at_least(version, target),
        None => {
            warn!(target_version = target, "System version unknown, treating as older");
            false
        }
    }
}

#[cfg(target_os = "linux")]
fn detect_system_version() -> Option<String> {
    std::fs::read_to_string("/proc/sys/kernel/osrelease")
        .ok()
        .and_then(non_empty)
        .or_else(|| command_output("uname", &["-r"]))
}

#[cfg(target_os = "macos")]
fn detect_system_version() -> Option<String> {
    command_output("sw_vers", &["-productVersion"])
}

#[cfg(windows)]
fn detect_system_version() -> Option<String> {
    // "Microsoft Windows [Version 10.0.19045.3803]"
    let banner = command_output("cmd", &["/C", "ver"])?;
    let start = banner.find("Version ")? + "Version ".len();
    let version = &banner[start..];
    let end = version.find(']').unwrap_or(version.len());
    non_empty(version[..end].to_string())
}

#[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
fn detect_system_version() -> Option<String> {
    command_output("uname", &["-r"])
}

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = match Command::new(program).args(args).output() {
        Ok(output) => output,
        Err(e) => {
            debug!(program, error = ?e, "Failed to run version command");
            return None;
        }
    };

    if !output.status.success() {
        debug!(program, status = ?output.status, "Version command failed");
        return None;
    }

    non_empty(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_not_lexical() {
        assert!(version_at_least("10.10", "10.9"));
        assert!(!version_at_least("9.0", "10.0"));
        assert!(version_at_least("10.0.1", "10.0"));
        assert!(version_at_least("10.0", "10.0"));
    }

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("1.2.3", "1.2.3"), Ordering::Equal);
        assert_eq!(compare_versions("1.2", "1.10"), Ordering::Less);
        assert_eq!(compare_versions("10.0", "10"), Ordering::Greater);
        assert_eq!(compare_versions("10", "10.0"), Ordering::Less);
        assert_eq!(compare_versions("007", "7"), Ordering::Equal);
        assert_eq!(
            compare_versions("99999999999999999999999", "99999999999999999999998"),
            Ordering::Greater
        );
    }

    #[test]
    fn test_trailing_text_compares_lexically() {
        assert_eq!(compare_versions("13.0b2", "13.0b1"), Ordering::Greater);
        assert_eq!(compare_versions("6.1.0-rc1", "6.1.0"), Ordering::Greater);
        assert_eq!(compare_versions("6.2.0-rc1", "6.10.0"), Ordering::Less);
    }

    #[test]
    fn test_non_numeric_components() {
        assert_eq!(compare_versions("a", "b"), Ordering::Less);
        assert_eq!(compare_versions("1.x", "1.2"), Ordering::Greater);
        assert_eq!(compare_versions("", "1"), Ordering::Less);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  14.2\n".to_string()), Some("14.2".to_string()));
        assert_eq!(non_empty(" \n".to_string()), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_system_version_detected_on_linux() {
        let version = system_version().unwrap();
        assert!(!version.is_empty());
        assert!(system_version_at_least("0"));
        assert!(system_version_gte!("1"));
        assert!(!system_version_gte!("100000"));
    }
}
