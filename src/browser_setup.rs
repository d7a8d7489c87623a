//! Chrome/Chromium detection.
//!
//! Looks for an existing installation; nothing is downloaded. Set `CHROME`
//! to point at a specific executable.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Result, SearchError};

/// Install locations checked when nothing is found on `PATH`.
#[cfg(target_os = "macos")]
const KNOWN_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
];

#[cfg(all(unix, not(target_os = "macos")))]
const KNOWN_PATHS: &[&str] = &[
    "/opt/google/chrome/chrome",
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/usr/bin/microsoft-edge",
    "/snap/bin/chromium",
];

#[cfg(windows)]
const KNOWN_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
];

/// Executable names looked up on `PATH`.
const KNOWN_COMMANDS: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
    "microsoft-edge",
];

/// Finds an installed browser: `$CHROME` first, then `PATH`, then the
/// platform's usual install locations.
pub fn detect_chrome() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CHROME") {
        let p = PathBuf::from(&path);
        if p.exists() {
            debug!("Using browser from $CHROME: {}", path);
            return Some(p);
        }
    }

    for cmd in KNOWN_COMMANDS {
        if let Ok(path) = which::which(cmd) {
            debug!("Using browser on PATH: {}", path.display());
            return Some(path);
        }
    }

    KNOWN_PATHS
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(|p| {
            debug!("Chrome found at known path: {}", p.display());
            p.to_path_buf()
        })
}

/// Returns `explicit` if it exists, otherwise a detected installation.
pub fn resolve_chrome(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(SearchError::Browser(format!(
            "Chrome executable not found at {}",
            path.display()
        )));
    }
    detect_chrome().ok_or_else(|| {
        SearchError::Browser(
            "No Chrome/Chromium installation found; install one or set CHROME".to_string(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_chrome_returns_existing_path() {
        // None on machines without Chrome.
        if let Some(path) = detect_chrome() {
            assert!(path.exists());
        }
    }

    #[test]
    fn test_resolve_chrome_explicit_missing() {
        let result = resolve_chrome(Some(Path::new("/nonexistent/chrome/binary")));
        assert!(matches!(result, Err(SearchError::Browser(_))));
    }

    #[test]
    fn test_resolve_chrome_explicit_existing() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = resolve_chrome(Some(file.path())).unwrap();
        assert_eq!(path, file.path());
    }

    #[test]
    fn test_known_commands_not_empty() {
        assert!(!KNOWN_COMMANDS.is_empty());
        assert!(!KNOWN_PATHS.is_empty());
    }
}
