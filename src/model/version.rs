//! Version block extraction
//!
//! The `Version` object is always the first record of its class in a model
//! file, so a single first-match scan is enough and no grammar parse is needed.
//! The scan runs over raw bytes: models are not required to be UTF-8.

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::fmt;

static VERSION_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m-u)^[ \t]*Version[ \t]*,\s*(\d+(?:\.\d+)+)\s*;").expect("Invalid regex pattern")
});

/// A dotted numeric version string such as `9.5` or `22.1.0`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hyphenated form used by installation directories (`9.5.0` -> `9-5-0`)
    pub fn hyphenated(&self) -> String {
        self.0.replace('.', "-")
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Return the first `Version, <dotted-number>;` declaration in `model`.
///
/// `None` is a normal outcome; callers decide whether it is fatal.
pub fn extract_version(model: impl AsRef<[u8]>) -> Option<VersionTag> {
    VERSION_BLOCK
        .captures(model.as_ref())
        .and_then(|caps| caps.get(1))
        .map(|m| VersionTag(String::from_utf8_lossy(m.as_bytes()).into_owned()))
}
