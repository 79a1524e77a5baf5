//! File existence and extension checks shared by every resolver

use std::path::{Path, PathBuf};

/// Returns true iff `path` exists and its extension equals `expected` exactly.
///
/// `expected` includes the leading dot (`".idf"`). An empty `expected` means
/// the path must have no extension at all, which is how engine executables
/// are named outside Windows. The comparison is case-sensitive. A missing
/// file is a plain `false`, never an error.
pub fn is_valid_file_type(path: &Path, expected: &str) -> bool {
    if !path.is_file() {
        return false;
    }
    extension_with_dot(path) == expected
}

/// The extension of `path` including its leading dot, or `""` when it has none
pub fn extension_with_dot(path: &Path) -> String {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!(".{ext}"),
        None => String::new(),
    }
}

/// Make `path` absolute against the current directory without touching the
/// file system beyond reading the working directory
pub fn absolute_file_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_existing_file_with_matching_extension() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("house.idf");
        std::fs::write(&model, "Version,9.5;").unwrap();

        assert!(is_valid_file_type(&model, ".idf"));
        assert!(!is_valid_file_type(&model, ".epw"));
    }

    #[test]
    fn test_missing_file_is_false_not_error() {
        let dir = TempDir::new().unwrap();
        assert!(!is_valid_file_type(&dir.path().join("absent.idf"), ".idf"));
    }

    #[test]
    fn test_extension_is_case_sensitive() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("HOUSE.IDF");
        std::fs::write(&model, "").unwrap();

        assert!(!is_valid_file_type(&model, ".idf"));
        assert!(is_valid_file_type(&model, ".IDF"));
    }

    #[test]
    fn test_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("weather.epw");
        std::fs::create_dir(&sub).unwrap();
        assert!(!is_valid_file_type(&sub, ".epw"));
    }

    #[test]
    fn test_empty_expected_extension_matches_bare_names() {
        let dir = TempDir::new().unwrap();
        let exe = dir.path().join("energyplus");
        std::fs::write(&exe, "").unwrap();

        assert!(is_valid_file_type(&exe, ""));
        assert!(!is_valid_file_type(&exe, ".exe"));
    }

    #[test]
    fn test_absolute_file_path_keeps_absolute_input() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("a.idf");
        assert_eq!(absolute_file_path(&p), p);
        assert!(absolute_file_path(Path::new("rel.idf")).is_absolute());
    }

    proptest! {
        #[test]
        fn test_valid_iff_exists_and_extension_matches(
            stem in "[a-z]{1,8}",
            actual in prop::sample::select(vec![".idf", ".epw", ".idd", ".txt"]),
            expected in prop::sample::select(vec![".idf", ".epw", ".idd", ".txt"]),
            create in any::<bool>(),
        ) {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join(format!("{stem}{actual}"));
            if create {
                std::fs::write(&path, "").unwrap();
            }
            prop_assert_eq!(is_valid_file_type(&path, expected), create && actual == expected);
        }
    }
}
