//! JSON helpers for config tables and raid files. Default config lives in ~/.raid-insurance/.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Get the ~/.raid-insurance/ directory path, creating it if needed.
pub fn app_dir() -> io::Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "Could not determine home directory",
        )
    })?;
    let dir = home_dir.join(".raid-insurance");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Load a JSON file, returning `T::default()` if it is missing or invalid.
///
/// A file that exists but fails to parse is logged, since silently running
/// with default odds would hide a broken config.
pub fn load_json_file_or_default<T: Default + DeserializeOwned>(path: &Path) -> T {
    match fs::read_to_string(path) {
        Ok(json) => match serde_json::from_str(&json) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid JSON, using defaults");
                T::default()
            }
        },
        Err(_) => T::default(),
    }
}

/// Read and parse a JSON file, propagating both I/O and parse errors.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> io::Result<T> {
    let json = fs::read_to_string(path)?;
    serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Save a value as pretty-printed JSON at `path`.
pub fn save_json_file<T: Serialize>(path: &Path, data: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("raid-insurance-{}-{}", uuid::Uuid::new_v4(), name))
    }

    #[test]
    fn test_app_dir_is_under_home() {
        let dir = app_dir().expect("app_dir should succeed");
        assert!(dir.ends_with(".raid-insurance"));
        assert!(dir.is_dir());
    }

    #[test]
    fn test_load_missing_returns_default() {
        let val: Vec<String> = load_json_file_or_default(&temp_file("missing.json"));
        assert!(val.is_empty());
    }

    #[test]
    fn test_load_invalid_returns_default() {
        let path = temp_file("invalid.json");
        fs::write(&path, "{ not json").unwrap();

        let val: Vec<String> = load_json_file_or_default(&path);
        assert!(val.is_empty());

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_file("roundtrip.json");
        let data = vec!["hello".to_string(), "world".to_string()];
        save_json_file(&path, &data).expect("save should succeed");

        let loaded: Vec<String> = load_json_file_or_default(&path);
        assert_eq!(loaded, data);

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_read_json_reports_parse_errors() {
        let path = temp_file("bad.json");
        fs::write(&path, "[1, 2").unwrap();

        let result: io::Result<Vec<u32>> = read_json(&path);
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidData);

        fs::remove_file(path).ok();
    }
}
