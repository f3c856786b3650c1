//! Platform-specific paths for configuration and detection tracks.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/herakoi/` (Linux), `~/Library/Application Support/herakoi/` (macOS), `%APPDATA%\herakoi\` (Windows)
//! - **User tracks**: `tracks/` below the user config directory
//!
//! # Example
//!
//! ```rust,no_run
//! use herakoi_config::paths;
//!
//! if let Some(path) = paths::find_config() {
//!     println!("Using config at: {:?}", path);
//! }
//! ```

use std::path::{Path, PathBuf};

/// Application name used for directory paths.
const APP_NAME: &str = "herakoi";

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "herakoi.toml";

/// Subdirectory name for detection tracks.
const TRACKS_SUBDIR: &str = "tracks";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the user-specific detection track directory.
pub fn user_tracks_dir() -> PathBuf {
    user_config_dir().join(TRACKS_SUBDIR)
}

/// Path of the user configuration file, whether or not it exists.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE_NAME)
}

/// Find the configuration file to use.
///
/// Searches in the following order:
/// 1. `herakoi.toml` in the current directory
/// 2. The user configuration directory
pub fn find_config() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    let user = default_config_path();
    if user.is_file() {
        return Some(user);
    }

    None
}

/// Find a detection track by path or name.
///
/// The name can be a path to a JSON file, or a track name (with or without
/// `.json`) looked up in the user track directory.
pub fn find_track(name: &str) -> Option<PathBuf> {
    find_track_in(name, &user_tracks_dir())
}

fn find_track_in(name: &str, dir: &Path) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }

    let filename = if name.ends_with(".json") {
        name.to_string()
    } else {
        format!("{}.json", name)
    };

    let candidate = dir.join(filename);
    candidate.is_file().then_some(candidate)
}

/// Ensure the user config directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_config_dir() -> Result<PathBuf, crate::ConfigError> {
    ensure_dir(user_config_dir())
}

/// Ensure the user track directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_tracks_dir() -> Result<PathBuf, crate::ConfigError> {
    ensure_dir(user_tracks_dir())
}

fn ensure_dir(dir: PathBuf) -> Result<PathBuf, crate::ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| crate::ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

/// List the track files in the user track directory.
///
/// Returns an empty vector if the directory doesn't exist or can't be read.
pub fn list_user_tracks() -> Vec<PathBuf> {
    list_tracks_in_dir(&user_tracks_dir())
}

fn list_tracks_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut tracks: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    tracks.sort();
    tracks
}

/// Get the track name from a file path (the file stem).
pub fn track_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn config_path_is_inside_user_dir() {
        let path = default_config_path();
        assert!(path.starts_with(user_config_dir()));
        assert!(path.ends_with(CONFIG_FILE_NAME));
        assert!(user_tracks_dir().ends_with("herakoi/tracks"));
    }

    #[test]
    fn finds_track_by_name_and_extension() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("sweep.json"), "{}").unwrap();

        let by_name = find_track_in("sweep", dir.path()).unwrap();
        let by_file = find_track_in("sweep.json", dir.path()).unwrap();
        assert_eq!(by_name, by_file);
        assert!(find_track_in("missing", dir.path()).is_none());
    }

    #[test]
    fn finds_track_by_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("elsewhere.json");
        std::fs::write(&path, "{}").unwrap();
        let other = TempDir::new().unwrap();
        assert_eq!(find_track_in(path.to_str().unwrap(), other.path()), Some(path));
    }

    #[test]
    fn lists_only_json_files_sorted() {
        let dir = TempDir::new().unwrap();
        for name in ["b.json", "a.json", "notes.txt"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        let names: Vec<String> = list_tracks_in_dir(dir.path())
            .iter()
            .filter_map(|p| track_name_from_path(p))
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn missing_dir_lists_nothing() {
        assert!(list_tracks_in_dir(Path::new("/nonexistent/herakoi/tracks")).is_empty());
    }
}
