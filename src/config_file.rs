//! Persisted user-configuration file handling
//!
//! The saved document mirrors the in-memory hierarchy exactly: driver →
//! application (name, executable) → option (name, value). Serialization is
//! deterministic — struct field order and list order are preserved — so
//! repeated saves of unchanged state produce byte-identical files, and
//! `parse_store(serialize_store(s)) == s` holds for any resolved store.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::user_config::UserConfigStore;

/// Serialize a store into the persisted textual form (pretty JSON).
pub fn serialize_store(store: &UserConfigStore) -> Result<String> {
    serde_json::to_string_pretty(store).context("Failed to serialize user configuration")
}

/// Parse a persisted document back into a store. Exact inverse of
/// `serialize_store`.
pub fn parse_store(text: &str) -> Result<UserConfigStore> {
    serde_json::from_str(text).context("Failed to parse user configuration JSON")
}

/// Load the user configuration from a file.
///
/// A missing file is a first run, not an error: it yields an empty store.
/// A structurally invalid file is a load-time error left to the operator.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<UserConfigStore> {
    let path = path.as_ref();
    if !path.exists() {
        info!("no user configuration at {:?}, starting empty", path);
        return Ok(UserConfigStore::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read user configuration from {:?}", path))?;
    parse_store(&content)
}

/// Save a store to a file, fully replacing any previous content in a
/// single whole-file write.
pub fn save_to_file<P: AsRef<Path>>(store: &UserConfigStore, path: P) -> Result<()> {
    let text = serialize_store(store)?;
    fs::write(&path, text)
        .with_context(|| format!("Failed to write user configuration to {:?}", path.as_ref()))?;
    info!("wrote user configuration to {:?}", path.as_ref());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user_config::{Application, UserDriverConfig};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample_store() -> UserConfigStore {
        let mut driver = UserDriverConfig::new("i965");
        driver
            .application_mut("")
            .unwrap()
            .set_option("vblank_mode", "1");

        let mut app = Application::new("glxgears", "glxgears");
        app.set_option("mesa_glthread", "true");
        app.set_option("lod_bias", "2");
        driver.applications.push(app);

        UserConfigStore {
            drivers: vec![driver],
        }
    }

    #[test]
    fn test_serialize_parse_round_trip() {
        let store = sample_store();
        let text = serialize_store(&store).unwrap();
        let parsed = parse_store(&text).unwrap();
        assert_eq!(parsed, store);
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let store = sample_store();
        let first = serialize_store(&store).unwrap();
        let second = serialize_store(&store).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_save_and_load_file() {
        let store = sample_store();
        let file = NamedTempFile::new().unwrap();

        save_to_file(&store, file.path()).unwrap();
        let loaded = load_from_file(file.path()).unwrap();

        assert_eq!(loaded, store);
    }

    #[test]
    fn test_save_replaces_previous_content() {
        let file = NamedTempFile::new().unwrap();
        save_to_file(&sample_store(), file.path()).unwrap();

        let empty = UserConfigStore::new();
        save_to_file(&empty, file.path()).unwrap();

        let loaded = load_from_file(file.path()).unwrap();
        assert_eq!(loaded, empty);
    }

    #[test]
    fn test_missing_file_is_first_run() {
        let store = load_from_file("/nonexistent/drirc.json").unwrap();
        assert!(store.drivers.is_empty());
    }

    #[test]
    fn test_invalid_document_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[1, 2, 3]").unwrap();
        file.flush().unwrap();

        assert!(load_from_file(file.path()).is_err());
    }
}
