// Object archives on disk

use crate::id::generate_uuid;
use eyre::{Context, Result, eyre};
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory of named JSON archives
///
/// Saves are atomic: the archive is written to a unique temporary sibling,
/// flushed, and renamed over the target.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open or create the archive directory
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).context("Failed to create files directory")?;
        Ok(Self { dir })
    }

    /// Directory archives are written to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path for `filename`
    pub fn path_for(&self, filename: &str) -> Result<PathBuf> {
        Self::validate_filename(filename)?;
        Ok(self.dir.join(filename))
    }

    /// Serialize `object` to `filename`, replacing any existing file
    pub fn save<T: Serialize + ?Sized>(&self, object: &T, filename: &str) -> Result<()> {
        let path = self.path_for(filename)?;
        // Fixed length; `filename` itself may already be near NAME_MAX
        let tmp_path = self.dir.join(format!(".{}.tmp", generate_uuid()));

        debug!(path = ?path, "Saving object to file");

        if let Err(e) = Self::write_and_rename(object, &tmp_path, &path) {
            match fs::remove_file(&tmp_path) {
                Err(cleanup) if cleanup.kind() != ErrorKind::NotFound => {
                    warn!(path = ?tmp_path, error = ?cleanup, "Failed to remove temporary file");
                }
                _ => {}
            }
            return Err(e);
        }

        Ok(())
    }

    /// Object stored in `filename`, or `None` if the file does not exist
    pub fn load<T: DeserializeOwned>(&self, filename: &str) -> Result<Option<T>> {
        let path = self.path_for(filename)?;

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to open {}", path.display())),
        };

        let object = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to decode {}", path.display()))?;

        Ok(Some(object))
    }

    /// Delete `filename`; returns whether it existed
    pub fn remove(&self, filename: &str) -> Result<bool> {
        let path = self.path_for(filename)?;

        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }

    fn write_and_rename<T: Serialize + ?Sized>(object: &T, tmp_path: &Path, path: &Path) -> Result<()> {
        let file = File::create(tmp_path).context("Failed to create temporary file")?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, object).context("Failed to serialize object")?;
        writer.flush()?;

        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?; // Ensure data is on disk before the rename

        fs::rename(tmp_path, path).with_context(|| format!("Failed to move archive into {}", path.display()))?;
        Ok(())
    }

    /// Filenames are used verbatim but must be a single path component
    fn validate_filename(filename: &str) -> Result<()> {
        if filename.is_empty() {
            return Err(eyre!("Filename cannot be empty"));
        }
        if filename == "." || filename == ".." {
            return Err(eyre!("Invalid filename: {}", filename));
        }
        if filename.contains(['/', '\\', '\0']) {
            return Err(eyre!("Invalid filename: {:?} (must be a single path component)", filename));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::collections::{BTreeMap, HashMap};
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, FileStore) {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path().join("files")).unwrap();
        (temp, store)
    }

    // xorshift filler
    fn pseudo_random_bytes(len: usize) -> Vec<u8> {
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 24) as u8
            })
            .collect()
    }

    #[test]
    fn test_open_creates_directory() {
        let (temp, store) = open_temp();
        assert!(temp.path().join("files").is_dir());
        assert_eq!(store.dir(), temp.path().join("files"));
    }

    #[test]
    fn test_roundtrip_map() {
        let (_temp, store) = open_temp();

        let mut map = BTreeMap::new();
        map.insert("a".to_string(), Value::from(vec![Value::from(1), Value::from(2)]));
        map.insert("b".to_string(), Value::from(true));
        let value = Value::Map(map);

        store.save(&value, "state.json").unwrap();
        let loaded: Option<Value> = store.load("state.json").unwrap();
        assert_eq!(loaded, Some(value));
    }

    #[test]
    fn test_roundtrip_one_mib_blob() {
        let (_temp, store) = open_temp();

        let payload = pseudo_random_bytes(1024 * 1024);
        store.save(&Value::Bytes(payload.clone()), "blob").unwrap();

        let loaded: Option<Value> = store.load("blob").unwrap();
        assert_eq!(loaded, Some(Value::Bytes(payload)));
    }

    #[test]
    fn test_overwrite_and_no_leftover_temp_files() {
        let (_temp, store) = open_temp();

        store.save(&1, "counter").unwrap();
        store.save(&2, "counter").unwrap();
        assert_eq!(store.load::<i64>("counter").unwrap(), Some(2));

        let names: Vec<String> = fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["counter"]);
    }

    #[test]
    fn test_long_filename() {
        let (_temp, store) = open_temp();
        let filename = "a".repeat(240);

        store.save(&2, &filename).unwrap();
        assert_eq!(store.load::<i64>(&filename).unwrap(), Some(2));
    }

    #[test]
    fn test_non_finite_float_replaces_previous_value() {
        let (_temp, store) = open_temp();

        store.save(&Value::Float(1.5), "ratio").unwrap();
        store.save(&Value::Float(f64::INFINITY), "ratio").unwrap();
        assert_eq!(store.load::<Value>("ratio").unwrap(), Some(Value::Float(f64::INFINITY)));

        store.save(&Value::Float(f64::NAN), "ratio").unwrap();
        match store.load::<Value>("ratio").unwrap() {
            Some(Value::Float(f)) => assert!(f.is_nan()),
            other => panic!("expected NaN float, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_none() {
        let (_temp, store) = open_temp();
        assert!(store.load::<Value>("nothing-here").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let (_temp, store) = open_temp();
        fs::write(store.dir().join("broken"), b"{not json").unwrap();
        assert!(store.load::<Value>("broken").is_err());
    }

    #[test]
    fn test_remove() {
        let (_temp, store) = open_temp();
        store.save("text", "note").unwrap();

        assert!(store.remove("note").unwrap());
        assert!(!store.remove("note").unwrap());
        assert!(store.load::<String>("note").unwrap().is_none());
    }

    #[test]
    fn test_validate_filename() {
        assert!(FileStore::validate_filename("valid.json").is_ok());
        assert!(FileStore::validate_filename(".hidden").is_ok());

        assert!(FileStore::validate_filename("").is_err());
        assert!(FileStore::validate_filename(".").is_err());
        assert!(FileStore::validate_filename("..").is_err());
        assert!(FileStore::validate_filename("a/b").is_err());
        assert!(FileStore::validate_filename("a\\b").is_err());
        assert!(FileStore::validate_filename("a\0b").is_err());
    }

    #[test]
    fn test_failed_save_keeps_previous_file() {
        let (_temp, store) = open_temp();
        store.save("first", "keep").unwrap();

        // JSON object keys must be strings
        let mut unencodable = HashMap::new();
        unencodable.insert((1, 2), 3);
        assert!(store.save(&unencodable, "keep").is_err());

        assert_eq!(store.load::<String>("keep").unwrap(), Some("first".to_string()));
        let entries = fs::read_dir(store.dir()).unwrap().count();
        assert_eq!(entries, 1);
    }
}
