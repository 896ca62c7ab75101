// Process-wide façade over the preference and file stores
//
// Every operation here is best-effort: failures are logged and turned into
// `None`, `false` or a no-op. Use `Preferences` and `FileStore` directly to
// see the errors.

use crate::config::Config;
use crate::files::FileStore;
use crate::preferences::Preferences;
use eyre::{Result, eyre};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::{Mutex, OnceLock};
use tracing::{debug, warn};

static CONFIG: OnceLock<Config> = OnceLock::new();
static PREFERENCES: Mutex<Option<Preferences>> = Mutex::new(None);

/// Register the config used by the shared stores
///
/// Must run before the first shared operation; afterwards the config is fixed
/// for the life of the process.
pub fn init(config: Config) -> Result<()> {
    CONFIG
        .set(config)
        .map_err(|_| eyre!("Shared stores already initialized"))
}

/// Config in effect, loading the user's config file on first use
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::load_or_default)
}

fn with_preferences<R>(f: impl FnOnce(&Preferences) -> Result<R>) -> Result<R> {
    let mut guard = PREFERENCES.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(prefs) = guard.as_ref() {
        return f(prefs);
    }

    let prefs = Preferences::open(config().preferences_path())?;
    let result = f(&prefs);
    *guard = Some(prefs);
    result
}

fn files() -> Result<FileStore> {
    FileStore::open(config().files_path())
}

fn is_blank(key: &str) -> bool {
    if key.trim().is_empty() {
        debug!("Ignoring empty preference key");
        return true;
    }
    false
}

// ============================================================================
// Preferences
// ============================================================================

/// Save `value` under `key` in the shared preference store
pub fn save_object<T: Serialize + ?Sized>(key: &str, value: &T) {
    if is_blank(key) {
        return;
    }
    if let Err(e) = with_preferences(|prefs| prefs.set_object(key, value)) {
        warn!(key, error = ?e, "Failed to save preference");
    }
}

/// Value saved under `key`; `None` if absent or undecodable
pub fn object_for_key<T: DeserializeOwned>(key: &str) -> Option<T> {
    if is_blank(key) {
        return None;
    }
    match with_preferences(|prefs| prefs.object(key)) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = ?e, "Failed to read preference");
            None
        }
    }
}

/// Save a boolean under `key` in the shared preference store
pub fn save_bool(key: &str, value: bool) {
    if is_blank(key) {
        return;
    }
    if let Err(e) = with_preferences(|prefs| prefs.set_bool(key, value)) {
        warn!(key, error = ?e, "Failed to save boolean preference");
    }
}

/// Boolean saved under `key`; `false` if absent or undecodable
pub fn bool_for_key(key: &str) -> bool {
    if is_blank(key) {
        return false;
    }
    with_preferences(|prefs| prefs.bool(key)).unwrap_or_else(|e| {
        warn!(key, error = ?e, "Failed to read boolean preference");
        false
    })
}

/// Remove every boolean saved with [`save_bool`]; objects are untouched
pub fn clear_all_bools() {
    if let Err(e) = with_preferences(|prefs| prefs.clear_bools()) {
        warn!(error = ?e, "Failed to clear boolean preferences");
    }
}

// ============================================================================
// Files
// ============================================================================

/// Write `object` to `filename` in the shared files directory
pub fn save_object_to_file<T: Serialize + ?Sized>(object: &T, filename: &str) {
    if let Err(e) = files().and_then(|store| store.save(object, filename)) {
        warn!(filename, error = ?e, "Failed to save object to file");
    }
}

/// Object stored in `filename`; `None` if missing, unreadable or undecodable
pub fn object_from_file<T: DeserializeOwned>(filename: &str) -> Option<T> {
    match files().and_then(|store| store.load(filename)) {
        Ok(object) => object,
        Err(e) => {
            warn!(filename, error = ?e, "Failed to load object from file");
            None
        }
    }
}
