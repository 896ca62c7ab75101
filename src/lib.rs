// hkutils - Preference, file, JSON, hashing and date utilities

pub mod config;
pub mod dates;
pub mod files;
pub mod hash;
pub mod id;
pub mod json;
pub mod preferences;
pub mod shared;
pub mod value;
pub mod version;

// Re-export main types for convenience
pub use config::Config;
pub use dates::{now_ms, string_from_date, string_from_date_with};
pub use files::FileStore;
pub use hash::{md5_from_string, md5_hex};
pub use id::generate_uuid;
pub use json::{Bytes, Displayed, ToJsonValue, json_value};
pub use preferences::Preferences;
pub use shared::{
    bool_for_key, clear_all_bools, init, object_for_key, object_from_file, save_bool, save_object,
    save_object_to_file,
};
pub use value::Value;
pub use version::{compare_versions, system_version, system_version_at_least, version_at_least};
