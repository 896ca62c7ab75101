// Random identifiers

use uuid::Uuid;

/// Fresh version-4 UUID in lowercase 8-4-4-4-12 form
///
/// Backed by the operating system's random source. No collision tracking and
/// no ordering between calls.
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}
