// MD5 fingerprinting
//
// Not a security primitive: use for cache keys and legacy fingerprints only.

/// MD5 digest of the UTF-8 bytes of `s`, as 32 lowercase hex characters
pub fn md5_from_string(s: &str) -> String {
    md5_hex(s.as_bytes())
}

/// MD5 digest of raw bytes, as 32 lowercase hex characters
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}
