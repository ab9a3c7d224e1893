use sha2::{Digest, Sha256};

/// SHA-256 of a level's map text, line endings normalised so the same map
/// checked out on different platforms hashes the same.
pub fn level_fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    for line in text.lines() {
        hasher.update(line.trim_end_matches('\r').as_bytes());
        hasher.update([b'\n']);
    }
    to_hex_lower(&hasher.finalize())
}

fn to_hex_lower(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        use std::fmt::Write as _;
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}
