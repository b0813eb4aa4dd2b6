//! Prompt fingerprints.

use sha2::{Digest, Sha256};

/// Compute a stable SHA-256 fingerprint for a prompt string.
pub fn hash_prompt(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

/// Derive a 9-character alphanumeric call ID from a seed.
///
/// Used when a function call has no provider-assigned ID but the follow-up
/// request needs one to link the tool message back to the call.
pub fn call_id_for(seed: &str) -> String {
    hash_prompt(seed).chars().take(9).collect()
}
