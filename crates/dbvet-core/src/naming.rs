//! Deterministic constraint-name inference.
//!
//! When a constraint is declared without an explicit name, its database-side
//! name is derived from the table name and the covered keys. The derivation
//! must stay stable across runs and across languages, because the SQLite
//! handler re-derives unique index names from the column list in the
//! engine's own error text and matches them against the registry.

use sha2::{Digest, Sha256};

/// Identifier byte budget shared by the engines we target.
pub const MAX_IDENTIFIER_BYTES: usize = 62;

/// Hex length of the digest suffix used by the short name forms.
const DIGEST_HEX_LEN: usize = 10;

fn digest10(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex = String::with_capacity(DIGEST_HEX_LEN);
    for byte in digest.iter() {
        hex.push_str(&format!("{byte:02x}"));
        if hex.len() >= DIGEST_HEX_LEN {
            break;
        }
    }
    hex.truncate(DIGEST_HEX_LEN);
    hex
}

/// Truncate `name` to at most `max` bytes without splitting a character.
fn truncate_to_bytes(name: &str, max: usize) -> &str {
    if name.len() <= max {
        return name;
    }
    let mut end = max;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Name of a unique index over `keys`.
///
/// Prefers the readable `index_<table>_on_<keys>` form. Over the byte
/// budget it falls back to `idx_on_<keys>` truncated to leave room for a
/// 10-hex-character digest of the full readable name, which keeps the
/// result unique, deterministic, and within identifier limits.
pub fn unique_index_name(table: &str, keys: &[String]) -> String {
    let readable = format!("index_{table}_on_{}", keys.join("_and_"));
    if readable.len() <= MAX_IDENTIFIER_BYTES {
        return readable;
    }

    let suffix = format!("_{}", digest10(&readable));
    let short = format!("idx_on_{}", keys.join("_"));
    let budget = MAX_IDENTIFIER_BYTES - suffix.len();
    format!("{}{suffix}", truncate_to_bytes(&short, budget))
}

/// Name of a check constraint on `key`.
pub fn check_name(table: &str, key: &str) -> String {
    format!("chk_{}", digest10(&format!("{table}_{key}_chk")))
}

/// Name of a foreign key constraint over `keys`.
///
/// The multi-column form follows the PostgreSQL convention; the single
/// column form uses the digest-based short name.
pub fn foreign_key_name(table: &str, keys: &[String]) -> String {
    if keys.len() > 1 {
        return format!("{table}_{}_fkey", keys.join("_"));
    }
    let key = &keys[0];
    format!("fk_{}", digest10(&format!("{table}_{key}_fk")))
}

/// Name of an exclusion constraint on `key`.
pub fn exclusion_name(table: &str, key: &str) -> String {
    format!("{table}_{key}_excl")
}
