//! # Payload Hashing
//!
//! Content addressing for envelope payloads.
//!
//! The payload is first rendered as canonical JSON (object keys sorted at
//! every depth, no insignificant whitespace) and then digested with SHA-256,
//! so two payloads that differ only in key insertion order hash identically.
//!
//! Everything outside printable ASCII is written as `\uXXXX` escapes (UTF-16
//! surrogate pairs above the BMP), so digests agree with producers that
//! serialize with Python's `json.dumps(sort_keys=True, separators=(",", ":"))`.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Algorithm tag prefixed to every payload hash.
pub const HASH_PREFIX: &str = "sha256:";

/// Hex digits in a SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// Render a JSON value in canonical form.
///
/// Key order is established here rather than relying on `serde_json::Map`
/// iteration order, which changes when `preserve_order` is enabled anywhere
/// in the dependency graph.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_ascii(out, &Value::String(key.clone()).to_string());
                out.push(':');
                if let Some(child) = map.get(key) {
                    write_canonical(child, out);
                }
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        // Scalars: serde_json's compact rendering, ASCII-escaped.
        scalar => push_ascii(out, &scalar.to_string()),
    }
}

/// Append `rendered` JSON with every non-ASCII char and DEL escaped. Such
/// chars only ever occur inside string literals.
fn push_ascii(out: &mut String, rendered: &str) {
    for c in rendered.chars() {
        if c.is_ascii() && c != '\u{7f}' {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                let _ = write!(out, "\\u{unit:04x}");
            }
        }
    }
}

/// Compute the content hash of a payload: `sha256:<64 lowercase hex>`.
#[must_use]
pub fn compute_payload_hash(payload: &Value) -> String {
    let digest = Sha256::digest(canonical_json(payload).as_bytes());
    format!("{HASH_PREFIX}{}", hex::encode(digest))
}

/// Whether `s` is a well-formed payload hash (tag plus 64 lowercase hex digits).
#[must_use]
pub fn is_payload_hash(s: &str) -> bool {
    s.strip_prefix(HASH_PREFIX).is_some_and(|digest| {
        digest.len() == DIGEST_HEX_LEN
            && digest
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    })
}
