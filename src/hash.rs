//! Deterministic SHA-512 payload signing required by the upstream API.
//!
//! The upstream contract is bit-exact: `hex(SHA512(concat(ordered_field_values) + secret))`,
//! lowercase, 128 characters. Field values are concatenated with no separator in the payload's
//! insertion order, skipping any field already named after a hash slot.

// crates.io
use sha2::{Digest, Sha512};
// self
use crate::{endpoint::HashField, payload::Payload};

/// Field names reserved for the integrity hash; excluded from the digest regardless of position.
pub const SECURE_HASH_FIELDS: [&str; 2] = ["secureHash", "secure_hash"];

/// Computes the integrity digest over `payload` with the shared secret appended.
///
/// Pure and deterministic; the same payload and secret always produce the same 128-character
/// lowercase hex string.
pub fn secure_hash(payload: &Payload, secret: &str) -> String {
	let mut canonical = String::new();

	for (key, value) in payload.iter() {
		if SECURE_HASH_FIELDS.contains(&key) {
			continue;
		}

		value.push_canonical(&mut canonical);
	}

	canonical.push_str(secret);

	let mut hasher = Sha512::new();

	hasher.update(canonical.as_bytes());

	hex_lower(&hasher.finalize())
}

/// Computes the digest and stores it under the endpoint's conventional hash field.
///
/// Existing hash fields never contribute to the digest, so re-signing a payload is stable.
pub fn attach_secure_hash(payload: &mut Payload, field: HashField, secret: &str) {
	let digest = secure_hash(payload, secret);

	payload.insert(field.as_str(), digest);
}

fn hex_lower(bytes: &[u8]) -> String {
	const TABLE: &[u8; 16] = b"0123456789abcdef";

	let mut out = String::with_capacity(bytes.len() * 2);

	for byte in bytes {
		out.push(TABLE[(byte >> 4) as usize] as char);
		out.push(TABLE[(byte & 0x0f) as usize] as char);
	}

	out
}
