//! Deterministic hashing for unique-table and cache keys.
//!
//! Keys are combined with the [Szudzik pairing function][szudzik], which is
//! injective as long as the intermediate products stay below 2^64; beyond
//! that the wrapping arithmetic degrades gracefully into an ordinary hash.
//!
//! [szudzik]: https://en.wikipedia.org/wiki/Pairing_function

/// Szudzik pairing of two values.
///
/// ```text
/// (a, b) -> if a < b then b^2 + a else a^2 + a + b
/// ```
pub fn pairing2(a: u64, b: u64) -> u64 {
    if a < b {
        b.wrapping_mul(b).wrapping_add(a)
    } else {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    }
}

/// Pairing of three values, via nested [`pairing2`].
pub fn pairing3(a: u64, b: u64, c: u64) -> u64 {
    pairing2(pairing2(a, b), c)
}

/// A deterministic hash used as the identity of table and cache entries.
pub trait StableHash {
    fn stable_hash(&self) -> u64;
}
