//! Content hashing for cache keys and structural fingerprints.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use xxhash_rust::xxh3::Xxh3;

/// A 128-bit content hash computed using XXH3.
///
/// Two inputs with the same `ContentHash` are assumed to be identical. The
/// hash renders as 32 lowercase hex characters, which is also the form used
/// for cache directory names and for serialization.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Returns the raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Error returned when a string is not a valid 32-character hex hash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid content hash '{input}': expected 32 hex characters")]
pub struct ParseHashError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for ContentHash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseHashError {
            input: s.to_string(),
        };
        if s.len() != 32 || !s.is_ascii() {
            return Err(err());
        }
        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[2 * i..2 * i + 2], 16).map_err(|_| err())?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Incremental XXH3-128 hasher for composite fingerprints.
///
/// Every variable-length field is written with a little-endian length prefix,
/// so `("ab", "c")` and `("a", "bc")` never collide.
pub struct ContentHasher {
    state: Xxh3,
}

impl ContentHasher {
    /// Creates a hasher with the default XXH3 seed.
    pub fn new() -> Self {
        Self { state: Xxh3::new() }
    }

    /// Feeds a length-prefixed byte string.
    pub fn write_bytes(&mut self, data: &[u8]) -> &mut Self {
        self.state.update(&(data.len() as u64).to_le_bytes());
        self.state.update(data);
        self
    }

    /// Feeds a length-prefixed UTF-8 string.
    pub fn write_str(&mut self, s: &str) -> &mut Self {
        self.write_bytes(s.as_bytes())
    }

    /// Feeds a fixed-width integer.
    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.state.update(&value.to_le_bytes());
        self
    }

    /// Feeds another content hash.
    pub fn write_hash(&mut self, hash: &ContentHash) -> &mut Self {
        self.state.update(hash.as_bytes());
        self
    }

    /// Returns the hash of everything written so far.
    pub fn finish(&self) -> ContentHash {
        ContentHash(self.state.digest128().to_le_bytes())
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_module_text_same_hash() {
        let text = b"module Adder(input a, output s); assign s = a; endmodule";
        assert_eq!(ContentHash::from_bytes(text), ContentHash::from_bytes(text));
        assert_ne!(
            ContentHash::from_bytes(text),
            ContentHash::from_bytes(b"module Adder(input a, output s); assign s = ~a; endmodule")
        );
    }

    #[test]
    fn renders_as_lowercase_hex_directory_name() {
        let rendered = ContentHash::from_bytes(b"Adder").to_string();
        assert_eq!(rendered.len(), 32);
        assert!(rendered
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn directory_name_parses_back() {
        let h = ContentHash::from_bytes(b"Counter");
        assert_eq!(h.to_string().parse::<ContentHash>().unwrap(), h);
        assert_eq!(h.to_string().to_uppercase().parse::<ContentHash>().unwrap(), h);
    }

    #[test]
    fn foreign_directory_names_are_rejected() {
        let names = [
            "lost+found".to_string(),
            ".DS_Store".to_string(),
            "0123".to_string(),
            "g".repeat(32),
            "\u{e9}".repeat(16),
        ];
        for name in names {
            let err = name.parse::<ContentHash>().unwrap_err();
            assert_eq!(err.input, name);
        }
    }

    #[test]
    fn debug_shows_prefix_only() {
        let h = ContentHash::from_bytes(b"Adder");
        let debug = format!("{h:?}");
        assert!(debug.starts_with("ContentHash("));
        assert!(debug.len() < h.to_string().len());
    }

    #[test]
    fn json_form_is_the_hex_string() {
        let h = ContentHash::from_bytes(b"Adder");
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{h}\""));
        assert_eq!(serde_json::from_str::<ContentHash>(&json).unwrap(), h);
        assert!(serde_json::from_str::<ContentHash>("\"not-a-hash\"").is_err());
    }

    #[test]
    fn field_boundaries_matter() {
        let mut a = ContentHasher::new();
        a.write_str("-O2").write_str("-g");
        let mut b = ContentHasher::new();
        b.write_str("-O2-g");
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn field_order_matters() {
        let digest = |first: &str, second: &str| {
            let mut h = ContentHasher::new();
            h.write_str(first).write_str(second);
            h.finish()
        };
        assert_eq!(digest("clock", "reset"), digest("clock", "reset"));
        assert_ne!(digest("clock", "reset"), digest("reset", "clock"));
    }

    #[test]
    fn nested_hash_is_folded_in() {
        let inner = ContentHash::from_bytes(b"Carry");
        let mut a = ContentHasher::new();
        a.write_hash(&inner).write_u32(1);
        let mut b = ContentHasher::new();
        b.write_hash(&ContentHash::from_bytes(b"Sum")).write_u32(1);
        assert_ne!(a.finish(), b.finish());
    }
}
