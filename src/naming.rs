//! Stored image names.
//!
//! Names are produced by [`NameGenerator`] and are the only index into the
//! store. Anything a client sends back (delete requests, static fetches) goes
//! through [`StoredName::parse`] before it is joined onto a filesystem path.

use std::fmt;

use rand::Rng;

use crate::codec::ImageKind;
use crate::error::DepotError;

/// Alphabet for generated tokens: the digits of base 24.
pub const NAME_ALPHABET: &[u8; 24] = b"0123456789abcdefghijklmn";

/// Default number of random characters in a generated name.
pub const DEFAULT_NAME_LENGTH: usize = 10;

/// Shortest token length accepted by configuration (≈27.5 bits of entropy).
pub const MIN_NAME_LENGTH: usize = 6;

/// Longest token length accepted by configuration.
pub const MAX_NAME_LENGTH: usize = 64;

/// Longest name [`StoredName::parse`] accepts, matching common filesystem limits.
pub const MAX_STORED_NAME_LEN: usize = 255;

// =============================================================================
// Name Generator
// =============================================================================

/// Generates random, URL-safe file names.
///
/// Every call is an independent draw from the thread-local CSPRNG. The store
/// is not checked for collisions; widen `length` for higher volumes.
#[derive(Debug, Clone, Copy)]
pub struct NameGenerator {
    length: usize,
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_NAME_LENGTH)
    }
}

impl NameGenerator {
    /// Create a generator emitting `length` random characters per name.
    ///
    /// Lengths below [`MIN_NAME_LENGTH`] are raised to it.
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(MIN_NAME_LENGTH),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Entropy of one generated token, in bits.
    pub fn entropy_bits(&self) -> f64 {
        self.length as f64 * (NAME_ALPHABET.len() as f64).log2()
    }

    /// A bare random token without extension.
    pub fn token(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.length)
            .map(|_| NAME_ALPHABET[rng.gen_range(0..NAME_ALPHABET.len())] as char)
            .collect()
    }

    /// Generate a fresh name carrying the extension of `kind`.
    pub fn generate(&self, kind: ImageKind) -> StoredName {
        let mut name = self.token();
        name.push('.');
        name.push_str(kind.extension());
        StoredName(name)
    }
}

// =============================================================================
// Stored Name
// =============================================================================

/// A single path segment that is safe to resolve inside the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredName(String);

impl StoredName {
    /// Validate a caller-supplied name.
    ///
    /// Accepts exactly one path segment: no separators, no parent or current
    /// directory references, no hidden files, no control characters.
    pub fn parse(raw: &str) -> Result<Self, DepotError> {
        let invalid = |reason| DepotError::InvalidName {
            name: raw.to_string(),
            reason,
        };

        if raw.is_empty() {
            return Err(invalid("name is empty"));
        }
        if raw == ".." || raw.contains(['/', '\\']) {
            return Err(DepotError::PathTraversal {
                name: raw.to_string(),
            });
        }
        if raw.starts_with('.') {
            return Err(invalid("name must not start with '.'"));
        }
        if raw.chars().any(|c| c.is_control() || c == ':') {
            return Err(invalid("name contains reserved characters"));
        }
        if raw.len() > MAX_STORED_NAME_LEN {
            return Err(invalid("name is too long"));
        }

        Ok(StoredName(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoredName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StoredName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
