//! Polynomial string hash used to fingerprint buttons whose command ids are
//! reassigned every session.

use super::HASHFLAG;

/// Running `h * 31 + c` accumulator over UTF-16 code units.
///
/// Several strings are combined by feeding them one after the other into the
/// same accumulator. Feeding `"ab"` then `"c"` is therefore identical to
/// feeding `"abc"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StableHasher {
    state: u32,
}

impl StableHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, text: &str) -> &mut Self {
        for unit in text.encode_utf16() {
            self.state = self.state.wrapping_mul(31).wrapping_add(u32::from(unit));
        }
        self
    }

    /// Raw accumulator value without the content-hash marker.
    pub fn raw(&self) -> u32 {
        self.state
    }

    /// Final value with [`HASHFLAG`] forced on.
    pub fn finish(&self) -> u32 {
        self.state | HASHFLAG
    }
}

/// Hash a single label.
pub fn hash(text: &str) -> u32 {
    StableHasher::new().feed(text).finish()
}

/// Hash a label followed by its parent menu label.
pub fn hash_pair(label: &str, parent: &str) -> u32 {
    StableHasher::new().feed(label).feed(parent).finish()
}
