//! Standard HTML tag names contain only ASCII alpha characters and
//! digits from 1 to 6 (in numbered header tags, i.e. <h1> - <h6>).
//! Since tag names are case insensitive we have 26 + 6 = 32 distinct
//! characters, so a single character fits in 5 bits and up to 12
//! characters fit in a 64-bit integer. That covers every tag name the
//! tree builder dispatches on, so we compare integers instead of strings
//! on the hot paths.
//!
//! Numbers 0 to 5 encode the digits 1 to 6 and numbers 6 to 31 encode
//! ASCII alphas. Encoding alphas from 0 would make `a`, `aa` and `aaa`
//! collide. Digits still have this property, but a tag name can't start
//! with a digit, so the leading alpha always keeps the hashes distinct.
use super::Tag;

#[derive(Debug, PartialEq, Copy, Clone, Default, Hash)]
pub struct LocalNameHash(Option<u64>);

impl LocalNameHash {
    #[inline]
    pub fn new() -> Self {
        LocalNameHash(Some(0))
    }

    #[inline]
    pub fn empty() -> Self {
        LocalNameHash::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    #[inline]
    pub fn update(&mut self, ch: char) {
        if let Some(h) = self.0 {
            // NOTE: check if we still have space for yet another
            // character and if not then invalidate the hash.
            // `1` (which is encoded as 0b00000) can't be the first
            // character of a tag name, so it's safe to check this way.
            self.0 = if h >> (64 - 5) == 0 {
                match ch {
                    // NOTE: the 0x1F mask turns an ASCII alpha into a number
                    // from 1 to 26 regardless of its case, then we add 5 since
                    // numbers from 0 to 5 are reserved for digits.
                    'a'..='z' | 'A'..='Z' => Some((h << 5) | ((u64::from(ch) & 0x1F) + 5)),

                    // NOTE: the 0x0F mask turns an ASCII digit into a number
                    // from 1 to 6, then we make it zero-based.
                    '1'..='6' => Some((h << 5) | ((u64::from(ch) & 0x0F) - 1)),

                    _ => None,
                }
            } else {
                None
            };
        }
    }
}

impl From<&str> for LocalNameHash {
    #[inline]
    fn from(string: &str) -> Self {
        let mut hash = LocalNameHash::new();

        for ch in string.chars() {
            hash.update(ch);
        }

        hash
    }
}

impl PartialEq<Tag> for LocalNameHash {
    #[inline]
    fn eq(&self, tag: &Tag) -> bool {
        match self.0 {
            Some(h) => *tag as u64 == h,
            None => false,
        }
    }
}

impl Eq for LocalNameHash {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidates_hash_for_non_alphanumeric_names() {
        assert!(LocalNameHash::from("div@&").is_empty());
        assert!(LocalNameHash::from("annotation-xml").is_empty());
        assert!(LocalNameHash::from("h7").is_empty());
    }

    #[test]
    fn invalidates_hash_for_long_names() {
        assert!(LocalNameHash::from("aaaaaaaaaaaaaa").is_empty());
    }

    #[test]
    fn hash_is_case_insensitive() {
        assert_eq!(LocalNameHash::from("SvG"), LocalNameHash::from("svg"));
        assert_eq!(LocalNameHash::from("FOREIGNOBJECT"), Tag::ForeignObject);
    }

    #[test]
    fn empty_hash_never_matches_tags() {
        assert_ne!(LocalNameHash::empty(), Tag::A);
    }
}
