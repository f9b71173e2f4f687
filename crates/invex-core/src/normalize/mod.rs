//! Normalizers that turn noisy field strings into canonical forms.

pub mod amounts;
pub mod dates;
pub mod patterns;

pub use amounts::AmountNormalizer;
pub use dates::DateNormalizer;

/// Trait for field normalizers.
pub trait Normalizer {
    /// Map a raw value to its canonical form, or `None` if it cannot be parsed.
    fn normalize(&self, raw: &str) -> Option<String>;

    /// Find a value inside free text and normalize it.
    fn extract(&self, text: &str) -> Option<String>;

    /// Whether the value can be normalized at all.
    fn is_valid(&self, raw: &str) -> bool {
        self.normalize(raw).is_some()
    }
}

/// Collapse whitespace runs into single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip an ASCII prefix, ignoring case.
pub(crate) fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    s.get(..prefix.len())
        .filter(|head| head.eq_ignore_ascii_case(prefix))
        .map(|_| &s[prefix.len()..])
}
