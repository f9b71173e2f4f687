//! Edit-distance string similarity.

/// Levenshtein distance between two strings, counted in characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Similarity in `[0, 1]`: `1 - distance / max(len)`.
///
/// An empty side always scores 0.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let max_len = a.chars().count().max(b.chars().count());
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", "abc"), 0);
        assert_eq!(levenshtein("flaw", "lawn"), 2);
        assert_eq!(levenshtein("zürich", "zurich"), 1);
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("100.0", "100.5"), 0.8);
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("", "abc"), 0.0);
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("abcd", "wxyz"), 0.0);
    }

    #[test]
    fn test_similarity_matches_normalized_levenshtein() {
        for (a, b) in [("INV-002", "INV-003"), ("Acme Corp", "Acme Inc"), ("zürich", "zurich")] {
            let expected = strsim::normalized_levenshtein(a, b);
            assert!((similarity(a, b) - expected).abs() < 1e-12);
        }
    }
}
