/// Default similarity threshold (0–100) for fuzzy keyword matches.
pub const DEFAULT_THRESHOLD: f64 = 85.0;

/// Length of the longest common subsequence, two-row DP over chars.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    // Shorter string in the inner loop.
    let (a, b) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

/// Normalized indel similarity: 100 minus the share of characters that must
/// be inserted or deleted to turn one string into the other.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best `ratio` of the shorter string against every window of the longer
/// string with the same length.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0.0;
    }

    let mut best = 0.0f64;
    for window in long.windows(short.len()) {
        let score = ratio_chars(&short, window);
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// `ratio` after sorting whitespace-separated tokens, so word order is ignored.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Highest of the similarity scores between `text` and `keyword`. The
/// partial score only applies when `text` can contain the whole keyword, so
/// a short fragment never matches a longer keyword by alignment alone.
pub fn best_score(text: &str, keyword: &str) -> f64 {
    let mut best = ratio(text, keyword).max(token_sort_ratio(text, keyword));
    if text.chars().count() >= keyword.chars().count() {
        best = best.max(partial_ratio(text, keyword));
    }
    best
}

/// True when any keyword is a substring of `text` (case-insensitive) or when
/// any similarity score reaches `threshold`. Blank keywords never match.
pub fn matches<I, S>(text: &str, keywords: I, threshold: f64) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let text = text.to_lowercase();
    let keywords: Vec<String> = keywords
        .into_iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    if keywords.iter().any(|k| text.contains(k.as_str())) {
        return true;
    }
    keywords.iter().any(|k| best_score(&text, k) >= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_identical_and_disjoint() {
        assert_eq!(ratio("galon", "galon"), 100.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("", ""), 100.0);
    }

    #[test]
    fn test_ratio_single_deletion() {
        // lcs 4 of 5 + 4 chars
        let score = ratio("galon", "galn");
        assert!((score - 800.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_ratio_finds_embedded_word() {
        assert_eq!(partial_ratio("pembelian aqua botol", "aqua"), 100.0);
        assert_eq!(partial_ratio("aqua", "pembelian aqua botol"), 100.0);
        assert_eq!(partial_ratio("", "aqua"), 0.0);
    }

    #[test]
    fn test_token_sort_ignores_word_order() {
        assert_eq!(token_sort_ratio("mini training", "training mini"), 100.0);
        assert_eq!(token_sort_ratio("  training   mini ", "mini training"), 100.0);
    }

    #[test]
    fn test_matches_substring_regardless_of_threshold() {
        assert!(matches("AQUA GALON 19L", ["galon"], 100.0));
        assert!(matches("Beli Isi Ulang", ["isi ulang"], 100.0));
    }

    #[test]
    fn test_matches_fuzzy_misspelling() {
        // "syukuran" misspelled with one dropped letter
        assert!(matches("acara sykuran kantor", ["syukuran"], DEFAULT_THRESHOLD));
    }

    #[test]
    fn test_matches_word_order() {
        assert!(matches("training mini", ["mini training"], DEFAULT_THRESHOLD));
    }

    #[test]
    fn test_matches_rejects_unrelated_text() {
        assert!(!matches("kopi gula teh", ["aqua", "galon", "isi ulang"], DEFAULT_THRESHOLD));
    }

    #[test]
    fn test_matches_empty_keywords_never_match() {
        let none: [&str; 0] = [];
        assert!(!matches("anything", none, 0.0));
        assert!(!matches("anything", ["", "   "], 0.0));
    }

    #[test]
    fn test_short_text_does_not_align_into_longer_keyword() {
        assert_eq!(partial_ratio("a", "beras"), 100.0);
        assert_eq!(best_score("a", "beras"), ratio("a", "beras"));
        assert!(!matches("a", ["beras"], DEFAULT_THRESHOLD));
        assert!(!matches("ras", ["beras"], DEFAULT_THRESHOLD));
    }

    #[test]
    fn test_zero_threshold_matches_any_keyword() {
        assert!(matches("xyz", ["abc"], 0.0));
    }

    #[test]
    fn test_matches_non_ascii_text() {
        assert!(matches("jum’at bersih", ["jum’at"], DEFAULT_THRESHOLD));
        assert!(!matches("é", ["zzzz"], DEFAULT_THRESHOLD));
    }
}
