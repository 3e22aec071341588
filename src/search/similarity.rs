

/// Edit distance over chars, two-row dynamic programming.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let n = b_chars.len();
    if n == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr: Vec<usize> = vec![0; n + 1];

    for (i, c) in a.chars().enumerate() {
        curr[0] = i + 1;
        for j in 1..=n {
            let cost = usize::from(c != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}


/// Edit distance scaled by the longer input, in `[0.0, 1.0]`.
pub fn normalized_distance(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 0.0;
    }
    levenshtein(a, b) as f64 / longest as f64
}


/// True when at most `fuzziness` of the longer string must be edited to turn
/// one into the other. Callers normalize case.
pub fn is_similar(query: &str, display_name: &str, fuzziness: f64) -> bool {
    normalized_distance(query, display_name) <= fuzziness
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn test_is_similar_boundaries() {
        assert!(is_similar("alpha eta gamma", "alpha beta gamma", 0.25));
        assert!(!is_similar("alp bet gam", "alpha beta gamma", 0.25));
        assert!(!is_similar("eta", "alpha beta gamma", 0.25));
        assert!(is_similar("alp bet gam", "alpha beta gamma", 0.35));
    }
}
