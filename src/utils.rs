

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PLAIN_WORD: Regex = Regex::new(r"^[a-zA-Z]+$").expect("valid regex");
}


#[inline]
pub fn safe_truncate_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}


/// Capitalizes a purely alphabetic token ("MARY" -> "Mary"). Tokens with
/// punctuation are returned unchanged so "Anne-Marie" keeps its casing.
pub fn humanize_token(token: &str) -> String {
    if !PLAIN_WORD.is_match(token) {
        return token.to_string();
    }
    let lower = token.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}


/// Comparison-only normal form of a name: each whitespace token humanized and
/// rejoined with single spaces.
pub fn normalize_name_tokens(value: &str) -> String {
    value
        .split_whitespace()
        .map(humanize_token)
        .collect::<Vec<_>>()
        .join(" ")
}


/// `["a"]` -> `"a"`, `["a", "b"]` -> `"a" and "b"`,
/// `["a", "b", "c"]` -> `"a," "b," and "c"`.
pub fn readable_list<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => format!("\"{}\"", only.as_ref()),
        [first, second] => format!("\"{}\" and \"{}\"", first.as_ref(), second.as_ref()),
        [rest @ .., last] => {
            let leading: Vec<String> = rest
                .iter()
                .map(|item| format!("\"{},\"", item.as_ref()))
                .collect();
            format!("{} and \"{}\"", leading.join(" "), last.as_ref())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_truncate_ellipsis() {
        assert_eq!(safe_truncate_ellipsis("hello world", 5), "hello...");
        assert_eq!(safe_truncate_ellipsis("hi", 10), "hi");
    }

    #[test]
    fn test_humanize_token() {
        assert_eq!(humanize_token("MARY"), "Mary");
        assert_eq!(humanize_token("blige"), "Blige");
        assert_eq!(humanize_token("Anne-marie"), "Anne-marie");
        assert_eq!(humanize_token("O'Neil"), "O'Neil");
    }

    #[test]
    fn test_normalize_name_tokens() {
        assert_eq!(normalize_name_tokens("  mary   J  BLIGE "), "Mary J Blige");
        assert_eq!(normalize_name_tokens(""), "");
    }

    #[test]
    fn test_readable_list() {
        assert_eq!(readable_list::<&str>(&[]), "");
        assert_eq!(readable_list(&["eta"]), "\"eta\"");
        assert_eq!(readable_list(&["al", "ga"]), "\"al\" and \"ga\"");
        assert_eq!(
            readable_list(&["alp", "bet", "gam"]),
            "\"alp,\" \"bet,\" and \"gam\""
        );
    }
}
