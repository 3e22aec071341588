

use std::cell::OnceCell;

use crate::pws::PersonOutput;
use crate::utils::normalize_name_tokens;


#[derive(Debug, Default)]
struct NormalizedNames {
    display_name: String,
    preferred_first_name: String,
    preferred_middle_name: String,
    preferred_surname: String,
    registered_surname: String,
    registered_first_middle_name: String,
}

impl NormalizedNames {
    fn of(person: &PersonOutput) -> Self {
        let norm = |value: &Option<String>| value.as_deref().map(normalize_name_tokens).unwrap_or_default();
        Self {
            display_name: normalize_name_tokens(&person.display_name),
            preferred_first_name: norm(&person.preferred_first_name),
            preferred_middle_name: norm(&person.preferred_middle_name),
            preferred_surname: norm(&person.preferred_surname),
            registered_surname: norm(&person.registered_surname),
            registered_first_middle_name: norm(&person.registered_first_middle_name),
        }
    }
}

/// Byte offset of `needle` in `haystack`, ignoring ASCII case. ASCII
/// lowercasing keeps byte offsets stable, so the result indexes `haystack`.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack.to_ascii_lowercase().find(&needle.to_ascii_lowercase())
}

fn contains_nonempty(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && haystack.contains(needle)
}


/// Derives the displayed surname, first and middle names of a person and a
/// "last first middle" sort key. The display name is authoritative; the
/// preferred and registered fields only help locate the parts inside it.
pub struct NameAnalyzer<'a> {
    person: &'a PersonOutput,
    normalized: OnceCell<NormalizedNames>,
    surname: OnceCell<String>,
    first_name: OnceCell<String>,
    middle_name: OnceCell<String>,
    sort_key: OnceCell<String>,
}

impl<'a> NameAnalyzer<'a> {
    pub fn new(person: &'a PersonOutput) -> Self {
        Self {
            person,
            normalized: OnceCell::new(),
            surname: OnceCell::new(),
            first_name: OnceCell::new(),
            middle_name: OnceCell::new(),
            sort_key: OnceCell::new(),
        }
    }

    fn normalized(&self) -> &NormalizedNames {
        self.normalized.get_or_init(|| NormalizedNames::of(self.person))
    }

    fn display_name(&self) -> &str {
        &self.person.display_name
    }

    fn first_token(&self) -> String {
        self.display_name().split_whitespace().next().unwrap_or_default().to_string()
    }

    /// Multi-word surnames are only recognized through the preferred or
    /// registered surname; otherwise the last display token is used.
    pub fn surname(&self) -> &str {
        self.surname.get_or_init(|| {
            let normalized = self.normalized();
            if contains_nonempty(&normalized.display_name, &normalized.preferred_surname) {
                if let Some(preferred) = &self.person.preferred_surname {
                    return preferred.trim().to_string();
                }
            }
            if contains_nonempty(&normalized.display_name, &normalized.registered_surname) {
                if let Some(registered) = &self.person.registered_surname {
                    return registered.trim().to_string();
                }
            }
            self.display_name()
                .split_whitespace()
                .last()
                .unwrap_or_default()
                .to_string()
        })
    }

    fn surname_position(&self) -> Option<usize> {
        find_ignore_case(self.display_name(), self.surname())
    }

    /// Registered names combine first and middle names, so without a
    /// preferred first name the whole pre-surname part of the display name is
    /// the first name.
    pub fn first_name(&self) -> &str {
        self.first_name.get_or_init(|| {
            let Some(position) = self.surname_position() else {
                return self.first_token();
            };
            let raw_first_middle = &self.display_name()[..position];
            let first_middle = normalize_name_tokens(raw_first_middle);
            let normalized = self.normalized();

            if contains_nonempty(&first_middle, &normalized.preferred_first_name) {
                if let Some(preferred) = &self.person.preferred_first_name {
                    return preferred.trim().to_string();
                }
            }
            if contains_nonempty(&first_middle, &normalized.registered_first_middle_name) {
                return raw_first_middle.trim().to_string();
            }
            self.first_token()
        })
    }

    /// May be empty.
    pub fn middle_name(&self) -> &str {
        self.middle_name.get_or_init(|| {
            let display_name = self.display_name();
            let normalized = self.normalized();

            if contains_nonempty(&normalized.display_name, &normalized.preferred_middle_name) {
                if let Some(preferred) = &self.person.preferred_middle_name {
                    return preferred.trim().to_string();
                }
            }

            let first_name = self.first_name();
            let start = find_ignore_case(display_name, first_name)
                .map(|index| index + first_name.len())
                .unwrap_or(0);
            let Some(end) = self.surname_position() else {
                return String::new();
            };
            if start > end {
                return String::new();
            }
            display_name
                .get(start..end)
                .map(str::trim)
                .filter(|middle| contains_nonempty(display_name, middle))
                .map(str::to_string)
                .unwrap_or_default()
        })
    }

    /// `First Middle Last` sorts as `last first middle`.
    pub fn sort_key(&self) -> &str {
        self.sort_key.get_or_init(|| {
            [self.surname(), self.first_name(), self.middle_name()]
                .into_iter()
                .filter(|part| !part.is_empty())
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
                .join(" ")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surname_falls_back_to_last_token() {
        let mut person = PersonOutput::named("J H Roberts");
        person.registered_surname = Some("smith".to_string());
        let analyzer = NameAnalyzer::new(&person);
        assert_eq!(analyzer.surname(), "Roberts");
        assert_eq!(analyzer.first_name(), "J");
        assert_eq!(analyzer.middle_name(), "H");
    }

    #[test]
    fn test_display_name_only() {
        let person = PersonOutput::named("Alpha Beta Gamma");
        let analyzer = NameAnalyzer::new(&person);
        assert_eq!(analyzer.surname(), "Gamma");
        assert_eq!(analyzer.first_name(), "Alpha");
        assert_eq!(analyzer.middle_name(), "Beta");
        assert_eq!(analyzer.sort_key(), "gamma alpha beta");
    }

    #[test]
    fn test_multi_word_registered_surname() {
        let mut person = PersonOutput::named("Ana Maria de la Cruz");
        person.registered_surname = Some("DE LA CRUZ".to_string());
        person.registered_first_middle_name = Some("ANA MARIA".to_string());
        let analyzer = NameAnalyzer::new(&person);
        assert_eq!(analyzer.surname(), "DE LA CRUZ");
        assert_eq!(analyzer.first_name(), "Ana Maria");
        assert_eq!(analyzer.middle_name(), "");
        assert_eq!(analyzer.sort_key(), "de la cruz ana maria");
    }

    #[test]
    fn test_preferred_names() {
        let mut person = PersonOutput::named("Mary Jane Blige");
        person.preferred_first_name = Some("Mary".to_string());
        person.preferred_middle_name = Some("Jane".to_string());
        person.preferred_surname = Some("Blige".to_string());
        person.registered_surname = Some("Smith".to_string());
        let analyzer = NameAnalyzer::new(&person);
        assert_eq!(analyzer.surname(), "Blige");
        assert_eq!(analyzer.first_name(), "Mary");
        assert_eq!(analyzer.middle_name(), "Jane");
        assert_eq!(analyzer.sort_key(), "blige mary jane");
    }

    #[test]
    fn test_preferred_name_not_displayed_is_ignored() {
        let mut person = PersonOutput::named("Robert Smith");
        person.preferred_surname = Some("Jones".to_string());
        person.preferred_first_name = Some("Bob".to_string());
        let analyzer = NameAnalyzer::new(&person);
        assert_eq!(analyzer.surname(), "Smith");
        assert_eq!(analyzer.first_name(), "Robert");
        assert_eq!(analyzer.sort_key(), "smith robert");
    }

    #[test]
    fn test_empty_display_name() {
        let person = PersonOutput::named("");
        let analyzer = NameAnalyzer::new(&person);
        assert_eq!(analyzer.surname(), "");
        assert_eq!(analyzer.first_name(), "");
        assert_eq!(analyzer.middle_name(), "");
        assert_eq!(analyzer.sort_key(), "");
    }
}
