

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::core::error::{DirectoryError, Result};

lazy_static! {
    static ref DIGITS: Regex = Regex::new(r"^[0-9]+$").expect("valid regex");
}

const MAX_NAME_LENGTH: usize = 128;
const MAX_DEPARTMENT_LENGTH: usize = 128;
// RFC 5321 section 4.5.3
const MAX_EMAIL_LENGTH: usize = 256;
const MAX_NUMBER_LENGTH: usize = 32;


#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PopulationType {
    #[default]
    Employees,
    Students,
    All,
}

impl PopulationType {
    pub fn includes_employees(self) -> bool {
        matches!(self, Self::Employees | Self::All)
    }

    pub fn includes_students(self) -> bool {
        matches!(self, Self::Students | Self::All)
    }
}


/// The searchable attribute a request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAttribute<'a> {
    Name(&'a str),
    Department(&'a str),
    Email(&'a str),
    Phone(String),
    BoxNumber(&'a str),
}

impl SearchAttribute<'_> {
    pub fn describe(&self) -> String {
        match self {
            Self::Name(name) => format!("name \"{name}\""),
            Self::Department(department) => format!("department \"{department}\""),
            Self::Email(email) => format!("email \"{email}\""),
            Self::Phone(digits) => format!("phone \"{digits}\""),
            Self::BoxNumber(box_number) => format!("box number \"{box_number}\""),
        }
    }
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDirectoryInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_number: Option<String>,
    #[serde(default)]
    pub population: PopulationType,
    #[serde(default)]
    pub include_test_identities: bool,
}

impl SearchDirectoryInput {
    pub fn name(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn department(department: &str) -> Self {
        Self {
            department: Some(department.to_string()),
            ..Self::default()
        }
    }

    pub fn email(email: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            ..Self::default()
        }
    }

    pub fn phone(phone: &str) -> Self {
        Self {
            phone: Some(phone.to_string()),
            ..Self::default()
        }
    }

    pub fn box_number(box_number: &str) -> Self {
        Self {
            box_number: Some(box_number.to_string()),
            ..Self::default()
        }
    }

    pub fn with_population(mut self, population: PopulationType) -> Self {
        self.population = population;
        self
    }

    /// Trims every field, drops blank ones, and enforces the length and
    /// format limits. At most one attribute may be populated.
    pub fn validated(self) -> Result<Self> {
        let trim = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let input = Self {
            name: trim(self.name),
            department: trim(self.department),
            email: trim(self.email),
            phone: trim(self.phone),
            box_number: trim(self.box_number),
            ..self
        };

        check_length("name", input.name.as_deref(), MAX_NAME_LENGTH)?;
        check_length("department", input.department.as_deref(), MAX_DEPARTMENT_LENGTH)?;
        check_length("email", input.email.as_deref(), MAX_EMAIL_LENGTH)?;
        check_length("phone", input.phone.as_deref(), MAX_NUMBER_LENGTH)?;
        check_length("boxNumber", input.box_number.as_deref(), MAX_NUMBER_LENGTH)?;

        if let Some(box_number) = &input.box_number {
            if !DIGITS.is_match(box_number) {
                return Err(DirectoryError::validation(format!(
                    "boxNumber must contain only digits, got {box_number:?}"
                )));
            }
        }

        let populated = [
            input.name.is_some(),
            input.department.is_some(),
            input.email.is_some(),
            input.phone.is_some(),
            input.box_number.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();
        if populated > 1 {
            return Err(DirectoryError::validation(
                "only one search attribute may be provided at a time",
            ));
        }

        Ok(input)
    }

    /// Digits of the phone number, without punctuation or spacing.
    pub fn sanitized_phone(&self) -> Option<String> {
        let digits: String = self
            .phone
            .as_deref()?
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        (!digits.is_empty()).then_some(digits)
    }

    pub fn attribute(&self) -> Option<SearchAttribute<'_>> {
        if let Some(name) = &self.name {
            return Some(SearchAttribute::Name(name));
        }
        if let Some(phone) = self.sanitized_phone() {
            return Some(SearchAttribute::Phone(phone));
        }
        if let Some(box_number) = &self.box_number {
            return Some(SearchAttribute::BoxNumber(box_number));
        }
        if let Some(email) = &self.email {
            return Some(SearchAttribute::Email(email));
        }
        self.department
            .as_deref()
            .map(SearchAttribute::Department)
    }
}

fn check_length(field: &str, value: Option<&str>, max: usize) -> Result<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(DirectoryError::validation(format!(
            "{field} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validated_trims_and_drops_blank_fields() {
        let input = SearchDirectoryInput {
            name: Some("  Mary Blige ".to_string()),
            department: Some("   ".to_string()),
            ..Default::default()
        }
        .validated()
        .unwrap();
        assert_eq!(input.name.as_deref(), Some("Mary Blige"));
        assert!(input.department.is_none());
    }

    #[test]
    fn test_validated_rejects_multiple_attributes() {
        let input = SearchDirectoryInput {
            name: Some("foo".to_string()),
            email: Some("foo@uw.edu".to_string()),
            ..Default::default()
        };
        assert!(matches!(input.validated(), Err(DirectoryError::Validation(_))));
    }

    #[test]
    fn test_validated_rejects_long_name() {
        let input = SearchDirectoryInput::name(&"a".repeat(129));
        assert!(input.validated().is_err());
        assert!(SearchDirectoryInput::name(&"a".repeat(128)).validated().is_ok());
    }

    #[test]
    fn test_validated_box_number_digits() {
        assert!(SearchDirectoryInput::box_number("123456").validated().is_ok());
        assert!(SearchDirectoryInput::box_number("12a").validated().is_err());
    }

    #[test]
    fn test_sanitized_phone() {
        assert_eq!(
            SearchDirectoryInput::phone("+1 (206) 555-4321").sanitized_phone(),
            Some("12065554321".to_string())
        );
        assert_eq!(SearchDirectoryInput::phone("abcdefg").sanitized_phone(), None);
    }

    #[test]
    fn test_attribute() {
        assert_eq!(
            SearchDirectoryInput::name("foo").attribute(),
            Some(SearchAttribute::Name("foo"))
        );
        assert_eq!(SearchDirectoryInput::phone("abc").attribute(), None);
        assert_eq!(SearchDirectoryInput::default().attribute(), None);
    }

    #[test]
    fn test_population_type() {
        assert_eq!(PopulationType::from_str("all").unwrap(), PopulationType::All);
        assert!(PopulationType::All.includes_students());
        assert!(!PopulationType::Employees.includes_students());
        let name: &'static str = PopulationType::Students.into();
        assert_eq!(name, "students");
    }
}
