

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::input::PopulationType;
use crate::pws::PersonOutput;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameField {
    FirstName,
    LastName,
    DisplayName,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintPredicate {
    NullOrMatches,
    NullOrBeginsWith,
    NullOrIncludes,
}

impl ConstraintPredicate {
    /// Case-insensitive; an absent or blank value always passes.
    pub fn test(self, target: &str, value: Option<&str>) -> bool {
        let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
            return true;
        };
        let value = value.to_lowercase();
        let target = target.to_lowercase();
        match self {
            Self::NullOrMatches => value == target,
            Self::NullOrBeginsWith => value.starts_with(&target),
            Self::NullOrIncludes => value.contains(&target),
        }
    }
}


/// Client-side check for a name attribute the upstream cannot filter on
/// directly. Preferred names are matched because upstream search also hits
/// registered names that are no longer displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordConstraint {
    pub field: NameField,
    pub predicate: ConstraintPredicate,
    pub target: String,
}

impl RecordConstraint {
    pub fn new(field: NameField, predicate: ConstraintPredicate, target: impl Into<String>) -> Self {
        Self {
            field,
            predicate,
            target: target.into(),
        }
    }

    pub fn matches(&self, person: &PersonOutput) -> bool {
        let value = match self.field {
            NameField::FirstName => person.preferred_first_name.as_deref(),
            NameField::LastName => person.preferred_surname.as_deref(),
            NameField::DisplayName => Some(person.display_name.as_str()),
        };
        self.predicate.test(&self.target, value)
    }
}


/// Publication and population rules applied to every upstream record before
/// it is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonFilter {
    pub population: PopulationType,
    pub include_test_identities: bool,
    pub authenticated: bool,
}

impl PersonFilter {
    pub fn new(population: PopulationType, include_test_identities: bool, authenticated: bool) -> Self {
        Self {
            population,
            include_test_identities,
            authenticated,
        }
    }

    /// Clears affiliations the caller may not see and returns whether anything
    /// publishable remains.
    pub fn admit(&self, person: &mut PersonOutput) -> bool {
        if person.netid.as_deref().is_none_or(str::is_empty) || !person.whitepages_publish {
            return false;
        }
        if person.is_test_entity && !self.include_test_identities {
            return false;
        }

        let student_visible = person.affiliations.student.as_ref().is_some_and(|student| {
            self.authenticated
                && self.population.includes_students()
                && student.directory_listing.publish_in_directory
        });
        if !student_visible {
            person.affiliations.student = None;
        }

        let employee_visible = person.affiliations.employee.as_ref().is_some_and(|employee| {
            self.population.includes_employees() && employee.directory_listing.publish_in_directory
        });
        if !employee_visible {
            person.affiliations.employee = None;
        }

        if person.affiliations.is_empty() {
            return false;
        }
        if person.href.is_none() {
            person.href = person.resolved_href();
        }
        true
    }

    /// Applies the publication rules and the candidate's constraints to one
    /// page of records.
    pub fn apply(&self, persons: Vec<PersonOutput>, constraints: &[RecordConstraint]) -> Vec<PersonOutput> {
        let received = persons.len();
        let admitted: Vec<PersonOutput> = persons
            .into_iter()
            .filter_map(|mut person| {
                let keep = self.admit(&mut person)
                    && constraints.iter().all(|constraint| constraint.matches(&person));
                keep.then_some(person)
            })
            .collect();
        debug!("Filter admitted {} of {} records", admitted.len(), received);
        admitted
    }
}

impl Default for PersonFilter {
    fn default() -> Self {
        Self::new(PopulationType::Employees, false, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pws::models::{
        EmployeeDirectoryListing, EmployeePersonAffiliation, StudentDirectoryListing,
        StudentPersonAffiliation,
    };

    fn person(netid: &str, employee: bool, student: bool) -> PersonOutput {
        let mut person = PersonOutput::named("Husky Dawg");
        person.netid = Some(netid.to_string());
        person.whitepages_publish = true;
        if employee {
            person.affiliations.employee = Some(EmployeePersonAffiliation {
                directory_listing: EmployeeDirectoryListing {
                    publish_in_directory: true,
                    ..Default::default()
                },
                ..Default::default()
            });
        }
        if student {
            person.affiliations.student = Some(StudentPersonAffiliation {
                directory_listing: StudentDirectoryListing {
                    publish_in_directory: true,
                    ..Default::default()
                },
            });
        }
        person
    }

    #[test]
    fn test_predicates() {
        assert!(ConstraintPredicate::NullOrMatches.test("smith", None));
        assert!(ConstraintPredicate::NullOrMatches.test("smith", Some("SMITH")));
        assert!(!ConstraintPredicate::NullOrMatches.test("smith", Some("Smithson")));
        assert!(ConstraintPredicate::NullOrBeginsWith.test("smi", Some("Smithson")));
        assert!(ConstraintPredicate::NullOrIncludes.test("dawg", Some("Husky Dawg")));
        assert!(!ConstraintPredicate::NullOrIncludes.test("cat", Some("Husky Dawg")));
    }

    #[test]
    fn test_record_constraint_uses_preferred_names() {
        let mut person = PersonOutput::named("Robert Smith");
        let constraint = RecordConstraint::new(NameField::LastName, ConstraintPredicate::NullOrMatches, "jones");
        assert!(constraint.matches(&person));

        person.preferred_surname = Some("Smith".to_string());
        assert!(!constraint.matches(&person));
    }

    #[test]
    fn test_admit_requires_netid_and_publication() {
        let filter = PersonFilter::default();

        let mut unpublished = person("dawg", true, false);
        unpublished.whitepages_publish = false;
        assert!(!filter.admit(&mut unpublished));

        let mut anonymous = person("dawg", true, false);
        anonymous.netid = None;
        assert!(!filter.admit(&mut anonymous));

        let mut published = person("dawg", true, false);
        published.regid = Some("ABC123".to_string());
        assert!(filter.admit(&mut published));
        assert_eq!(published.href.as_deref(), Some("/identity/v2/person/ABC123/full.json"));
    }

    #[test]
    fn test_admit_test_entities_only_on_request() {
        let mut entity = person("test1", true, false);
        entity.is_test_entity = true;
        assert!(!PersonFilter::default().admit(&mut entity.clone()));
        assert!(PersonFilter::new(PopulationType::Employees, true, false).admit(&mut entity));
    }

    #[test]
    fn test_admit_clears_students_when_unauthenticated() {
        let filter = PersonFilter::new(PopulationType::All, false, false);

        let mut both = person("dawg", true, true);
        assert!(filter.admit(&mut both));
        assert!(both.affiliations.student.is_none());
        assert!(both.affiliations.employee.is_some());

        let mut student_only = person("pup", false, true);
        assert!(!filter.admit(&mut student_only));

        let authenticated = PersonFilter::new(PopulationType::All, false, true);
        assert!(authenticated.admit(&mut person("pup", false, true)));
    }

    #[test]
    fn test_admit_clears_unpublished_employee_listing() {
        let filter = PersonFilter::new(PopulationType::All, false, true);
        let mut both = person("dawg", true, true);
        if let Some(employee) = both.affiliations.employee.as_mut() {
            employee.directory_listing.publish_in_directory = false;
        }
        assert!(filter.admit(&mut both));
        assert!(both.affiliations.employee.is_none());
        assert!(both.affiliations.student.is_some());
    }

    #[test]
    fn test_apply_combines_rules_and_constraints() {
        let filter = PersonFilter::default();
        let mut preferred = person("pref", true, false);
        preferred.preferred_surname = Some("Jones".to_string());
        let persons = vec![person("dawg", true, false), preferred, person("", true, false)];

        let constraints = [RecordConstraint::new(
            NameField::LastName,
            ConstraintPredicate::NullOrMatches,
            "dawg",
        )];
        let admitted = filter.apply(persons, &constraints);
        assert_eq!(admitted.len(), 1);
        assert_eq!(admitted[0].netid.as_deref(), Some("dawg"));
    }
}
