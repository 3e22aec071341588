

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::DEFAULT_PAGE_SIZE;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr)]
pub enum AffiliationState {
    #[serde(rename = "current")]
    #[strum(serialize = "current")]
    Current,
    #[serde(rename = "prior")]
    #[strum(serialize = "prior")]
    Prior,
    #[serde(rename = "current,prior")]
    #[strum(serialize = "current,prior")]
    Exists,
}


/// Query parameters accepted by the person search endpoint. String filters
/// accept literal values or `*` wildcards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPersonsInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_affiliation_state: Option<AffiliationState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_affiliation_state: Option<AffiliationState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail_stop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_start: Option<u32>,
    /// Abridged records omit the publication flags we filter on.
    pub verbose: bool,
}

impl Default for ListPersonsInput {
    fn default() -> Self {
        Self {
            first_name: None,
            last_name: None,
            display_name: None,
            employee_affiliation_state: Some(AffiliationState::Current),
            student_affiliation_state: None,
            mail_stop: None,
            email: None,
            department: None,
            phone_number: None,
            page_size: DEFAULT_PAGE_SIZE,
            page_start: None,
            verbose: true,
        }
    }
}

impl ListPersonsInput {
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Retargets the query from current employees to current students.
    pub fn for_students(&self) -> Self {
        Self {
            employee_affiliation_state: None,
            student_affiliation_state: Some(AffiliationState::Current),
            ..self.clone()
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmployeePosition {
    #[serde(rename = "EWPDept", default)]
    pub department: Option<String>,
    #[serde(rename = "EWPTitle", default)]
    pub title: Option<String>,
    #[serde(default)]
    pub primary: bool,
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EmployeeDirectoryListing {
    pub name: Option<String>,
    pub publish_in_directory: bool,
    pub phones: Vec<String>,
    #[serde(rename = "EmailAddresses")]
    pub emails: Vec<String>,
    pub positions: Vec<EmployeePosition>,
    pub faxes: Vec<String>,
    pub voice_mails: Vec<String>,
    pub touch_dials: Vec<String>,
    pub pagers: Vec<String>,
    pub mobiles: Vec<String>,
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct StudentDirectoryListing {
    pub name: Option<String>,
    pub publish_in_directory: bool,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "Class")]
    pub class_level: Option<String>,
    pub departments: Vec<String>,
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmployeePersonAffiliation {
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub mail_stop: Option<String>,
    #[serde(rename = "EmployeeWhitePages", default)]
    pub directory_listing: EmployeeDirectoryListing,
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentPersonAffiliation {
    #[serde(rename = "StudentWhitePages", default)]
    pub directory_listing: StudentDirectoryListing,
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonAffiliations {
    #[serde(rename = "EmployeePersonAffiliation", default)]
    pub employee: Option<EmployeePersonAffiliation>,
    #[serde(rename = "StudentPersonAffiliation", default)]
    pub student: Option<StudentPersonAffiliation>,
}

impl PersonAffiliations {
    pub fn is_empty(&self) -> bool {
        self.employee.is_none() && self.student.is_none()
    }
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PersonOutput {
    pub display_name: String,
    pub registered_name: Option<String>,
    pub registered_surname: Option<String>,
    pub registered_first_middle_name: Option<String>,
    pub preferred_first_name: Option<String>,
    pub preferred_middle_name: Option<String>,
    #[serde(alias = "PreferredLastName")]
    pub preferred_surname: Option<String>,
    pub pronouns: Option<String>,
    #[serde(rename = "UWRegID")]
    pub regid: Option<String>,
    #[serde(rename = "UWNetID")]
    pub netid: Option<String>,
    pub whitepages_publish: bool,
    pub is_test_entity: bool,
    #[serde(rename = "PersonAffiliations")]
    pub affiliations: PersonAffiliations,
    pub href: Option<String>,
}

impl PersonOutput {
    pub fn named(display_name: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            ..Self::default()
        }
    }

    /// Full records omit the href, so it is derived from the regid.
    pub fn resolved_href(&self) -> Option<String> {
        self.href.clone().or_else(|| {
            self.regid
                .as_ref()
                .map(|regid| format!("/identity/v2/person/{regid}/full.json"))
        })
    }
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageReference {
    #[serde(rename = "Href", default)]
    pub href: Option<String>,
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ListPersonsOutput {
    pub total_count: u32,
    pub page_size: u32,
    pub page_start: u32,
    pub persons: Vec<PersonOutput>,
    pub next: Option<PageReference>,
    pub previous: Option<PageReference>,
}

impl ListPersonsOutput {
    pub fn next_href(&self) -> Option<&str> {
        self.next
            .as_ref()
            .and_then(|next| next.href.as_deref())
            .filter(|href| !href.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_params_are_camel_case() {
        let query = ListPersonsInput {
            last_name: Some("smith*".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(
            value,
            json!({
                "lastName": "smith*",
                "employeeAffiliationState": "current",
                "pageSize": 250,
                "verbose": true,
            })
        );
    }

    #[test]
    fn test_for_students_swaps_affiliation_filters() {
        let query = ListPersonsInput::default().for_students();
        assert_eq!(query.employee_affiliation_state, None);
        assert_eq!(query.student_affiliation_state, Some(AffiliationState::Current));
    }

    #[test]
    fn test_parse_person_page() {
        let page: ListPersonsOutput = serde_json::from_value(json!({
            "TotalCount": 1,
            "PageSize": 1,
            "PageStart": 1,
            "Persons": [{
                "DisplayName": "Husky Dawg",
                "RegisteredSurname": "DAWG",
                "RegisteredFirstMiddleName": "HUSKY",
                "PreferredLastName": "Dawg",
                "UWNetID": "dawg",
                "UWRegID": "ABC123",
                "WhitepagesPublish": true,
                "IsTestEntity": false,
                "PersonAffiliations": {
                    "EmployeePersonAffiliation": {
                        "MailStop": "351234",
                        "EmployeeWhitePages": {
                            "PublishInDirectory": true,
                            "EmailAddresses": ["dawg@uw.edu"],
                            "Positions": [{"EWPDept": "Athletics", "EWPTitle": "Mascot", "Primary": true}]
                        }
                    }
                }
            }],
            "Next": {"Href": "/identity/v2/person?page_start=2"}
        }))
        .unwrap();

        let person = &page.persons[0];
        assert_eq!(person.netid.as_deref(), Some("dawg"));
        assert_eq!(person.preferred_surname.as_deref(), Some("Dawg"));
        assert_eq!(
            person.resolved_href().as_deref(),
            Some("/identity/v2/person/ABC123/full.json")
        );
        let employee = person.affiliations.employee.as_ref().unwrap();
        assert_eq!(employee.directory_listing.emails, vec!["dawg@uw.edu"]);
        assert_eq!(
            employee.directory_listing.positions[0].title.as_deref(),
            Some("Mascot")
        );
        assert!(person.affiliations.student.is_none());
        assert_eq!(page.next_href(), Some("/identity/v2/person?page_start=2"));
    }
}
