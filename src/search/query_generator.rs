

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::filter::{ConstraintPredicate, NameField, RecordConstraint};
use super::input::{SearchAttribute, SearchDirectoryInput};
use crate::pws::ListPersonsInput;
use crate::DEFAULT_PAGE_SIZE;


/// How a group of search terms is wildcarded before it is sent upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WildcardFormat {
    Matches,
    BeginsWith,
    Contains,
}

impl WildcardFormat {
    fn wrap(self, term: &str) -> String {
        match self {
            Self::Matches => term.to_string(),
            Self::BeginsWith => format!("{term}*"),
            Self::Contains => format!("*{term}*"),
        }
    }

    /// Formats the space-joined group: `["a", "b"]` begins-with -> `a b*`.
    pub fn apply<S: AsRef<str>>(self, args: &[S]) -> String {
        self.wrap(&join(args))
    }

    /// Formats each term on its own: `["a", "b"]` begins-with -> `a* b*`.
    pub fn apply_each<S: AsRef<str>>(self, args: &[S]) -> String {
        args.iter()
            .map(|arg| self.wrap(arg.as_ref()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Matches => "is",
            Self::BeginsWith => "begins with",
            Self::Contains => "contains",
        }
    }

    pub fn predicate(self) -> ConstraintPredicate {
        match self {
            Self::Matches => ConstraintPredicate::NullOrMatches,
            Self::BeginsWith => ConstraintPredicate::NullOrBeginsWith,
            Self::Contains => ConstraintPredicate::NullOrIncludes,
        }
    }
}

fn join<S: AsRef<str>>(args: &[S]) -> String {
    let parts: Vec<&str> = args.iter().map(|arg| arg.as_ref()).collect();
    parts.join(" ")
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitLabels {
    /// "First name ..., last name ..."
    FirstLast,
    /// "First name ..., rest ..." (or "First/middle name" past the first token)
    FirstRest,
}


/// One name-query generation rule. Templates are plain data; the formatting
/// happens in `describe` and `to_query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTemplate {
    /// A single field filtered by the whole term.
    Field { field: NameField, format: WildcardFormat },
    /// Terms before `slice` filter the first name, the rest filter the last name.
    Split {
        slice: usize,
        first: WildcardFormat,
        last: WildcardFormat,
        labels: SplitLabels,
    },
    /// Every term independently begins a part of the display name.
    NameParts,
}

impl QueryTemplate {
    pub fn describe<S: AsRef<str>>(&self, args: &[S]) -> String {
        match *self {
            Self::Field { field, format } => {
                let field_label = match field {
                    NameField::FirstName => "First name",
                    NameField::LastName => "Last name",
                    NameField::DisplayName => "Name",
                };
                format!("{} {} \"{}\"", field_label, format.label(), join(args))
            }
            Self::Split { slice, first, last, labels } => {
                let (head, tail) = split_at(args, slice);
                let (first_label, last_label) = match labels {
                    SplitLabels::FirstLast => ("First name", "last name"),
                    SplitLabels::FirstRest if slice == 1 => ("First name", "rest"),
                    SplitLabels::FirstRest => ("First/middle name", "rest"),
                };
                format!(
                    "{} {} \"{}\", {} {} \"{}\"",
                    first_label,
                    first.label(),
                    join(head),
                    last_label,
                    last.label(),
                    join(tail)
                )
            }
            Self::NameParts => {
                let parts: Vec<&str> = args.iter().map(|arg| arg.as_ref()).collect();
                format!("Name parts begin with: {}", parts.join("/"))
            }
        }
    }

    pub fn to_query<S: AsRef<str>>(&self, args: &[S]) -> ListPersonsInput {
        match *self {
            Self::Field { field, format } => {
                let value = Some(format.apply(args));
                match field {
                    NameField::FirstName => ListPersonsInput { first_name: value, ..Default::default() },
                    NameField::LastName => ListPersonsInput { last_name: value, ..Default::default() },
                    NameField::DisplayName => ListPersonsInput { display_name: value, ..Default::default() },
                }
            }
            Self::Split { slice, first, last, .. } => {
                let (head, tail) = split_at(args, slice);
                ListPersonsInput {
                    first_name: Some(first.apply(head)),
                    last_name: Some(last.apply(tail)),
                    ..Default::default()
                }
            }
            Self::NameParts => ListPersonsInput {
                display_name: Some(WildcardFormat::BeginsWith.apply_each(args)),
                ..Default::default()
            },
        }
    }

    pub fn constraints<S: AsRef<str>>(&self, args: &[S]) -> Vec<RecordConstraint> {
        match *self {
            Self::Field { field, format } => {
                vec![RecordConstraint::new(field, format.predicate(), join(args))]
            }
            Self::Split { slice, first, last, .. } => {
                let (head, tail) = split_at(args, slice);
                vec![
                    RecordConstraint::new(NameField::FirstName, first.predicate(), join(head)),
                    RecordConstraint::new(NameField::LastName, last.predicate(), join(tail)),
                ]
            }
            Self::NameParts => Vec::new(),
        }
    }
}

fn split_at<S>(args: &[S], slice: usize) -> (&[S], &[S]) {
    args.split_at(slice.min(args.len()))
}

const SPLIT_COMBINATIONS: [(WildcardFormat, WildcardFormat); 4] = [
    (WildcardFormat::Matches, WildcardFormat::Matches),
    (WildcardFormat::Matches, WildcardFormat::BeginsWith),
    (WildcardFormat::BeginsWith, WildcardFormat::Matches),
    (WildcardFormat::BeginsWith, WildcardFormat::BeginsWith),
];

lazy_static! {
    /// Hand-picked templates for one- and two-word names. Longer names use
    /// `sliced_templates`.
    pub static ref NAME_QUERY_TEMPLATES: HashMap<usize, Vec<QueryTemplate>> = {
        use QueryTemplate::{Field, Split};
        use WildcardFormat::{BeginsWith, Contains, Matches};

        let mut m = HashMap::new();
        m.insert(1, vec![
            Field { field: NameField::LastName, format: Matches },
            Field { field: NameField::LastName, format: BeginsWith },
            Field { field: NameField::FirstName, format: Matches },
            Field { field: NameField::DisplayName, format: Contains },
        ]);
        m.insert(2, vec![
            Split { slice: 1, first: Matches, last: Matches, labels: SplitLabels::FirstLast },
            Split { slice: 1, first: BeginsWith, last: Matches, labels: SplitLabels::FirstLast },
            Split { slice: 1, first: Matches, last: BeginsWith, labels: SplitLabels::FirstLast },
            Split { slice: 1, first: BeginsWith, last: BeginsWith, labels: SplitLabels::FirstLast },
            Field { field: NameField::LastName, format: BeginsWith },
        ]);
        m
    };

    static ref EMAIL_ADDRESS: Regex =
        Regex::new(r"^[^@\s*]+@[^@\s*]+\.[^@\s*]+$").expect("valid regex");
}


/// Every split point and first/last format combination, followed by the
/// name-parts fallback.
pub fn sliced_templates(cardinality: usize) -> Vec<QueryTemplate> {
    let mut templates: Vec<QueryTemplate> = (1..cardinality)
        .flat_map(|slice| {
            SPLIT_COMBINATIONS.iter().map(move |&(first, last)| QueryTemplate::Split {
                slice,
                first,
                last,
                labels: SplitLabels::FirstRest,
            })
        })
        .collect();
    templates.push(QueryTemplate::NameParts);
    templates
}


/// One interpretation of the user's input, in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuery {
    pub description: String,
    pub request_input: ListPersonsInput,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<RecordConstraint>,
}

impl GeneratedQuery {
    pub fn new(description: impl Into<String>, request_input: ListPersonsInput) -> Self {
        Self {
            description: description.into(),
            request_input,
            constraints: Vec::new(),
        }
    }

    fn for_students(&self) -> Self {
        Self {
            request_input: self.request_input.for_students(),
            ..self.clone()
        }
    }
}


/// Lazily yields the candidate queries for a name. Regenerating from the same
/// name yields an identical sequence.
#[derive(Debug, Clone)]
pub struct NameQueries {
    name: String,
    tokens: Vec<String>,
    exact_pending: bool,
    plan: std::vec::IntoIter<QueryTemplate>,
    page_size: u32,
}

impl NameQueries {
    fn new(name: &str, page_size: u32) -> Self {
        let name = name.trim().to_string();
        let tokens: Vec<String> = name.split_whitespace().map(String::from).collect();

        let plan = if tokens.is_empty() || name.contains('*') {
            Vec::new()
        } else {
            NAME_QUERY_TEMPLATES
                .get(&tokens.len())
                .cloned()
                .unwrap_or_else(|| sliced_templates(tokens.len()))
        };

        Self {
            exact_pending: !tokens.is_empty(),
            name,
            tokens,
            plan: plan.into_iter(),
            page_size,
        }
    }
}

impl Iterator for NameQueries {
    type Item = GeneratedQuery;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exact_pending {
            self.exact_pending = false;
            return Some(GeneratedQuery::new(
                format!("Name matches \"{}\"", self.name),
                ListPersonsInput {
                    display_name: Some(self.name.clone()),
                    ..Default::default()
                }
                .with_page_size(self.page_size),
            ));
        }

        let template = self.plan.next()?;
        Some(GeneratedQuery {
            description: template.describe(&self.tokens),
            request_input: template.to_query(&self.tokens).with_page_size(self.page_size),
            constraints: template.constraints(&self.tokens),
        })
    }
}


/// Turns validated search input into the ordered candidate queries to run
/// upstream.
#[derive(Debug, Clone, Copy)]
pub struct QueryGenerator {
    authenticated: bool,
    page_size: u32,
}

impl QueryGenerator {
    pub fn new(authenticated: bool, page_size: u32) -> Self {
        Self {
            authenticated,
            page_size,
        }
    }

    pub fn generate_name_queries(&self, name: &str) -> NameQueries {
        NameQueries::new(name, self.page_size)
    }

    /// Exact, begins-with and contains; a term with "and" or "&" is repeated
    /// once with the other spelling.
    pub fn generate_department_queries(&self, department: &str) -> Vec<GeneratedQuery> {
        let mut queries = self.department_queries(department);
        if department.contains('*') {
            return queries;
        }

        let alternate = if department.contains(" and ") {
            department.replace(" and ", " & ")
        } else if department.contains('&') {
            department.replace('&', " and ")
        } else {
            return queries;
        };
        let alternate = alternate.split_whitespace().collect::<Vec<_>>().join(" ");
        queries.extend(self.department_queries(&alternate));
        queries
    }

    fn department_queries(&self, department: &str) -> Vec<GeneratedQuery> {
        let query = |value: String| {
            ListPersonsInput {
                department: Some(value),
                ..Default::default()
            }
            .with_page_size(self.page_size)
        };

        let mut queries = vec![GeneratedQuery::new(
            format!("Department matches \"{department}\""),
            query(department.to_string()),
        )];
        if department.contains('*') {
            return queries;
        }
        queries.push(GeneratedQuery::new(
            format!("Department begins with \"{department}\""),
            query(WildcardFormat::BeginsWith.apply(&[department])),
        ));
        queries.push(GeneratedQuery::new(
            format!("Department contains \"{department}\""),
            query(WildcardFormat::Contains.apply(&[department])),
        ));
        queries
    }

    /// Full addresses match exactly (plus the sibling campus domain); partial
    /// input without `@` or `*` is widened to begins-with and contains.
    pub fn generate_email_queries(&self, email: &str) -> Vec<GeneratedQuery> {
        let query = |value: String| {
            ListPersonsInput {
                email: Some(value),
                ..Default::default()
            }
            .with_page_size(self.page_size)
        };

        if EMAIL_ADDRESS.is_match(email) {
            let mut queries = vec![GeneratedQuery::new(
                format!("Email is \"{email}\""),
                query(email.to_string()),
            )];
            let (username, domain) = email.rsplit_once('@').unwrap_or((email, ""));
            let alternate = match domain.to_ascii_lowercase().as_str() {
                "uw.edu" => Some("washington.edu"),
                "washington.edu" => Some("uw.edu"),
                _ => None,
            };
            if let Some(alternate) = alternate {
                let alternate_email = format!("{username}@{alternate}");
                queries.push(GeneratedQuery::new(
                    format!("Email is \"{alternate_email}\""),
                    query(alternate_email),
                ));
            }
            return queries;
        }

        if email.contains('@') || email.contains('*') {
            return vec![GeneratedQuery::new(
                format!("Email matches \"{email}\""),
                query(email.to_string()),
            )];
        }

        vec![
            GeneratedQuery::new(
                format!("Email begins with \"{email}\""),
                query(WildcardFormat::BeginsWith.apply(&[email])),
            ),
            GeneratedQuery::new(
                format!("Email contains \"{email}\""),
                query(WildcardFormat::Contains.apply(&[email])),
            ),
        ]
    }

    /// Matches the digits as given, then the last ten digits when a country
    /// code is present.
    pub fn generate_phone_queries(&self, digits: &str) -> Vec<GeneratedQuery> {
        let query = |value: &str| {
            ListPersonsInput {
                phone_number: Some(value.to_string()),
                ..Default::default()
            }
            .with_page_size(self.page_size)
        };

        let mut queries = vec![GeneratedQuery::new(
            format!("Phone matches \"{digits}\""),
            query(digits),
        )];
        if digits.len() > 10 {
            let local = &digits[digits.len() - 10..];
            queries.push(GeneratedQuery::new(format!("Phone matches \"{local}\""), query(local)));
        }
        queries
    }

    /// Mail stops are commonly written without their leading "35", so both
    /// spellings are tried.
    pub fn generate_box_number_queries(&self, box_number: &str) -> Vec<GeneratedQuery> {
        [box_number.to_string(), format!("35{box_number}")]
            .into_iter()
            .map(|mail_stop| {
                GeneratedQuery::new(
                    format!("Mailstop begins with \"{mail_stop}\""),
                    ListPersonsInput {
                        mail_stop: Some(mail_stop),
                        ..Default::default()
                    }
                    .with_page_size(self.page_size),
                )
            })
            .collect()
    }

    /// Every candidate for the input's attribute, expanded across the
    /// requested populations. Upstream cannot OR employee and student
    /// affiliation, so students get their own copy of each query.
    pub fn generate(&self, input: &SearchDirectoryInput) -> impl Iterator<Item = GeneratedQuery> + use<> {
        let base: Box<dyn Iterator<Item = GeneratedQuery> + Send> = match input.attribute() {
            Some(SearchAttribute::Name(name)) => Box::new(self.generate_name_queries(name)),
            Some(SearchAttribute::Department(department)) => {
                Box::new(self.generate_department_queries(department).into_iter())
            }
            Some(SearchAttribute::Email(email)) => Box::new(self.generate_email_queries(email).into_iter()),
            Some(SearchAttribute::Phone(digits)) => Box::new(self.generate_phone_queries(&digits).into_iter()),
            Some(SearchAttribute::BoxNumber(box_number)) => {
                Box::new(self.generate_box_number_queries(box_number).into_iter())
            }
            None => {
                debug!("No searchable attribute in input");
                Box::new(std::iter::empty())
            }
        };

        let population = input.population;
        let employees = population.includes_employees();
        let students = population.includes_students() && self.authenticated;

        base.flat_map(move |generated| {
            let student_copy = students.then(|| generated.for_students());
            let employee_copy = employees.then_some(generated);
            employee_copy.into_iter().chain(student_copy)
        })
    }
}

impl Default for QueryGenerator {
    fn default() -> Self {
        Self::new(false, DEFAULT_PAGE_SIZE)
    }
}
