

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::name_analyzer::NameAnalyzer;
use super::similarity::is_similar;
use crate::pws::PersonOutput;
use crate::utils::readable_list;


/// People who share one relevance classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBucket {
    pub description: String,
    pub relevance: u32,
    #[serde(default)]
    pub employees: Vec<PersonOutput>,
    #[serde(default)]
    pub students: Vec<PersonOutput>,
}

impl ResultBucket {
    pub fn new(description: impl Into<String>, relevance: u32) -> Self {
        Self {
            description: description.into(),
            relevance,
            employees: Vec::new(),
            students: Vec::new(),
        }
    }

    /// A person with both affiliations appears in both partitions.
    pub fn add_person(&mut self, person: PersonOutput) {
        let is_employee = person.affiliations.employee.is_some();
        let is_student = person.affiliations.student.is_some();
        match (is_employee, is_student) {
            (true, true) => {
                self.students.push(person.clone());
                self.employees.push(person);
            }
            (true, false) => self.employees.push(person),
            (false, true) => self.students.push(person),
            (false, false) => {}
        }
    }

    pub fn len(&self) -> usize {
        self.employees.len() + self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sorted_employees(&self) -> Vec<&PersonOutput> {
        sorted_by_name(&self.employees)
    }

    pub fn sorted_students(&self) -> Vec<&PersonOutput> {
        sorted_by_name(&self.students)
    }
}

fn sorted_by_name(persons: &[PersonOutput]) -> Vec<&PersonOutput> {
    let mut sorted: Vec<&PersonOutput> = persons.iter().collect();
    sorted.sort_by_cached_key(|person| NameAnalyzer::new(person).sort_key().to_string());
    sorted
}


/// Buckets keyed by description, iterated by ascending relevance. Buckets of
/// equal relevance keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketMap(Vec<ResultBucket>);

impl BucketMap {
    pub fn get(&self, description: &str) -> Option<&ResultBucket> {
        self.0.iter().find(|bucket| bucket.description == description)
    }

    fn entry(&mut self, description: &str, relevance: u32) -> &mut ResultBucket {
        let index = match self.0.iter().position(|bucket| bucket.description == description) {
            Some(index) => index,
            None => {
                let index = self.0.partition_point(|bucket| bucket.relevance <= relevance);
                self.0.insert(index, ResultBucket::new(description, relevance));
                index
            }
        };
        &mut self.0[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultBucket> {
        self.0.iter()
    }

    pub fn descriptions(&self) -> Vec<&str> {
        self.0.iter().map(|bucket| bucket.description.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for BucketMap {
    type Item = ResultBucket;
    type IntoIter = std::vec::IntoIter<ResultBucket>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    NameIs,
    LastNameIs,
    FirstNameIs,
    LastNameStartsWith,
    FirstNameStartsWith,
    NameIsSimilar,
    NameContainsAll,
}

/// Evaluated in order; the first matching rule decides the bucket.
const RELEVANCE_RULES: [(RuleKind, u32); 7] = [
    (RuleKind::NameIs, 1),
    (RuleKind::LastNameIs, 2),
    (RuleKind::FirstNameIs, 3),
    (RuleKind::LastNameStartsWith, 4),
    (RuleKind::FirstNameStartsWith, 5),
    (RuleKind::NameIsSimilar, 6),
    (RuleKind::NameContainsAll, 7),
];


/// Classifies one person against the query a name search started from.
pub struct NameQueryAnalyzer<'a> {
    query: &'a str,
    fuzziness: f64,
    cmp_query: String,
    cmp_name: String,
    cmp_surname: String,
    cmp_first_name: String,
}

impl<'a> NameQueryAnalyzer<'a> {
    pub fn new(person: &PersonOutput, query: &'a str, fuzziness: f64) -> Self {
        let names = NameAnalyzer::new(person);
        Self {
            query,
            fuzziness,
            cmp_query: query.to_lowercase(),
            cmp_name: person.display_name.to_lowercase(),
            cmp_surname: names.surname().to_lowercase(),
            cmp_first_name: names.first_name().to_lowercase(),
        }
    }

    fn matches(&self, rule: RuleKind) -> bool {
        match rule {
            RuleKind::NameIs => self.cmp_name == self.cmp_query,
            RuleKind::LastNameIs => self.cmp_surname == self.cmp_query,
            RuleKind::FirstNameIs => self.cmp_first_name == self.cmp_query,
            RuleKind::LastNameStartsWith => self.cmp_surname.starts_with(&self.cmp_query),
            RuleKind::FirstNameStartsWith => self.cmp_first_name.starts_with(&self.cmp_query),
            RuleKind::NameIsSimilar => is_similar(&self.cmp_query, &self.cmp_name, self.fuzziness),
            RuleKind::NameContainsAll => {
                let mut tokens = self.cmp_query.split_whitespace().peekable();
                tokens.peek().is_some() && tokens.all(|token| self.cmp_name.contains(token))
            }
        }
    }

    fn describe(&self, rule: RuleKind) -> String {
        let query = self.query;
        match rule {
            RuleKind::NameIs => format!("Name is \"{query}\""),
            RuleKind::LastNameIs => format!("Last name is \"{query}\""),
            RuleKind::FirstNameIs => format!("First name is \"{query}\""),
            RuleKind::LastNameStartsWith => format!("Last name starts with \"{query}\""),
            RuleKind::FirstNameStartsWith => format!("First name starts with \"{query}\""),
            RuleKind::NameIsSimilar => format!("Name is similar to \"{query}\""),
            RuleKind::NameContainsAll => {
                let tokens: Vec<&str> = query.split_whitespace().collect();
                if tokens.len() > 2 {
                    format!("Name contains all of {}", readable_list(&tokens))
                } else {
                    format!("Name contains {}", readable_list(&tokens))
                }
            }
        }
    }

    /// Bucket description and relevance, or `None` when no rule applies.
    pub fn relevant_bucket(&self) -> Option<(String, u32)> {
        RELEVANCE_RULES
            .iter()
            .find(|(rule, _)| self.matches(*rule))
            .map(|&(rule, relevance)| (self.describe(rule), relevance))
    }
}


#[derive(Debug, Clone, PartialEq)]
pub enum ReductionMode {
    /// Buckets come from how each person's name relates to the query.
    Name { query: String, fuzziness: f64 },
    /// Buckets are the candidate queries themselves, in generation order.
    Scenario,
}


/// Folds upstream pages into buckets for one logical search. Each netid is
/// kept once, in the first bucket that claims it.
#[derive(Debug)]
pub struct ResultReducer {
    mode: ReductionMode,
    seen_netids: HashSet<String>,
    duplicate_hit_count: usize,
    buckets: BucketMap,
}

impl ResultReducer {
    pub fn new(mode: ReductionMode) -> Self {
        Self {
            mode,
            seen_netids: HashSet::new(),
            duplicate_hit_count: 0,
            buckets: BucketMap::default(),
        }
    }

    pub fn for_name(query: &str, fuzziness: f64) -> Self {
        Self::new(ReductionMode::Name {
            query: query.to_string(),
            fuzziness,
        })
    }

    pub fn for_scenario() -> Self {
        Self::new(ReductionMode::Scenario)
    }

    pub fn duplicate_hit_count(&self) -> usize {
        self.duplicate_hit_count
    }

    /// `ordinal` is the zero-based position of the candidate query that
    /// produced the page.
    pub fn reduce_page(&mut self, description: &str, ordinal: u32, persons: Vec<PersonOutput>) {
        for person in persons {
            let Some(netid) = person.netid.clone().filter(|netid| !netid.is_empty()) else {
                debug!("Skipping record without netid: {}", person.display_name);
                continue;
            };
            if self.seen_netids.contains(&netid) {
                self.duplicate_hit_count += 1;
                continue;
            }
            if person.affiliations.is_empty() {
                debug!("Skipping record without affiliations: {}", netid);
                continue;
            }

            let bucket = match &self.mode {
                ReductionMode::Name { query, fuzziness } => {
                    NameQueryAnalyzer::new(&person, query, *fuzziness).relevant_bucket()
                }
                ReductionMode::Scenario => Some((description.to_string(), ordinal + 1)),
            };
            let Some((bucket_description, relevance)) = bucket else {
                let query = match &self.mode {
                    ReductionMode::Name { query, .. } => query.as_str(),
                    ReductionMode::Scenario => description,
                };
                info!(
                    "Could not find relevant bucket for person {} matching query {}",
                    person.display_name, query
                );
                continue;
            };

            self.buckets.entry(&bucket_description, relevance).add_person(person);
            self.seen_netids.insert(netid);
        }
    }

    pub fn finish(self) -> BucketMap {
        if self.duplicate_hit_count > 0 {
            debug!("Skipped {} duplicate records", self.duplicate_hit_count);
        }
        self.buckets
    }
}

impl Default for ResultReducer {
    fn default() -> Self {
        Self::new(ReductionMode::Scenario)
    }
}
