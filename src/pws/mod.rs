

pub mod client;
pub mod models;

pub use client::{PersonDirectory, PwsClient};
pub use models::{
    AffiliationState, EmployeePersonAffiliation, ListPersonsInput, ListPersonsOutput,
    PageReference, PersonAffiliations, PersonOutput, StudentPersonAffiliation,
};
