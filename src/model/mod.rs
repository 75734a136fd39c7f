//! Record types stored by people-db

pub mod person;

pub use person::{NewPerson, Person, PersonSummary};
