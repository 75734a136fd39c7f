//! Query construction for people-db
//!
//! Filters, find options and the lazy [`Query`] builder that only reaches
//! storage when executed.

mod builder;
mod executor;
pub mod filter;

pub use builder::Query;
pub use executor::{apply, FindOptions, Projection, ReturnDocument, SortKey, SortOrder, Update};
pub use filter::Filter;
