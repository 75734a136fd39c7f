//! Storage layer for people-db
//!
//! Document model, the collection driver seam, and its backends.

pub mod codec;
pub mod collection;
pub mod document;
#[cfg(feature = "mongodb")]
pub mod mongo;
