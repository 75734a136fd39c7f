//! Find options and in-memory execution
//!
//! Drivers without native query support (the file backend) run the sort,
//! limit and projection steps here after filtering.

use crate::storage::document::{Document, Fields, Value};

use super::filter::compare_values;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// One key of a sort specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub order: SortOrder,
}

/// Which fields to return from a find
///
/// The document ID is always returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Return every field except these
    Exclude(Vec<String>),
    /// Return only these fields
    Include(Vec<String>),
}

impl Projection {
    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Exclude(fields.into_iter().map(Into::into).collect())
    }

    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Include(fields.into_iter().map(Into::into).collect())
    }

    /// Apply the projection to a document
    pub fn apply(&self, doc: Document) -> Document {
        let Document { id, fields } = doc;
        let fields = match self {
            Projection::Exclude(names) => fields
                .into_iter()
                .filter(|(k, _)| !names.contains(k))
                .collect(),
            Projection::Include(names) => fields
                .into_iter()
                .filter(|(k, _)| names.contains(k))
                .collect(),
        };
        Document::with_fields(id, fields)
    }
}

/// Sort, limit and projection for a find
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Vec<SortKey>,
    pub limit: Option<usize>,
    pub projection: Option<Projection>,
}

/// A field-level update, applied atomically by the driver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    set: Fields,
}

impl Update {
    /// Set `field` to `value`
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::default().and_set(field, value)
    }

    pub fn and_set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }

    pub fn fields(&self) -> &Fields {
        &self.set
    }

    /// Apply the update to a document in place
    pub fn apply(&self, doc: &mut Document) {
        for (field, value) in &self.set {
            doc.fields.insert(field.clone(), value.clone());
        }
    }
}

/// Whether `find_one_and_update` returns the document before or after the update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnDocument {
    Before,
    #[default]
    After,
}

/// Run sort, limit and projection over already-filtered documents
///
/// Input order is the driver's natural order; the sort is stable so ties
/// keep it.
pub fn apply(mut docs: Vec<Document>, options: &FindOptions) -> Vec<Document> {
    if !options.sort.is_empty() {
        docs.sort_by(|a, b| {
            for key in &options.sort {
                let cmp = compare_values(a.get(&key.field), b.get(&key.field));
                if cmp != std::cmp::Ordering::Equal {
                    return match key.order {
                        SortOrder::Asc => cmp,
                        SortOrder::Desc => cmp.reverse(),
                    };
                }
            }
            std::cmp::Ordering::Equal
        });
    }

    if let Some(limit) = options.limit {
        docs.truncate(limit);
    }

    match &options.projection {
        Some(projection) => docs.into_iter().map(|doc| projection.apply(doc)).collect(),
        None => docs,
    }
}
