//! Chained query builder
//!
//! ```ignore
//! let docs = Query::new(collection, Filter::eq("favoriteFoods", "burrito"))
//!     .sort("name", SortOrder::Asc)
//!     .limit(2)
//!     .select(Projection::exclude(["age"]))
//!     .exec()
//!     .await?;
//! ```

use crate::storage::collection::DocumentCollection;
use crate::storage::document::Document;
use crate::Result;

use super::executor::{FindOptions, Projection, SortKey, SortOrder};
use super::filter::Filter;

/// A find that accumulates its steps and runs them on [`Query::exec`]
#[must_use = "a query does nothing until `exec` is awaited"]
pub struct Query<'a> {
    collection: &'a dyn DocumentCollection,
    filter: Filter,
    options: FindOptions,
}

impl<'a> Query<'a> {
    pub fn new(collection: &'a dyn DocumentCollection, filter: Filter) -> Self {
        Self {
            collection,
            filter,
            options: FindOptions::default(),
        }
    }

    /// Add a sort key; earlier keys take precedence
    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.options.sort.push(SortKey {
            field: field.into(),
            order,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.options.limit = Some(limit);
        self
    }

    pub fn select(mut self, projection: Projection) -> Self {
        self.options.projection = Some(projection);
        self
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn options(&self) -> &FindOptions {
        &self.options
    }

    /// Run the query against the collection
    pub async fn exec(self) -> Result<Vec<Document>> {
        tracing::debug!(
            collection = self.collection.name(),
            filter = ?self.filter,
            options = ?self.options,
            "executing query"
        );
        self.collection.find(&self.filter, &self.options).await
    }
}

impl std::fmt::Debug for Query<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("collection", &self.collection.name())
            .field("filter", &self.filter)
            .field("options", &self.options)
            .finish()
    }
}
