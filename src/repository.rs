//! Person repository
//!
//! Translates typed person operations into collection primitives. Every
//! operation completes exactly once with a `Result`; "no such document"
//! on a single-document read, update or delete is `Ok(None)`.

use crate::model::person::{self, NewPerson, Person, PersonSummary};
use crate::query::{Filter, Projection, Query, ReturnDocument, SortOrder, Update};
use crate::schema::Schema;
use crate::storage::collection::{DeleteSummary, DocumentCollection};
use crate::storage::document::Document;
use crate::{Error, Result};
use std::sync::Arc;

/// Food appended by [`PersonRepository::find_edit_then_save`]
pub const FOOD_TO_ADD: &str = "hamburger";
/// Age set by [`PersonRepository::find_and_update`]
pub const AGE_TO_SET: i64 = 20;
/// Name removed by [`PersonRepository::remove_many_people`]
pub const NAME_TO_REMOVE: &str = "Mary";
/// Maximum results of [`PersonRepository::query_chain`]
pub const QUERY_CHAIN_LIMIT: usize = 2;

/// Typed access to the person collection
///
/// Cheap to clone; clones share the underlying collection handle.
#[derive(Debug, Clone)]
pub struct PersonRepository {
    collection: Arc<dyn DocumentCollection>,
    schema: Arc<Schema>,
}

impl PersonRepository {
    pub fn new(collection: Arc<dyn DocumentCollection>) -> Self {
        Self {
            collection,
            schema: Arc::new(Person::schema()),
        }
    }

    /// The record-type definition documents are validated against
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    /// Validate and store one person
    pub async fn create_person(&self, person: NewPerson) -> Result<Person> {
        let fields = self.schema.cast(person.into_fields())?;
        let doc = self.collection.insert_one(fields).await?;
        tracing::debug!(collection = self.collection_name(), id = %doc.id, "created person");
        Person::try_from(doc)
    }

    /// Validate and store a batch of people
    ///
    /// Every element is validated before anything is written, so one invalid
    /// person rejects the whole batch. Results are in input order.
    pub async fn create_many_people(&self, people: Vec<NewPerson>) -> Result<Vec<Person>> {
        let batch = people
            .into_iter()
            .map(|person| self.schema.cast(person.into_fields()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let docs = self.collection.insert_many(batch).await?;
        tracing::debug!(
            collection = self.collection_name(),
            count = docs.len(),
            "created people"
        );
        docs.into_iter().map(Person::try_from).collect()
    }

    /// Every person with exactly this name, in natural order
    pub async fn find_people_by_name(&self, name: &str) -> Result<Vec<Person>> {
        let docs = self.find(Filter::eq(person::NAME, name)).exec().await?;
        docs.into_iter().map(Person::try_from).collect()
    }

    /// Some person whose favorite foods include `food`
    pub async fn find_one_by_food(&self, food: &str) -> Result<Option<Person>> {
        self.collection
            .find_one(&Filter::eq(person::FAVORITE_FOODS, food))
            .await?
            .map(Person::try_from)
            .transpose()
    }

    /// The person with this ID; a malformed ID is an `InvalidIdentifier` error
    pub async fn find_person_by_id(&self, id: &str) -> Result<Option<Person>> {
        self.collection
            .find_one(&Filter::by_id(id))
            .await?
            .map(Person::try_from)
            .transpose()
    }

    /// Fetch a person, append [`FOOD_TO_ADD`] to their favorite foods, save
    ///
    /// Two round trips with no isolation: a write to the same person
    /// between the fetch and the save is overwritten.
    pub async fn find_edit_then_save(&self, id: &str) -> Result<Person> {
        let Some(doc) = self.collection.find_one(&Filter::by_id(id)).await? else {
            tracing::debug!(collection = self.collection_name(), id, "person not found");
            return Err(Error::PersonNotFound { id: id.to_string() });
        };

        let mut person = Person::try_from(doc)?;
        person.favorite_foods.push(FOOD_TO_ADD.to_string());

        let fields = self.schema.cast(person.to_fields())?;
        let saved = self
            .collection
            .replace_one(&Document::with_fields(person.id, fields))
            .await?;
        tracing::debug!(collection = self.collection_name(), id = %saved.id, "saved person");
        Person::try_from(saved)
    }

    /// Atomically set the first matching person's age to [`AGE_TO_SET`]
    ///
    /// Returns the person as stored after the update.
    pub async fn find_and_update(&self, name: &str) -> Result<Option<Person>> {
        let update = self.schema.cast_update(&Update::set(person::AGE, AGE_TO_SET))?;
        let updated = self
            .collection
            .find_one_and_update(&Filter::eq(person::NAME, name), &update, ReturnDocument::After)
            .await?;
        tracing::debug!(
            collection = self.collection_name(),
            name,
            matched = updated.is_some(),
            "updated age"
        );
        updated.map(Person::try_from).transpose()
    }

    /// Delete a person by ID, returning the deleted record
    pub async fn remove_by_id(&self, id: &str) -> Result<Option<Person>> {
        let removed = self.collection.find_one_and_delete(&Filter::by_id(id)).await?;
        tracing::debug!(
            collection = self.collection_name(),
            id,
            removed = removed.is_some(),
            "removed person"
        );
        removed.map(Person::try_from).transpose()
    }

    /// Delete every person named [`NAME_TO_REMOVE`]
    pub async fn remove_many_people(&self) -> Result<DeleteSummary> {
        let summary = self
            .collection
            .delete_many(&Filter::eq(person::NAME, NAME_TO_REMOVE))
            .await?;
        tracing::debug!(
            collection = self.collection_name(),
            deleted = summary.deleted_count,
            "removed people"
        );
        Ok(summary)
    }

    /// Up to [`QUERY_CHAIN_LIMIT`] people who like `food`, by name, without ages
    pub async fn query_chain(&self, food: &str) -> Result<Vec<PersonSummary>> {
        let docs = self
            .find(Filter::eq(person::FAVORITE_FOODS, food))
            .sort(person::NAME, SortOrder::Asc)
            .limit(QUERY_CHAIN_LIMIT)
            .select(Projection::exclude([person::AGE]))
            .exec()
            .await?;
        docs.into_iter().map(PersonSummary::try_from).collect()
    }

    /// Start a chained query over raw documents
    pub fn find(&self, filter: Filter) -> Query<'_> {
        Query::new(self.collection.as_ref(), filter)
    }

    /// Number of people matching `filter`
    pub async fn count(&self, filter: Filter) -> Result<u64> {
        self.collection.count(&filter).await
    }
}
