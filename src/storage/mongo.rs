//! MongoDB backend
//!
//! Maps the collection primitives one-to-one onto driver calls. Filters,
//! sorts and projections are pushed down to the server; the document ID is
//! the hex form of the `_id` ObjectId.

use super::collection::{DeleteSummary, DocumentCollection};
use super::document::{Document, Fields, Value};
use crate::query::{Filter, FindOptions, Projection, ReturnDocument, SortKey, SortOrder, Update};
use crate::{Error, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{oid::ObjectId, Bson, Document as BsonDocument};
use mongodb::options::ReturnDocument as MongoReturnDocument;

/// Version key some ODMs add to every document; never part of the record
const VERSION_KEY: &str = "__v";

/// Connect to a MongoDB deployment and select a database
pub async fn connect(uri: &str, database: &str) -> Result<mongodb::Database> {
    let client = mongodb::Client::with_uri_str(uri).await?;
    Ok(client.database(database))
}

/// A collection on a MongoDB server
#[derive(Debug, Clone)]
pub struct MongoCollection {
    name: String,
    inner: mongodb::Collection<BsonDocument>,
}

impl MongoCollection {
    pub fn new(database: &mongodb::Database, name: impl Into<String>) -> Self {
        let name = name.into();
        let inner = database.collection::<BsonDocument>(&name);
        Self { name, inner }
    }
}

#[async_trait]
impl DocumentCollection for MongoCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert_one(&self, fields: Fields) -> Result<Document> {
        let id = ObjectId::new();
        self.inner.insert_one(to_bson_document(Some(id), &fields)).await?;
        Ok(Document::with_fields(id.to_hex(), fields))
    }

    async fn insert_many(&self, batch: Vec<Fields>) -> Result<Vec<Document>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<ObjectId> = batch.iter().map(|_| ObjectId::new()).collect();
        let docs: Vec<BsonDocument> = ids
            .iter()
            .zip(&batch)
            .map(|(id, fields)| to_bson_document(Some(*id), fields))
            .collect();

        self.inner.insert_many(docs).ordered(true).await?;

        Ok(ids
            .into_iter()
            .zip(batch)
            .map(|(id, fields)| Document::with_fields(id.to_hex(), fields))
            .collect())
    }

    async fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<Document>> {
        let mut action = self.inner.find(filter_to_bson(filter)?);
        if !options.sort.is_empty() {
            action = action.sort(sort_to_bson(&options.sort));
        }
        if let Some(limit) = options.limit {
            action = action.limit(limit as i64);
        }
        if let Some(projection) = &options.projection {
            action = action.projection(projection_to_bson(projection));
        }

        let cursor = action.await?;
        let raw: Vec<BsonDocument> = cursor.try_collect().await?;
        raw.into_iter().map(from_bson_document).collect()
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>> {
        self.inner
            .find_one(filter_to_bson(filter)?)
            .await?
            .map(from_bson_document)
            .transpose()
    }

    async fn replace_one(&self, doc: &Document) -> Result<Document> {
        let id = object_id(&doc.id)?;
        let mut selector = BsonDocument::new();
        selector.insert("_id", id);

        let result = self
            .inner
            .replace_one(selector, to_bson_document(None, &doc.fields))
            .await?;
        if result.matched_count == 0 {
            return Err(Error::DocumentNotFound {
                collection: self.name.clone(),
                id: doc.id.clone(),
            });
        }

        Ok(Document::with_fields(id.to_hex(), doc.fields.clone()))
    }

    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &Update,
        returning: ReturnDocument,
    ) -> Result<Option<Document>> {
        let mut modifications = BsonDocument::new();
        modifications.insert("$set", to_bson_document(None, update.fields()));

        let returning = match returning {
            ReturnDocument::Before => MongoReturnDocument::Before,
            ReturnDocument::After => MongoReturnDocument::After,
        };

        self.inner
            .find_one_and_update(filter_to_bson(filter)?, modifications)
            .return_document(returning)
            .await?
            .map(from_bson_document)
            .transpose()
    }

    async fn find_one_and_delete(&self, filter: &Filter) -> Result<Option<Document>> {
        self.inner
            .find_one_and_delete(filter_to_bson(filter)?)
            .await?
            .map(from_bson_document)
            .transpose()
    }

    async fn delete_many(&self, filter: &Filter) -> Result<DeleteSummary> {
        let result = self.inner.delete_many(filter_to_bson(filter)?).await?;
        Ok(DeleteSummary {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }

    async fn count(&self, filter: &Filter) -> Result<u64> {
        Ok(self.inner.count_documents(filter_to_bson(filter)?).await?)
    }
}

fn object_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| Error::InvalidIdentifier {
        kind: "document ID",
        value: id.to_string(),
        reason: "not a valid ObjectId",
    })
}

fn filter_to_bson(filter: &Filter) -> Result<BsonDocument> {
    let mut doc = BsonDocument::new();
    if let Some(id) = filter.id() {
        doc.insert("_id", object_id(id)?);
    }
    for (field, value) in filter.conditions() {
        doc.insert(field.clone(), to_bson(value));
    }
    Ok(doc)
}

fn sort_to_bson(keys: &[SortKey]) -> BsonDocument {
    keys.iter()
        .map(|key| {
            let direction = match key.order {
                SortOrder::Asc => 1,
                SortOrder::Desc => -1,
            };
            (key.field.clone(), Bson::Int32(direction))
        })
        .collect()
}

fn projection_to_bson(projection: &Projection) -> BsonDocument {
    let (fields, flag) = match projection {
        Projection::Exclude(fields) => (fields, 0),
        Projection::Include(fields) => (fields, 1),
    };
    fields
        .iter()
        .map(|field| (field.clone(), Bson::Int32(flag)))
        .collect()
}

fn to_bson_document(id: Option<ObjectId>, fields: &Fields) -> BsonDocument {
    let mut doc = BsonDocument::new();
    if let Some(id) = id {
        doc.insert("_id", id);
    }
    for (key, value) in fields {
        doc.insert(key.clone(), to_bson(value));
    }
    doc
}

fn from_bson_document(mut raw: BsonDocument) -> Result<Document> {
    let id = match raw.remove("_id") {
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(Bson::String(s)) => s,
        Some(other) => {
            return Err(Error::CorruptDocument {
                id: other.to_string(),
                message: "unsupported _id type".to_string(),
            })
        }
        None => {
            return Err(Error::CorruptDocument {
                id: String::new(),
                message: "missing _id".to_string(),
            })
        }
    };
    raw.remove(VERSION_KEY);

    let fields = raw.into_iter().map(|(k, v)| (k, from_bson(v))).collect();
    Ok(Document::with_fields(id, fields))
}

fn to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Int(i) => Bson::Int64(*i),
        Value::Float(f) => Bson::Double(*f),
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(to_bson).collect()),
        Value::Object(obj) => Bson::Document(
            obj.iter()
                .map(|(k, v)| (k.clone(), to_bson(v)))
                .collect(),
        ),
    }
}

fn from_bson(value: Bson) -> Value {
    match value {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Int32(i) => Value::Int(i as i64),
        Bson::Int64(i) => Value::Int(i),
        Bson::Double(f) => Value::Float(f),
        Bson::String(s) => Value::String(s),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::Array(items) => Value::Array(items.into_iter().map(from_bson).collect()),
        Bson::Document(doc) => {
            Value::Object(doc.into_iter().map(|(k, v)| (k, from_bson(v))).collect())
        }
        other => Value::String(other.to_string()),
    }
}
