//! Collections - named groups of documents
//!
//! [`DocumentCollection`] is the driver seam: the create/find/update/delete
//! primitives a backend provides over one named collection. Each primitive
//! is a single request to the backend.
//!
//! [`FileCollection`] stores each document as a YAML file:
//! ```text
//! /collections/
//!   /people/
//!     0190b1d2-8e1f-7c3a-9f00-1a2b3c4d5e6f.yaml
//!     0190b1d2-8e20-7a11-8c3e-6f5e4d3c2b1a.yaml
//! ```

use super::codec;
use super::document::{Document, Fields};
use crate::query::{self, filter, Filter, FindOptions, ReturnDocument, Update};
use crate::validation::{validate_collection_name, validate_document_id};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;
use walkdir::WalkDir;

/// Acknowledgment of a bulk delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSummary {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

/// Storage primitives over a single named collection
#[async_trait]
pub trait DocumentCollection: Send + Sync + std::fmt::Debug {
    /// Name of the collection
    fn name(&self) -> &str;

    /// Insert a document, returning it with its generated ID
    async fn insert_one(&self, fields: Fields) -> Result<Document>;

    /// Insert a batch; either every document is stored or none is
    async fn insert_many(&self, batch: Vec<Fields>) -> Result<Vec<Document>>;

    /// Find matching documents in natural order, then sort, limit and project
    async fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<Document>>;

    /// First matching document in natural order
    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>> {
        let options = FindOptions {
            limit: Some(1),
            ..Default::default()
        };
        Ok(self.find(filter, &options).await?.into_iter().next())
    }

    /// Overwrite an existing document; fails with `DocumentNotFound` if it is gone
    async fn replace_one(&self, doc: &Document) -> Result<Document>;

    /// Atomically update the first matching document
    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &Update,
        returning: ReturnDocument,
    ) -> Result<Option<Document>>;

    /// Atomically delete the first matching document, returning it
    async fn find_one_and_delete(&self, filter: &Filter) -> Result<Option<Document>>;

    /// Delete every matching document
    async fn delete_many(&self, filter: &Filter) -> Result<DeleteSummary>;

    /// Count matching documents
    async fn count(&self, filter: &Filter) -> Result<u64> {
        Ok(self.find(filter, &FindOptions::default()).await?.len() as u64)
    }
}

/// A collection stored as a directory of YAML documents
///
/// Document IDs are UUIDv7, so ordering by ID is insertion order. Mutating
/// primitives hold `write_lock`, which makes each of them atomic with
/// respect to the others.
#[derive(Debug)]
pub struct FileCollection {
    /// Name of the collection (directory name)
    pub name: String,
    /// Path to the collection directory
    pub path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCollection {
    /// Open a collection under the given database root
    pub fn open(name: impl Into<String>, base_path: &Path) -> Result<Self> {
        let name = name.into();
        validate_collection_name(&name)?;
        let path = base_path.join("collections").join(&name);
        Ok(Self {
            name,
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Create the collection directory if it doesn't exist
    pub async fn ensure_exists(&self) -> Result<()> {
        fs::create_dir_all(&self.path)
            .await
            .map_err(|source| Error::FileWriteError {
                path: self.path.clone(),
                source,
            })
    }

    /// Check if the collection exists
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Canonical (hyphenated, lowercase) form of a document ID
    pub fn canonical_id(&self, id: &str) -> Result<String> {
        validate_document_id(id)?;
        Uuid::try_parse(id)
            .map(|uuid| uuid.hyphenated().to_string())
            .map_err(|_| Error::InvalidIdentifier {
                kind: "document ID",
                value: id.to_string(),
                reason: "not a valid UUID",
            })
    }

    /// List all documents in natural order
    ///
    /// Only `<uuid>.yaml` files are documents. A document that cannot be
    /// read or decoded fails the whole listing.
    pub async fn list(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();

        if !self.exists().await {
            return Ok(documents);
        }

        for entry in WalkDir::new(&self.path).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| Error::FileReadError {
                path: e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.path.clone()),
                source: e.into(),
            })?;

            let Some(id) = Self::document_id(entry.path()) else {
                continue;
            };
            // None when deleted since the directory was walked
            if let Some(doc) = self.read_document(id, entry.path()).await? {
                documents.push(doc);
            }
        }

        documents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(documents)
    }

    /// Read a single document by ID
    pub async fn get(&self, id: &str) -> Result<Option<Document>> {
        let id = self.canonical_id(id)?;
        let path = self.document_path(&id);
        self.read_document(id, &path).await
    }

    fn document_path(&self, id: &str) -> PathBuf {
        self.path.join(format!("{}.yaml", id))
    }

    fn generate_id() -> String {
        Uuid::now_v7().hyphenated().to_string()
    }

    /// ID of the document stored at `path`, if the file is one
    ///
    /// The stem must already be canonical, otherwise a lookup by that ID
    /// would resolve to a different path.
    fn document_id(path: &Path) -> Option<String> {
        if path.extension().map(|e| e != "yaml").unwrap_or(true) {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let id = Uuid::try_parse(stem).ok()?.hyphenated().to_string();
        (id == stem).then_some(id)
    }

    async fn read_document(&self, id: String, path: &Path) -> Result<Option<Document>> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(Error::FileReadError {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Ok(Some(Document::with_fields(id, codec::parse(&content)?)))
    }

    /// Write through a temporary file so readers never see a partial document
    async fn write_document(&self, doc: &Document) -> Result<()> {
        let path = self.document_path(&doc.id);
        let tmp = self.path.join(format!("{}.yaml.tmp", doc.id));
        let content = codec::render(&doc.fields)?;

        fs::write(&tmp, content)
            .await
            .map_err(|source| Error::FileWriteError {
                path: tmp.clone(),
                source,
            })?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|source| Error::FileWriteError { path, source })
    }

    /// Write every document, removing the ones already written on failure
    async fn write_batch(&self, docs: &[Document]) -> Result<()> {
        for (written, doc) in docs.iter().enumerate() {
            if let Err(e) = self.write_document(doc).await {
                for stored in &docs[..written] {
                    if let Err(cleanup) = self.remove_document(&stored.id).await {
                        tracing::warn!(
                            collection = %self.name,
                            id = %stored.id,
                            error = %cleanup,
                            "failed to roll back batch insert"
                        );
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }

    async fn remove_document(&self, id: &str) -> Result<()> {
        let path = self.document_path(id);
        fs::remove_file(&path)
            .await
            .map_err(|source| Error::FileWriteError { path, source })
    }

    async fn matching(&self, filter: &Filter) -> Result<Vec<Document>> {
        let mut docs: Vec<Document> = match filter.id() {
            Some(id) => self.get(id).await?.into_iter().collect(),
            None => self.list().await?,
        };
        docs.retain(|doc| filter::matches_fields(filter, doc));
        Ok(docs)
    }
}

#[async_trait]
impl DocumentCollection for FileCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert_one(&self, fields: Fields) -> Result<Document> {
        self.ensure_exists().await?;
        let _guard = self.write_lock.lock().await;

        let doc = Document::with_fields(Self::generate_id(), fields);
        self.write_document(&doc).await?;
        Ok(doc)
    }

    async fn insert_many(&self, batch: Vec<Fields>) -> Result<Vec<Document>> {
        self.ensure_exists().await?;
        let _guard = self.write_lock.lock().await;

        let docs: Vec<Document> = batch
            .into_iter()
            .map(|fields| Document::with_fields(Self::generate_id(), fields))
            .collect();

        self.write_batch(&docs).await?;
        Ok(docs)
    }

    async fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<Document>> {
        let docs = self.matching(filter).await?;
        Ok(query::apply(docs, options))
    }

    async fn replace_one(&self, doc: &Document) -> Result<Document> {
        let id = self.canonical_id(&doc.id)?;
        let _guard = self.write_lock.lock().await;

        if !fs::try_exists(self.document_path(&id)).await? {
            return Err(Error::DocumentNotFound {
                collection: self.name.clone(),
                id,
            });
        }

        let doc = Document::with_fields(id, doc.fields.clone());
        self.write_document(&doc).await?;
        Ok(doc)
    }

    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &Update,
        returning: ReturnDocument,
    ) -> Result<Option<Document>> {
        let _guard = self.write_lock.lock().await;

        let Some(mut doc) = self.matching(filter).await?.into_iter().next() else {
            return Ok(None);
        };

        let before = doc.clone();
        update.apply(&mut doc);
        self.write_document(&doc).await?;

        Ok(Some(match returning {
            ReturnDocument::Before => before,
            ReturnDocument::After => doc,
        }))
    }

    async fn find_one_and_delete(&self, filter: &Filter) -> Result<Option<Document>> {
        let _guard = self.write_lock.lock().await;

        let Some(doc) = self.matching(filter).await?.into_iter().next() else {
            return Ok(None);
        };

        self.remove_document(&doc.id).await?;
        Ok(Some(doc))
    }

    async fn delete_many(&self, filter: &Filter) -> Result<DeleteSummary> {
        let _guard = self.write_lock.lock().await;

        let docs = self.matching(filter).await?;
        for doc in &docs {
            self.remove_document(&doc.id).await?;
        }

        Ok(DeleteSummary {
            acknowledged: true,
            deleted_count: docs.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::document::Value;
    use tempfile::TempDir;

    fn person(name: &str, foods: &[&str]) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".into(), Value::from(name));
        fields.insert(
            "favoriteFoods".into(),
            Value::from(foods.iter().map(|f| f.to_string()).collect::<Vec<_>>()),
        );
        fields
    }

    fn yaml_files(collection: &FileCollection) -> Vec<PathBuf> {
        std::fs::read_dir(&collection.path)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().map(|e| e == "yaml").unwrap_or(false))
            .collect()
    }

    #[tokio::test]
    async fn test_collection_crud() {
        let tmp = TempDir::new().unwrap();
        let collection = FileCollection::open("people", tmp.path()).unwrap();

        // Create
        let doc = collection.insert_one(person("Ann", &["pizza"])).await.unwrap();
        assert!(collection.path.join(format!("{}.yaml", doc.id)).exists());

        // Read
        let fetched = collection.get(&doc.id).await.unwrap().unwrap();
        assert_eq!(fetched, doc);

        // Replace
        let mut updated = fetched;
        updated.set("age", 33i64);
        collection.replace_one(&updated).await.unwrap();
        let refetched = collection.get(&doc.id).await.unwrap().unwrap();
        assert_eq!(refetched.get("age").and_then(Value::as_i64), Some(33));

        // Delete
        let removed = collection
            .find_one_and_delete(&Filter::by_id(doc.id.clone()))
            .await
            .unwrap();
        assert_eq!(removed.map(|d| d.id), Some(doc.id.clone()));
        assert!(collection.get(&doc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_natural_order_is_insertion_order() {
        let tmp = TempDir::new().unwrap();
        let collection = FileCollection::open("people", tmp.path()).unwrap();

        let names = ["Zed", "Amy", "Moe", "Bea"];
        for name in names {
            collection.insert_one(person(name, &[])).await.unwrap();
        }

        let listed: Vec<_> = collection
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.get("name").and_then(Value::as_str).unwrap().to_string())
            .collect();
        assert_eq!(listed, names);
    }

    #[tokio::test]
    async fn test_find_one_and_update_returning() {
        let tmp = TempDir::new().unwrap();
        let collection = FileCollection::open("people", tmp.path()).unwrap();
        collection.insert_one(person("Ann", &[])).await.unwrap();

        let before = collection
            .find_one_and_update(
                &Filter::eq("name", "Ann"),
                &Update::set("age", 20i64),
                ReturnDocument::Before,
            )
            .await
            .unwrap()
            .unwrap();
        assert!(before.get("age").is_none());

        let after = collection
            .find_one_and_update(
                &Filter::eq("name", "Ann"),
                &Update::set("age", 21i64),
                ReturnDocument::After,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.get("age").and_then(Value::as_i64), Some(21));

        let missing = collection
            .find_one_and_update(
                &Filter::eq("name", "Nobody"),
                &Update::set("age", 20i64),
                ReturnDocument::After,
            )
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_invalid_and_missing_ids() {
        let tmp = TempDir::new().unwrap();
        let collection = FileCollection::open("people", tmp.path()).unwrap();

        assert!(matches!(
            collection.get("not-a-uuid").await,
            Err(Error::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            collection.get("../../etc/passwd").await,
            Err(Error::InvalidIdentifier { .. })
        ));

        let ghost = Document::with_fields(Uuid::now_v7().to_string(), person("Ghost", &[]));
        assert!(matches!(
            collection.replace_one(&ghost).await,
            Err(Error::DocumentNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_insert_many_and_delete_many() {
        let tmp = TempDir::new().unwrap();
        let collection = FileCollection::open("people", tmp.path()).unwrap();

        let docs = collection
            .insert_many(vec![
                person("Mary", &["burrito"]),
                person("Bob", &[]),
                person("Mary", &[]),
            ])
            .await
            .unwrap();
        assert_eq!(docs.len(), 3);
        assert_eq!(collection.count(&Filter::all()).await.unwrap(), 3);

        let summary = collection.delete_many(&Filter::eq("name", "Mary")).await.unwrap();
        assert_eq!(
            summary,
            DeleteSummary {
                acknowledged: true,
                deleted_count: 2
            }
        );
        assert_eq!(collection.count(&Filter::all()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_batch_write_is_rolled_back() {
        let tmp = TempDir::new().unwrap();
        let collection = FileCollection::open("people", tmp.path()).unwrap();
        collection.ensure_exists().await.unwrap();

        let docs: Vec<Document> = ["Ann", "Bob", "Cat"]
            .iter()
            .map(|name| Document::with_fields(FileCollection::generate_id(), person(name, &[])))
            .collect();

        // A directory where the second document's temp file goes makes its write fail
        std::fs::create_dir(collection.path.join(format!("{}.yaml.tmp", docs[1].id))).unwrap();

        let err = collection.write_batch(&docs).await.unwrap_err();
        assert!(matches!(err, Error::FileWriteError { .. }));

        assert!(yaml_files(&collection).is_empty());
        assert!(collection.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_document_fails_scan() {
        let tmp = TempDir::new().unwrap();
        let collection = FileCollection::open("people", tmp.path()).unwrap();
        let doc = collection.insert_one(person("Mary", &["burrito"])).await.unwrap();
        collection.insert_one(person("Bob", &[])).await.unwrap();

        std::fs::write(
            collection.path.join(format!("{}.yaml", doc.id)),
            "name: [Mary\nfavoriteFoods: {",
        )
        .unwrap();

        assert!(matches!(
            collection.list().await,
            Err(Error::YamlParseError { .. })
        ));
        assert!(collection.count(&Filter::eq("name", "Bob")).await.is_err());
        assert!(collection.delete_many(&Filter::eq("name", "Mary")).await.is_err());
        assert!(collection.path.join(format!("{}.yaml", doc.id)).exists());
    }

    #[tokio::test]
    async fn test_leftover_temp_files_ignored() {
        let tmp = TempDir::new().unwrap();
        let collection = FileCollection::open("people", tmp.path()).unwrap();
        collection.insert_one(person("Ann", &[])).await.unwrap();

        std::fs::write(collection.path.join("stray.yaml.tmp"), "name: Half").unwrap();

        assert_eq!(collection.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_listed_ids_are_fetchable() {
        let tmp = TempDir::new().unwrap();
        let collection = FileCollection::open("people", tmp.path()).unwrap();
        let doc = collection.insert_one(person("Ann", &[])).await.unwrap();

        // Neither file resolves through a lookup by its stem
        std::fs::write(collection.path.join("notes.yaml"), "name: Notes").unwrap();
        std::fs::write(
            collection
                .path
                .join(format!("{}.yaml", Uuid::now_v7().to_string().to_uppercase())),
            "name: Shout",
        )
        .unwrap();

        let listed = collection.list().await.unwrap();
        assert_eq!(listed, vec![doc]);
        for listed_doc in &listed {
            assert!(collection.get(&listed_doc.id).await.unwrap().is_some());
        }
    }

    #[test]
    fn test_document_id_from_path() {
        let id = FileCollection::generate_id();
        let dir = Path::new("/data/collections/people");

        assert_eq!(
            FileCollection::document_id(&dir.join(format!("{}.yaml", id))),
            Some(id.clone())
        );
        assert_eq!(
            FileCollection::document_id(&dir.join(format!("{}.yaml.tmp", id))),
            None
        );
        assert_eq!(FileCollection::document_id(&dir.join("notes.yaml")), None);
    }

    #[test]
    fn test_invalid_collection_name() {
        let tmp = TempDir::new().unwrap();
        assert!(FileCollection::open("../people", tmp.path()).is_err());
    }
}
