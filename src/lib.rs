//! people-db - a document store for person records
//!
//! A typed repository over a single collection of people, backed either by
//! YAML files on disk or by a MongoDB deployment.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        PersonRepository                         │
//! │   create / find / update / delete / query_chain                 │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │   Person    │  │   Schema    │  │   Query builder         │  │
//! │  │   model     │  │   (cast +   │  │   (filter, sort, limit, │  │
//! │  │             │  │   validate) │  │   projection)           │  │
//! │  └──────┬──────┘  └──────┬──────┘  └───────────┬─────────────┘  │
//! │         ▼                ▼                     ▼                │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │              DocumentCollection (driver seam)               ││
//! │  └─────────────┬───────────────────────────────┬───────────────┘│
//! │                ▼                               ▼                │
//! │  ┌──────────────────────────┐   ┌──────────────────────────────┐│
//! │  │ FileCollection           │   │ MongoCollection              ││
//! │  │ collections/{name}/*.yaml│   │ (feature = "mongodb")        ││
//! │  └──────────────────────────┘   └──────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use people_db::{Config, Database, NewPerson};
//!
//! # async fn run() -> people_db::Result<()> {
//! let db = Database::open(&Config::from_env()?).await?;
//! let people = db.people()?;
//!
//! let ann = people
//!     .create_person(NewPerson::new("Ann").age(30).favorite_foods(["burrito"]))
//!     .await?;
//! let updated = people.find_edit_then_save(&ann.id).await?;
//! assert_eq!(updated.favorite_foods.last().map(String::as_str), Some("hamburger"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod repository;
pub mod schema;
pub mod storage;
pub mod validation;

pub use config::{Config, StorageConfig};
pub use error::{Error, ErrorKind, Result};
pub use model::{NewPerson, Person, PersonSummary};
pub use repository::PersonRepository;
pub use schema::Schema;
pub use storage::collection::{DeleteSummary, DocumentCollection, FileCollection};
pub use storage::document::{Document, Value};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Connection to the storage backend
///
/// Opened once at startup and passed to whatever needs a repository.
/// Clones share the backend and the open collection handles.
#[derive(Debug, Clone)]
pub struct Database {
    backend: Backend,
    collections: Arc<Mutex<HashMap<String, Arc<dyn DocumentCollection>>>>,
    /// Collection that holds person documents
    pub people_collection: String,
}

#[derive(Debug, Clone)]
enum Backend {
    File { root: PathBuf },
    #[cfg(feature = "mongodb")]
    Mongo(mongodb::Database),
}

impl Database {
    /// Open the backend described by `config`
    pub async fn open(config: &Config) -> Result<Self> {
        config.validate()?;

        let backend = match &config.storage {
            StorageConfig::File { root } => {
                tokio::fs::create_dir_all(root.join("collections"))
                    .await
                    .map_err(|source| Error::FileWriteError {
                        path: root.clone(),
                        source,
                    })?;
                tracing::info!(root = %root.display(), "opened file store");
                Backend::File { root: root.clone() }
            }
            #[cfg(feature = "mongodb")]
            StorageConfig::Mongo { uri, database } => {
                let db = storage::mongo::connect(uri, database).await?;
                tracing::info!(database = %database, "connected to MongoDB");
                Backend::Mongo(db)
            }
            #[cfg(not(feature = "mongodb"))]
            StorageConfig::Mongo { .. } => {
                return Err(Error::Config {
                    message: "MONGO_URI is set but this build lacks the `mongodb` feature"
                        .to_string(),
                })
            }
        };

        Ok(Self {
            backend,
            collections: Arc::default(),
            people_collection: config.collection.clone(),
        })
    }

    /// Open a file-backed database rooted at `path`
    pub async fn open_dir(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open(&Config::file(path)).await
    }

    /// A handle to any collection in the database
    ///
    /// Repeated calls for the same name return the same handle, so every
    /// repository over a collection shares its write serialization.
    pub fn collection(&self, name: &str) -> Result<Arc<dyn DocumentCollection>> {
        let mut open = self
            .collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(collection) = open.get(name) {
            return Ok(Arc::clone(collection));
        }

        let collection: Arc<dyn DocumentCollection> = match &self.backend {
            Backend::File { root } => Arc::new(FileCollection::open(name, root)?),
            #[cfg(feature = "mongodb")]
            Backend::Mongo(db) => {
                validation::validate_collection_name(name)?;
                Arc::new(storage::mongo::MongoCollection::new(db, name))
            }
        };
        open.insert(name.to_string(), Arc::clone(&collection));
        Ok(collection)
    }

    /// The person repository over the configured collection
    pub fn people(&self) -> Result<PersonRepository> {
        Ok(PersonRepository::new(self.collection(&self.people_collection)?))
    }
}
