//! Process configuration
//!
//! Read once at startup from the environment:
//!
//! | Variable            | Meaning                                   | Default     |
//! |---------------------|-------------------------------------------|-------------|
//! | `MONGO_URI`         | selects the MongoDB backend at this URI   | unset       |
//! | `PEOPLE_DB_NAME`    | MongoDB database name                     | `people-db` |
//! | `PEOPLE_DATA_DIR`   | root directory of the file backend        | `./data`    |
//! | `PEOPLE_COLLECTION` | collection holding person documents       | `people`    |

use crate::validation::validate_collection_name;
use crate::{Error, Result};
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_DATABASE_NAME: &str = "people-db";
pub const DEFAULT_COLLECTION: &str = "people";

/// Where documents are stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// YAML files under a local directory
    File { root: PathBuf },
    /// A remote MongoDB deployment
    Mongo { uri: String, database: String },
}

/// Configuration for opening a [`crate::Database`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub storage: StorageConfig,
    pub collection: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::File {
                root: PathBuf::from(DEFAULT_DATA_DIR),
            },
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl Config {
    /// A file-backed configuration rooted at `root`
    pub fn file(root: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig::File { root: root.into() },
            ..Default::default()
        }
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let storage = match get("MONGO_URI") {
            Some(uri) => StorageConfig::Mongo {
                uri,
                database: get("PEOPLE_DB_NAME")
                    .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string()),
            },
            None => StorageConfig::File {
                root: get("PEOPLE_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            },
        };

        let config = Self {
            storage,
            collection: get("PEOPLE_COLLECTION").unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Override the collection name
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Check the configuration is usable by this build
    pub fn validate(&self) -> Result<()> {
        validate_collection_name(&self.collection).map_err(|e| Error::Config {
            message: format!("PEOPLE_COLLECTION: {}", e),
        })?;

        if let StorageConfig::Mongo { uri, .. } = &self.storage {
            if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") {
                return Err(Error::Config {
                    message: "MONGO_URI must start with mongodb:// or mongodb+srv://".to_string(),
                });
            }
            if !cfg!(feature = "mongodb") {
                return Err(Error::Config {
                    message: "MONGO_URI is set but this build lacks the `mongodb` feature"
                        .to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_file_backend_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PEOPLE_DATA_DIR", "/tmp/people"),
            ("PEOPLE_COLLECTION", "persons"),
        ]))
        .unwrap();

        assert_eq!(
            config.storage,
            StorageConfig::File {
                root: PathBuf::from("/tmp/people")
            }
        );
        assert_eq!(config.collection, "persons");
    }

    #[test]
    fn test_blank_values_ignored() {
        let config = Config::from_lookup(lookup(&[("MONGO_URI", "  ")])).unwrap();
        assert!(matches!(config.storage, StorageConfig::File { .. }));
    }

    #[test]
    fn test_invalid_collection_rejected() {
        let err = Config::from_lookup(lookup(&[("PEOPLE_COLLECTION", "../etc")])).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_bad_mongo_scheme_rejected() {
        let err = Config::from_lookup(lookup(&[("MONGO_URI", "http://localhost")])).unwrap_err();
        assert!(err.to_string().contains("mongodb://"));
    }

    #[cfg(feature = "mongodb")]
    #[test]
    fn test_mongo_backend_selected() {
        let config = Config::from_lookup(lookup(&[
            ("MONGO_URI", "mongodb://localhost:27017"),
            ("PEOPLE_DB_NAME", "fcc"),
        ]))
        .unwrap();
        assert_eq!(
            config.storage,
            StorageConfig::Mongo {
                uri: "mongodb://localhost:27017".to_string(),
                database: "fcc".to_string(),
            }
        );
    }

    #[cfg(not(feature = "mongodb"))]
    #[test]
    fn test_mongo_requires_feature() {
        let err = Config::from_lookup(lookup(&[("MONGO_URI", "mongodb://localhost:27017")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
