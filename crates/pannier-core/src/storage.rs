//! Storage backend abstraction for object storage (GCS, S3, memory).
//!
//! This module defines the storage contract every backend must implement.
//! Basket snapshots are whole objects, so the contract is deliberately
//! small:
//! - Whole-object reads and writes, with conditional-write preconditions
//! - Idempotent deletes
//! - Object metadata including `last_modified` and `etag`
//!
//! ## Multi-Cloud Compatibility
//!
//! The storage version token is an opaque `String` to support different
//! backends:
//! - GCS: Uses numeric generation (stored as string)
//! - S3: Uses `ETag` or version ID (already strings)
//!
//! This abstraction avoids leaking backend-specific assumptions into the
//! basket layer.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutMode, UpdateVersion};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};

/// Precondition for conditional writes (CAS operations).
///
/// The version token is opaque - backends interpret it according to their
/// semantics:
/// - GCS: Numeric generation as string
/// - S3: `ETag` or version ID
#[derive(Debug, Clone)]
pub enum WritePrecondition {
    /// Write only if object does not exist.
    DoesNotExist,
    /// Write only if object's version matches the given token.
    MatchesVersion(String),
    /// Write unconditionally.
    None,
}

/// Result of a conditional write.
#[derive(Debug, Clone)]
pub enum WriteResult {
    /// Write succeeded, returns new version token.
    Success {
        /// The new version token after the write.
        version: String,
    },
    /// Precondition failed, returns current version token.
    PreconditionFailed {
        /// The current version that caused the precondition to fail.
        current_version: String,
    },
}

/// Metadata about a stored object.
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    /// Object path (key).
    pub path: String,
    /// Object size in bytes.
    pub size: u64,
    /// Object version token for CAS operations.
    ///
    /// This is an opaque string that backends interpret:
    /// - GCS: Numeric generation as string
    /// - S3: `ETag` or version ID
    pub version: String,
    /// Last modification timestamp.
    pub last_modified: Option<DateTime<Utc>>,
    /// Entity tag for cache validation.
    pub etag: Option<String>,
}

/// Storage backend trait for object storage.
///
/// All storage backends (GCS, S3, memory) implement this trait.
/// The contract is designed for cloud object storage semantics.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Reads entire object.
    ///
    /// Returns `Error::NotFound` if object doesn't exist.
    async fn get(&self, path: &str) -> Result<Bytes>;

    /// Writes with optional precondition.
    ///
    /// Returns `WriteResult::PreconditionFailed` if precondition not met.
    /// Never returns error for precondition failure - that's a normal
    /// result.
    async fn put(
        &self,
        path: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> Result<WriteResult>;

    /// Deletes an object.
    ///
    /// Succeeds even if object doesn't exist (idempotent).
    async fn delete(&self, path: &str) -> Result<()>;

    /// Lists objects with the given prefix.
    ///
    /// Returns empty vec if no objects match.
    ///
    /// **Ordering**: Results are returned in arbitrary order that may vary
    /// between backends and invocations. Callers requiring deterministic
    /// order should sort the results (e.g., by `path` or `last_modified`).
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>>;

    /// Gets object metadata without reading content.
    ///
    /// Returns `None` if object doesn't exist.
    async fn head(&self, path: &str) -> Result<Option<ObjectMeta>>;
}

/// In-memory storage backend for testing and debug deployments.
///
/// Thread-safe via `RwLock`. Not suitable for production.
/// Uses numeric versions internally (stored as strings) to simulate
/// GCS-like behavior.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    /// Numeric version stored as i64 internally, exposed as String via API.
    version: i64,
    last_modified: DateTime<Utc>,
}

impl MemoryBackend {
    /// Creates a new empty memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, path: &str) -> Result<Bytes> {
        let objects = self.objects.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        objects
            .get(path)
            .map(|o| o.data.clone())
            .ok_or_else(|| Error::NotFound(format!("object not found: {path}")))
    }

    async fn put(
        &self,
        path: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> Result<WriteResult> {
        let mut objects = self.objects.write().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        let current = objects.get(path);

        match precondition {
            WritePrecondition::DoesNotExist => {
                if let Some(obj) = current {
                    return Ok(WriteResult::PreconditionFailed {
                        current_version: obj.version.to_string(),
                    });
                }
            }
            WritePrecondition::MatchesVersion(expected) => {
                let expected_num: i64 = expected.parse().unwrap_or(-1);
                match current {
                    Some(obj) if obj.version != expected_num => {
                        return Ok(WriteResult::PreconditionFailed {
                            current_version: obj.version.to_string(),
                        });
                    }
                    None => {
                        return Ok(WriteResult::PreconditionFailed {
                            current_version: "0".to_string(),
                        });
                    }
                    _ => {}
                }
            }
            WritePrecondition::None => {}
        }

        let new_version = current.map_or(1, |o| o.version + 1);
        objects.insert(
            path.to_string(),
            StoredObject {
                data,
                version: new_version,
                last_modified: Utc::now(),
            },
        );
        drop(objects);

        Ok(WriteResult::Success {
            version: new_version.to_string(),
        })
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.objects
            .write()
            .map_err(|_| Error::Internal {
                message: "lock poisoned".into(),
            })?
            .remove(path);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        let objects = self.objects.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        Ok(objects
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(path, obj)| ObjectMeta {
                path: path.clone(),
                size: obj.data.len() as u64,
                version: obj.version.to_string(),
                last_modified: Some(obj.last_modified),
                etag: Some(format!("\"{}\"", obj.version)),
            })
            .collect())
    }

    async fn head(&self, path: &str) -> Result<Option<ObjectMeta>> {
        let objects = self.objects.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        Ok(objects.get(path).map(|obj| ObjectMeta {
            path: path.to_string(),
            size: obj.data.len() as u64,
            version: obj.version.to_string(),
            last_modified: Some(obj.last_modified),
            etag: Some(format!("\"{}\"", obj.version)),
        }))
    }
}

/// Cloud object storage backend built on the `object_store` crate.
///
/// Backs the service in deployed environments; the precondition surface
/// maps onto the store's conditional puts (`ETag`-based), so CAS callers
/// should pass the `etag` they observed as the version token.
#[derive(Debug)]
pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreBackend {
    /// Wraps an existing `object_store` implementation.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Creates a backend from a bucket locator.
    ///
    /// Accepts `s3://bucket` and `s3a://bucket` for S3 and `gs://bucket`
    /// or a bare bucket name for GCS. Credentials come from the ambient
    /// environment (the builders' `from_env`).
    ///
    /// # Errors
    ///
    /// Returns an error if the locator is empty or the builder rejects
    /// the configuration.
    pub fn from_bucket(bucket: &str) -> Result<Self> {
        let bucket = bucket.trim();
        if bucket.is_empty() {
            return Err(Error::InvalidInput(
                "storage bucket cannot be empty".to_string(),
            ));
        }

        let store: Arc<dyn ObjectStore> = if let Some(name) = bucket
            .strip_prefix("s3://")
            .or_else(|| bucket.strip_prefix("s3a://"))
        {
            Arc::new(
                object_store::aws::AmazonS3Builder::from_env()
                    .with_bucket_name(name)
                    .build()
                    .map_err(|e| Error::storage_with_source("failed to configure S3 backend", e))?,
            )
        } else {
            let name = bucket.strip_prefix("gs://").unwrap_or(bucket);
            Arc::new(
                object_store::gcp::GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(name)
                    .build()
                    .map_err(|e| {
                        Error::storage_with_source("failed to configure GCS backend", e)
                    })?,
            )
        };

        Ok(Self { store })
    }

    fn parse_path(path: &str) -> Result<ObjectPath> {
        ObjectPath::parse(path)
            .map_err(|e| Error::InvalidInput(format!("invalid storage path '{path}': {e}")))
    }

    async fn current_version(&self, path: &ObjectPath) -> String {
        match self.store.head(path).await {
            Ok(meta) => meta.e_tag.unwrap_or_default(),
            Err(_) => "0".to_string(),
        }
    }
}

fn map_object_store_error(path: &str, err: object_store::Error) -> Error {
    match err {
        object_store::Error::NotFound { .. } => {
            Error::NotFound(format!("object not found: {path}"))
        }
        other => Error::storage_with_source(format!("storage operation failed for '{path}'"), other),
    }
}

#[async_trait]
impl StorageBackend for ObjectStoreBackend {
    async fn get(&self, path: &str) -> Result<Bytes> {
        let location = Self::parse_path(path)?;
        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| map_object_store_error(path, e))?;
        result
            .bytes()
            .await
            .map_err(|e| map_object_store_error(path, e))
    }

    async fn put(
        &self,
        path: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> Result<WriteResult> {
        let location = Self::parse_path(path)?;
        let mode = match precondition {
            WritePrecondition::DoesNotExist => PutMode::Create,
            WritePrecondition::MatchesVersion(etag) => PutMode::Update(UpdateVersion {
                e_tag: Some(etag),
                version: None,
            }),
            WritePrecondition::None => PutMode::Overwrite,
        };

        match self.store.put_opts(&location, data.into(), mode.into()).await {
            Ok(result) => Ok(WriteResult::Success {
                version: result.e_tag.or(result.version).unwrap_or_default(),
            }),
            Err(
                object_store::Error::Precondition { .. } | object_store::Error::AlreadyExists { .. },
            ) => Ok(WriteResult::PreconditionFailed {
                current_version: self.current_version(&location).await,
            }),
            Err(e) => Err(map_object_store_error(path, e)),
        }
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let location = Self::parse_path(path)?;
        match self.store.delete(&location).await {
            // Deleting a missing object is a success; stores differ here.
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(map_object_store_error(path, e)),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        let location = Self::parse_path(prefix)?;
        let metas: Vec<object_store::ObjectMeta> = self
            .store
            .list(Some(&location))
            .try_collect()
            .await
            .map_err(|e| map_object_store_error(prefix, e))?;

        Ok(metas
            .into_iter()
            .map(|meta| ObjectMeta {
                path: meta.location.to_string(),
                size: meta.size as u64,
                version: meta.e_tag.clone().unwrap_or_default(),
                last_modified: Some(meta.last_modified),
                etag: meta.e_tag,
            })
            .collect())
    }

    async fn head(&self, path: &str) -> Result<Option<ObjectMeta>> {
        let location = Self::parse_path(path)?;
        match self.store.head(&location).await {
            Ok(meta) => Ok(Some(ObjectMeta {
                path: meta.location.to_string(),
                size: meta.size as u64,
                version: meta.e_tag.clone().unwrap_or_default(),
                last_modified: Some(meta.last_modified),
                etag: meta.e_tag,
            })),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(map_object_store_error(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_roundtrip() {
        let backend = MemoryBackend::new();
        let data = Bytes::from("hello world");

        let result = backend
            .put("test/file.txt", data.clone(), WritePrecondition::None)
            .await
            .expect("put should succeed");

        assert!(matches!(result, WriteResult::Success { ref version } if version == "1"));

        let retrieved = backend
            .get("test/file.txt")
            .await
            .expect("get should succeed");
        assert_eq!(retrieved, data);
    }

    #[tokio::test]
    async fn test_get_missing_object_is_not_found() {
        let backend = MemoryBackend::new();
        let err = backend.get("missing.txt").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_object_meta_has_required_fields() {
        let backend = MemoryBackend::new();
        backend
            .put("test.txt", Bytes::from("data"), WritePrecondition::None)
            .await
            .expect("put should succeed");

        let meta = backend
            .head("test.txt")
            .await
            .expect("head should succeed")
            .expect("object should exist");

        assert_eq!(meta.path, "test.txt");
        assert_eq!(meta.size, 4);
        assert!(!meta.version.is_empty(), "must have version");
        assert!(meta.last_modified.is_some(), "must have last_modified");
        assert!(meta.etag.is_some(), "must have etag");
    }

    #[tokio::test]
    async fn test_overwrite_bumps_version() {
        let backend = MemoryBackend::new();
        backend
            .put("v.txt", Bytes::from("one"), WritePrecondition::None)
            .await
            .expect("put should succeed");
        let result = backend
            .put("v.txt", Bytes::from("two"), WritePrecondition::None)
            .await
            .expect("put should succeed");

        assert!(matches!(result, WriteResult::Success { ref version } if version == "2"));
        assert_eq!(backend.get("v.txt").await.unwrap(), Bytes::from("two"));
    }

    #[tokio::test]
    async fn test_precondition_does_not_exist() {
        let backend = MemoryBackend::new();

        let result = backend
            .put(
                "new.txt",
                Bytes::from("data"),
                WritePrecondition::DoesNotExist,
            )
            .await
            .expect("should succeed");
        assert!(matches!(result, WriteResult::Success { .. }));

        let result = backend
            .put(
                "new.txt",
                Bytes::from("data2"),
                WritePrecondition::DoesNotExist,
            )
            .await
            .expect("should succeed");
        assert!(matches!(result, WriteResult::PreconditionFailed { .. }));
    }

    #[tokio::test]
    async fn test_precondition_matches_version() {
        let backend = MemoryBackend::new();

        let result = backend
            .put("gen.txt", Bytes::from("v1"), WritePrecondition::None)
            .await
            .expect("should succeed");
        let first_version = match result {
            WriteResult::Success { version } => version,
            WriteResult::PreconditionFailed { .. } => panic!("expected success"),
        };

        let result = backend
            .put(
                "gen.txt",
                Bytes::from("v2"),
                WritePrecondition::MatchesVersion(first_version.clone()),
            )
            .await
            .expect("should succeed");
        assert!(matches!(result, WriteResult::Success { .. }));

        let result = backend
            .put(
                "gen.txt",
                Bytes::from("v3"),
                WritePrecondition::MatchesVersion(first_version),
            )
            .await
            .expect("should succeed");
        assert!(matches!(result, WriteResult::PreconditionFailed { .. }));
    }

    #[tokio::test]
    async fn test_list_with_prefix() {
        let backend = MemoryBackend::new();

        backend
            .put("a/1.txt", Bytes::from("a1"), WritePrecondition::None)
            .await
            .unwrap();
        backend
            .put("a/2.txt", Bytes::from("a2"), WritePrecondition::None)
            .await
            .unwrap();
        backend
            .put("b/1.txt", Bytes::from("b1"), WritePrecondition::None)
            .await
            .unwrap();

        let list_a = backend.list("a/").await.expect("should succeed");
        assert_eq!(list_a.len(), 2);

        let list_b = backend.list("b/").await.expect("should succeed");
        assert_eq!(list_b.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let backend = MemoryBackend::new();

        backend
            .put("del.txt", Bytes::from("data"), WritePrecondition::None)
            .await
            .unwrap();
        assert!(backend.head("del.txt").await.unwrap().is_some());

        backend.delete("del.txt").await.expect("should succeed");
        assert!(backend.head("del.txt").await.unwrap().is_none());

        // Second delete of the same (now missing) key still succeeds.
        backend.delete("del.txt").await.expect("should succeed");
    }

    #[tokio::test]
    async fn test_object_store_backend_roundtrip() {
        let backend = ObjectStoreBackend::new(Arc::new(object_store::memory::InMemory::new()));

        let result = backend
            .put("baskets/u1.json", Bytes::from("{}"), WritePrecondition::None)
            .await
            .expect("put should succeed");
        assert!(matches!(result, WriteResult::Success { .. }));

        let data = backend
            .get("baskets/u1.json")
            .await
            .expect("get should succeed");
        assert_eq!(data, Bytes::from("{}"));

        backend
            .delete("baskets/u1.json")
            .await
            .expect("delete should succeed");
        let err = backend.get("baskets/u1.json").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_object_store_backend_create_precondition() {
        let backend = ObjectStoreBackend::new(Arc::new(object_store::memory::InMemory::new()));

        let result = backend
            .put(
                "baskets/u2.json",
                Bytes::from("a"),
                WritePrecondition::DoesNotExist,
            )
            .await
            .expect("put should succeed");
        assert!(matches!(result, WriteResult::Success { .. }));

        let result = backend
            .put(
                "baskets/u2.json",
                Bytes::from("b"),
                WritePrecondition::DoesNotExist,
            )
            .await
            .expect("put should succeed");
        assert!(matches!(result, WriteResult::PreconditionFailed { .. }));
    }

    #[tokio::test]
    async fn test_object_store_backend_delete_missing_is_ok() {
        let backend = ObjectStoreBackend::new(Arc::new(object_store::memory::InMemory::new()));
        backend
            .delete("baskets/never-written.json")
            .await
            .expect("delete of missing object should succeed");
    }
}
