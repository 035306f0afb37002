//! Test storage with operation recording and failure injection.
//!
//! [`RecordingBackend`] is an in-memory backend that logs every operation
//! and can be told to fail reads, fail writes, fail deletes, or refuse
//! writes (precondition-style) per path prefix. The split by operation
//! kind exists because several basket contracts distinguish them: a delete
//! must go through even when the metric pre-read fails, and a refused
//! write maps differently than a failed one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use chrono::{DateTime, Utc};

use pannier_core::error::{Error, Result};
use pannier_core::storage::{ObjectMeta, StorageBackend, WritePrecondition, WriteResult};

/// Record of a storage operation for test assertions.
#[derive(Debug, Clone)]
pub enum StorageOp {
    /// Get operation.
    Get {
        /// Path that was read.
        path: String,
    },
    /// Head operation (metadata only).
    Head {
        /// Path that was checked.
        path: String,
    },
    /// Put operation.
    Put {
        /// Path that was written.
        path: String,
        /// Size of data written.
        size: usize,
    },
    /// Delete operation.
    Delete {
        /// Path that was deleted.
        path: String,
    },
    /// List operation.
    List {
        /// Prefix that was listed.
        prefix: String,
    },
}

/// In-memory storage backend with operation recording.
///
/// Records all operations for later assertion in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    data: Arc<Mutex<HashMap<String, StoredObject>>>,
    operations: Arc<Mutex<Vec<StorageOp>>>,
    fail_reads: Arc<Mutex<Vec<String>>>,
    fail_writes: Arc<Mutex<Vec<String>>>,
    fail_deletes: Arc<Mutex<Vec<String>>>,
    refuse_writes: Arc<Mutex<Vec<String>>>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    /// Version stored as i64 internally, exposed as String via API.
    version: i64,
    last_modified: DateTime<Utc>,
}

impl RecordingBackend {
    /// Creates a new empty recording backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StorageOp> {
        self.operations.lock().expect("lock").clone()
    }

    /// Clears recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().expect("lock").clear();
    }

    /// Fails `get`/`head`/`list` for paths under the given prefix.
    pub fn inject_read_failure(&self, prefix: impl Into<String>) {
        self.fail_reads.lock().expect("lock").push(prefix.into());
    }

    /// Fails `put` for paths under the given prefix.
    pub fn inject_write_failure(&self, prefix: impl Into<String>) {
        self.fail_writes.lock().expect("lock").push(prefix.into());
    }

    /// Fails `delete` for paths under the given prefix.
    pub fn inject_delete_failure(&self, prefix: impl Into<String>) {
        self.fail_deletes.lock().expect("lock").push(prefix.into());
    }

    /// Makes `put` report `PreconditionFailed` (write refused, not an
    /// error) for paths under the given prefix.
    pub fn refuse_writes(&self, prefix: impl Into<String>) {
        self.refuse_writes.lock().expect("lock").push(prefix.into());
    }

    /// Clears all injected failures and refusals.
    pub fn clear_failures(&self) {
        self.fail_reads.lock().expect("lock").clear();
        self.fail_writes.lock().expect("lock").clear();
        self.fail_deletes.lock().expect("lock").clear();
        self.refuse_writes.lock().expect("lock").clear();
    }

    /// Returns the current version for a path (for CAS testing).
    #[must_use]
    pub fn version(&self, path: &str) -> Option<String> {
        self.data
            .lock()
            .expect("lock")
            .get(path)
            .map(|o| o.version.to_string())
    }

    /// Returns all stored paths (for debugging).
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.data.lock().expect("lock").keys().cloned().collect()
    }

    fn record(&self, op: StorageOp) {
        self.operations.lock().expect("lock").push(op);
    }

    fn check(list: &Mutex<Vec<String>>, path: &str) -> Result<()> {
        let prefixes = list.lock().expect("lock");
        if prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return Err(Error::storage(format!("injected failure for path: {path}")));
        }
        Ok(())
    }

    fn is_refused(&self, path: &str) -> bool {
        self.refuse_writes
            .lock()
            .expect("lock")
            .iter()
            .any(|p| path.starts_with(p.as_str()))
    }
}

#[async_trait::async_trait]
impl StorageBackend for RecordingBackend {
    async fn get(&self, path: &str) -> Result<Bytes> {
        Self::check(&self.fail_reads, path)?;
        self.record(StorageOp::Get {
            path: path.to_string(),
        });

        let data = self.data.lock().expect("lock");
        data.get(path)
            .map(|o| o.data.clone())
            .ok_or_else(|| Error::NotFound(format!("object not found: {path}")))
    }

    async fn put(
        &self,
        path: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> Result<WriteResult> {
        Self::check(&self.fail_writes, path)?;
        self.record(StorageOp::Put {
            path: path.to_string(),
            size: data.len(),
        });

        let mut objects = self.data.lock().expect("lock");
        let current = objects.get(path);

        if self.is_refused(path) {
            return Ok(WriteResult::PreconditionFailed {
                current_version: current.map_or_else(|| "0".to_string(), |o| o.version.to_string()),
            });
        }

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

        Ok(WriteResult::Success {
            version: new_version.to_string(),
        })
    }

    async fn delete(&self, path: &str) -> Result<()> {
        Self::check(&self.fail_deletes, path)?;
        self.record(StorageOp::Delete {
            path: path.to_string(),
        });

        self.data.lock().expect("lock").remove(path);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        Self::check(&self.fail_reads, prefix)?;
        self.record(StorageOp::List {
            prefix: prefix.to_string(),
        });

        let data = self.data.lock().expect("lock");
        Ok(data
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
        Self::check(&self.fail_reads, path)?;
        self.record(StorageOp::Head {
            path: path.to_string(),
        });

        let data = self.data.lock().expect("lock");
        Ok(data.get(path).map(|obj| ObjectMeta {
            path: path.to_string(),
            size: obj.data.len() as u64,
            version: obj.version.to_string(),
            last_modified: Some(obj.last_modified),
            etag: Some(format!("\"{}\"", obj.version)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_operations_in_order() {
        let backend = RecordingBackend::new();
        backend
            .put("baskets/u1.json", Bytes::from("{}"), WritePrecondition::None)
            .await
            .unwrap();
        let _ = backend.get("baskets/u1.json").await.unwrap();
        backend.delete("baskets/u1.json").await.unwrap();

        let ops = backend.operations();
        assert_eq!(ops.len(), 3);
        assert!(matches!(ops[0], StorageOp::Put { .. }));
        assert!(matches!(ops[1], StorageOp::Get { .. }));
        assert!(matches!(ops[2], StorageOp::Delete { .. }));
    }

    #[tokio::test]
    async fn read_failure_leaves_writes_untouched() {
        let backend = RecordingBackend::new();
        backend.inject_read_failure("baskets/");

        assert!(backend.get("baskets/u1.json").await.is_err());
        assert!(backend
            .put("baskets/u1.json", Bytes::from("{}"), WritePrecondition::None)
            .await
            .is_ok());
        assert!(backend.delete("baskets/u1.json").await.is_ok());
    }

    #[tokio::test]
    async fn refused_write_is_a_precondition_result() {
        let backend = RecordingBackend::new();
        backend.refuse_writes("baskets/");

        let result = backend
            .put("baskets/u1.json", Bytes::from("{}"), WritePrecondition::None)
            .await
            .unwrap();
        assert!(matches!(result, WriteResult::PreconditionFailed { .. }));
        assert!(backend.paths().is_empty(), "refused write stores nothing");
    }
}
