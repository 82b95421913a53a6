//! libSQL storage for uploaded documents.
//!
//! The [`Storage`] struct wraps a local libSQL database holding the document
//! type catalogue and the registry of stored uploads. File bytes live on disk
//! under the upload directory; the database only records where.

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use tracing::{debug, info};

use vitrine_shared::{Document, DocumentType, Result, VitrineError};

const DOCUMENT_COLUMNS: &str = "id, user_id, document_type_id, file_name, content_type, \
     size_bytes, checksum, stored_path, metadata_json, created_at";

/// Storage handle wrapping a libSQL database.
pub struct Storage {
    /// Owns the local database file; `conn` must not outlive it.
    _db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path` and bring its schema up to date.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| VitrineError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let storage = Self { _db: db, conn };
        storage.run_migrations().await?;
        info!(path = %path.display(), "document store ready");
        Ok(storage)
    }

    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    VitrineError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 before the first migration.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => match rows.next().await {
                Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
                _ => 0,
            },
            Err(_) => 0,
        }
    }

    // -----------------------------------------------------------------------
    // Document types
    // -----------------------------------------------------------------------

    /// Every document type, by id.
    pub async fn list_document_types(&self) -> Result<Vec<DocumentType>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, description, required FROM document_types ORDER BY id",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let mut types = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            types.push(row_to_document_type(&row)?);
        }
        Ok(types)
    }

    pub async fn get_document_type(&self, id: i64) -> Result<Option<DocumentType>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, description, required FROM document_types WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(Some(row_to_document_type(&row)?)),
            None => Ok(None),
        }
    }

    // -----------------------------------------------------------------------
    // Documents
    // -----------------------------------------------------------------------

    /// The document a user already stored for a type, if any.
    pub async fn find_document(
        &self,
        user_id: &str,
        document_type_id: i64,
    ) -> Result<Option<Document>> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE user_id = ?1 AND document_type_id = ?2"
        );
        let mut rows = self
            .conn
            .query(&sql, params![user_id, document_type_id])
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(Some(row_to_document(&row)?)),
            None => Ok(None),
        }
    }

    /// All documents of a user, oldest first.
    pub async fn list_documents_for_user(&self, user_id: &str) -> Result<Vec<Document>> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE user_id = ?1 ORDER BY created_at"
        );
        let mut rows = self
            .conn
            .query(&sql, params![user_id])
            .await
            .map_err(storage_err)?;

        let mut docs = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            docs.push(row_to_document(&row)?);
        }
        Ok(docs)
    }

    /// Record a stored upload.
    ///
    /// Fails with [`VitrineError::Conflict`] when the user already has a
    /// document of this type.
    pub async fn insert_document(&self, doc: &Document) -> Result<()> {
        let metadata = serde_json::to_string(&doc.metadata)
            .map_err(|e| VitrineError::Storage(format!("metadata serialization: {e}")))?;
        let created_at = doc.created_at.to_rfc3339();

        let result = self
            .conn
            .execute(
                "INSERT INTO documents (id, user_id, document_type_id, file_name, content_type,
                     size_bytes, checksum, stored_path, metadata_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    doc.id.as_str(),
                    doc.user_id.as_str(),
                    doc.document_type_id,
                    doc.file_name.as_str(),
                    doc.content_type.as_deref(),
                    doc.size_bytes as i64,
                    doc.checksum.as_str(),
                    doc.stored_path.as_str(),
                    metadata.as_str(),
                    created_at.as_str()
                ],
            )
            .await;

        match result {
            Ok(_) => {
                debug!(
                    id = %doc.id,
                    user_id = %doc.user_id,
                    document_type_id = doc.document_type_id,
                    "document recorded"
                );
                Ok(())
            }
            Err(e) if e.to_string().contains("UNIQUE constraint failed") => {
                Err(VitrineError::conflict(format!(
                    "user '{}' already has a document of type {}",
                    doc.user_id, doc.document_type_id
                )))
            }
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Remove a document record. Returns whether a row was deleted.
    pub async fn delete_document(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM documents WHERE id = ?1", params![id])
            .await
            .map_err(storage_err)?;
        Ok(affected > 0)
    }
}

fn storage_err(e: libsql::Error) -> VitrineError {
    VitrineError::Storage(e.to_string())
}

fn row_to_document_type(row: &libsql::Row) -> Result<DocumentType> {
    Ok(DocumentType {
        id: row.get::<i64>(0).map_err(storage_err)?,
        name: row.get::<String>(1).map_err(storage_err)?,
        description: row.get::<String>(2).unwrap_or_default(),
        required: row.get::<i64>(3).map_err(storage_err)? != 0,
    })
}

fn row_to_document(row: &libsql::Row) -> Result<Document> {
    let metadata_json: String = row.get(8).map_err(storage_err)?;
    let created_at: String = row.get(9).map_err(storage_err)?;

    Ok(Document {
        id: row.get::<String>(0).map_err(storage_err)?,
        user_id: row.get::<String>(1).map_err(storage_err)?,
        document_type_id: row.get::<i64>(2).map_err(storage_err)?,
        file_name: row.get::<String>(3).map_err(storage_err)?,
        content_type: row.get::<String>(4).ok(),
        size_bytes: row.get::<i64>(5).map_err(storage_err)?.max(0) as u64,
        checksum: row.get::<String>(6).map_err(storage_err)?,
        stored_path: row.get::<String>(7).map_err(storage_err)?,
        metadata: serde_json::from_str(&metadata_json)
            .map_err(|e| VitrineError::Storage(format!("invalid metadata JSON: {e}")))?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| VitrineError::Storage(format!("invalid date: {e}")))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("vitrine_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn document(user_id: &str, document_type_id: i64) -> Document {
        Document {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.into(),
            document_type_id,
            file_name: "kbis.pdf".into(),
            content_type: Some("application/pdf".into()),
            size_bytes: 2048,
            checksum: "ab".repeat(32),
            stored_path: format!("{user_id}/kbis.pdf"),
            metadata: serde_json::json!({"siren": "123456789"}),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        assert_eq!(storage.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("vitrine_test_{}.db", Uuid::now_v7()));
        let first = Storage::open(&tmp).await.expect("first open");
        drop(first);
        let second = Storage::open(&tmp).await.expect("second open");
        assert_eq!(second.get_schema_version().await, 1);
        assert_eq!(second.list_document_types().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn document_types_are_seeded() {
        let storage = test_storage().await;
        let types = storage.list_document_types().await.expect("list types");
        assert_eq!(types.len(), 5);
        assert_eq!(types[0].name, "Kbis");
        assert!(types[0].required);
        assert!(!types[3].required);

        let kbis = storage.get_document_type(1).await.unwrap();
        assert_eq!(kbis.map(|t| t.id), Some(1));
        assert!(storage.get_document_type(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_and_find_document() {
        let storage = test_storage().await;
        let doc = document("user-1", 1);
        storage.insert_document(&doc).await.expect("insert");

        let found = storage
            .find_document("user-1", 1)
            .await
            .unwrap()
            .expect("document");
        assert_eq!(found.id, doc.id);
        assert_eq!(found.size_bytes, 2048);
        assert_eq!(found.metadata["siren"], "123456789");
        assert_eq!(found.content_type.as_deref(), Some("application/pdf"));

        assert!(storage.find_document("user-1", 2).await.unwrap().is_none());
        assert!(storage.find_document("user-2", 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_type_per_user_conflicts() {
        let storage = test_storage().await;
        storage.insert_document(&document("user-1", 1)).await.unwrap();

        let err = storage
            .insert_document(&document("user-1", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, VitrineError::Conflict { .. }), "got {err:?}");

        // Another type, or another user, is fine.
        storage.insert_document(&document("user-1", 2)).await.unwrap();
        storage.insert_document(&document("user-2", 1)).await.unwrap();
        assert_eq!(storage.list_documents_for_user("user-1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_frees_the_slot() {
        let storage = test_storage().await;
        let doc = document("user-1", 4);
        storage.insert_document(&doc).await.unwrap();
        assert!(storage.delete_document(&doc.id).await.unwrap());
        assert!(!storage.delete_document(&doc.id).await.unwrap());
        storage.insert_document(&document("user-1", 4)).await.unwrap();
    }

    #[tokio::test]
    async fn reopen_keeps_documents_and_schema() {
        let tmp = std::env::temp_dir().join(format!("vitrine_test_{}.db", Uuid::now_v7()));
        let doc = document("user-1", 1);
        {
            let storage = Storage::open(&tmp).await.unwrap();
            storage.insert_document(&doc).await.unwrap();
        }

        let reopened = Storage::open(&tmp).await.unwrap();
        assert_eq!(reopened.list_document_types().await.unwrap().len(), 5);
        let docs = reopened.list_documents_for_user("user-1").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, doc.id);
    }
}
