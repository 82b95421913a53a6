//! SQL migrations for the document registry.
//!
//! Applied in ascending order when the database is opened.

pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Document registry: document_types (seeded), documents",
        sql: r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS document_types (
    id          INTEGER PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    required    INTEGER NOT NULL DEFAULT 0
);

-- One document per user and type.
CREATE TABLE IF NOT EXISTS documents (
    id               TEXT PRIMARY KEY,
    user_id          TEXT NOT NULL,
    document_type_id INTEGER NOT NULL REFERENCES document_types(id),
    file_name        TEXT NOT NULL,
    content_type     TEXT,
    size_bytes       INTEGER NOT NULL,
    checksum         TEXT NOT NULL,
    stored_path      TEXT NOT NULL,
    metadata_json    TEXT NOT NULL DEFAULT '{}',
    created_at       TEXT NOT NULL,
    UNIQUE(user_id, document_type_id)
);

CREATE INDEX IF NOT EXISTS idx_documents_user ON documents(user_id);

INSERT OR IGNORE INTO document_types (id, name, description, required) VALUES
    (1, 'Kbis', 'Extrait Kbis de moins de trois mois', 1),
    (2, 'Statuts', 'Statuts à jour de la société', 1),
    (3, 'Pièce d''identité', 'Pièce d''identité du dirigeant', 1),
    (4, 'RIB', 'Relevé d''identité bancaire', 0),
    (5, 'Pitch deck', 'Présentation investisseurs', 0);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
