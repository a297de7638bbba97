//! SQLite Shard Connection and Query Operations
//!
//! Wraps a rusqlite connection to one shard database. Reads serve the access
//! core; writes exist for the administrative tooling that maintains subjects
//! and delegation edges, and for fixtures.

use rusqlite::functions::FunctionFlags;
use rusqlite::types::{ToSql, Value};
use rusqlite::{
    params, params_from_iter, Connection, InterruptHandle, OpenFlags, OptionalExtension,
};
use serde::Serialize;
use std::path::Path;
use std::rc::Rc;
use tracing::debug;

use crate::error::StoreError;
use crate::model::{DelegationEdge, RelationshipType, Subject, SubjectFilter, SubjectId};
use crate::schema::{
    EDGE_COLUMNS, SCHEMA_CREATE_DELEGATION_EDGES, SCHEMA_CREATE_INDEXES, SCHEMA_CREATE_METADATA,
    SCHEMA_CREATE_SUBJECTS, SHARD_SCHEMA_VERSION, SUBJECT_COLUMNS,
};

/// SQL function lowercasing text with full Unicode case folding.
/// SQLite's own `LOWER()` and `LIKE` only fold ASCII.
const FOLD_CASE_FN: &str = "fold_case";

/// A connection to one shard's SQLite database
pub struct ShardDatabase {
    conn: Connection,
    /// Key of the shard this database belongs to
    shard_key: String,
}

/// Row counts for a shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShardStats {
    pub subject_count: u64,
    pub edge_count: u64,
}

impl ShardDatabase {
    /// Open an existing shard database.
    pub fn open(path: &Path, shard_key: &str, read_only: bool) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::unavailable(format!(
                "shard database not found at '{}'",
                path.display()
            )));
        }

        let conn = if read_only {
            Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?
        } else {
            let conn = Connection::open(path)?;
            Self::configure_connection(&conn)?;
            conn
        };
        Self::register_extensions(&conn)?;

        let db = Self {
            conn,
            shard_key: shard_key.to_string(),
        };

        match db.get_metadata("schema_version")? {
            Some(version) if version == SHARD_SCHEMA_VERSION => {}
            Some(version) => {
                return Err(StoreError::SchemaVersionMismatch {
                    expected: SHARD_SCHEMA_VERSION.to_string(),
                    found: version,
                })
            }
            None => {
                return Err(StoreError::invalid_data(format!(
                    "'{}' has no schema version",
                    path.display()
                )))
            }
        }

        debug!("Opened shard '{}' at {:?}", shard_key, path);
        Ok(db)
    }

    /// Create a new shard database with schema.
    pub fn create(path: &Path, shard_key: &str) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::configure_connection(&conn)?;
        Self::initialize(conn, shard_key)
    }

    /// Create an in-memory shard database (for testing)
    pub fn in_memory(shard_key: &str) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn, shard_key)
    }

    fn initialize(conn: Connection, shard_key: &str) -> Result<Self, StoreError> {
        Self::register_extensions(&conn)?;
        conn.execute(SCHEMA_CREATE_SUBJECTS, [])?;
        conn.execute(SCHEMA_CREATE_DELEGATION_EDGES, [])?;
        conn.execute(SCHEMA_CREATE_METADATA, [])?;
        conn.execute_batch(SCHEMA_CREATE_INDEXES)?;

        let db = Self {
            conn,
            shard_key: shard_key.to_string(),
        };

        db.set_metadata("schema_version", SHARD_SCHEMA_VERSION)?;
        db.set_metadata("shard_key", shard_key)?;

        Ok(db)
    }

    /// Configure connection with optimal settings
    fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
        // WAL lets readers proceed while administrative writes happen
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        Ok(())
    }

    /// Install `fold_case` and the `rarray` table function used for id lists.
    fn register_extensions(conn: &Connection) -> rusqlite::Result<()> {
        conn.create_scalar_function(
            FOLD_CASE_FN,
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|text| text.to_lowercase())),
        )?;
        rusqlite::vtab::array::load_module(conn)
    }

    /// Get the shard key
    pub fn shard_key(&self) -> &str {
        &self.shard_key
    }

    /// Handle that aborts whatever query is running on this connection.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.conn.get_interrupt_handle()
    }

    // =========================================================================
    // Metadata Operations
    // =========================================================================

    /// Get a metadata value
    pub fn get_metadata(&self, key: &str) -> Result<Option<String>, StoreError> {
        let result = self
            .conn
            .query_row(
                "SELECT value FROM shard_metadata WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(result)
    }

    /// Set a metadata value
    pub fn set_metadata(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO shard_metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // =========================================================================
    // Subject Reads
    // =========================================================================

    /// Count subjects matching `filter`, optionally restricted to `ids`.
    pub fn count_subjects(
        &self,
        filter: &SubjectFilter,
        ids: Option<&[SubjectId]>,
    ) -> Result<u64, StoreError> {
        if matches!(ids, Some(ids) if ids.is_empty()) {
            return Ok(0);
        }

        let (clause, values) = subject_predicate(filter, ids);
        let sql = format!("SELECT COUNT(*) FROM subjects{}", clause);

        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Fetch one ordered slice of subjects, newest first.
    pub fn fetch_subjects(
        &self,
        filter: &SubjectFilter,
        ids: Option<&[SubjectId]>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Subject>, StoreError> {
        if limit == 0 || matches!(ids, Some(ids) if ids.is_empty()) {
            return Ok(Vec::new());
        }

        let (clause, mut values) = subject_predicate(filter, ids);
        let sql = format!(
            "SELECT {} FROM subjects{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            SUBJECT_COLUMNS, clause
        );
        values.push(Box::new(to_sql_int(limit)));
        values.push(Box::new(to_sql_int(offset)));

        let mut stmt = self.conn.prepare(&sql)?;
        let subjects = stmt
            .query_map(params_from_iter(values.iter()), Self::row_to_subject)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(subjects)
    }

    /// Get a subject by ID
    pub fn get_subject(&self, id: &str) -> Result<Option<Subject>, StoreError> {
        let sql = format!("SELECT {} FROM subjects WHERE id = ?1", SUBJECT_COLUMNS);
        let result = self
            .conn
            .query_row(&sql, [id], Self::row_to_subject)
            .optional()?;
        Ok(result)
    }

    fn row_to_subject(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subject> {
        Ok(Subject {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            kyc_status: row.get(3)?,
            is_admin: row.get(4)?,
            is_manager: row.get(5)?,
            is_superior_manager: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    // =========================================================================
    // Delegation Reads
    // =========================================================================

    /// Edges whose superior is one of `superior_ids`, optionally of one type.
    pub fn delegation_edges(
        &self,
        superior_ids: &[SubjectId],
        relationship: Option<RelationshipType>,
    ) -> Result<Vec<DelegationEdge>, StoreError> {
        if superior_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(id_array(superior_ids))];
        let mut sql = format!(
            "SELECT {} FROM delegation_edges WHERE superior_id IN rarray(?)",
            EDGE_COLUMNS
        );
        if let Some(rel) = relationship {
            sql.push_str(" AND relationship_type = ?");
            values.push(Box::new(rel.as_str()));
        }
        sql.push_str(" ORDER BY superior_id, subordinate_id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(superior_id, subordinate_id, rel)| {
                Ok(DelegationEdge {
                    superior_id,
                    subordinate_id,
                    relationship_type: rel.parse()?,
                })
            })
            .collect()
    }

    // =========================================================================
    // Administrative Writes
    // =========================================================================

    /// Insert or replace a subject
    pub fn insert_subject(&self, subject: &Subject) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT OR REPLACE INTO subjects ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            SUBJECT_COLUMNS
        );
        self.conn.execute(
            &sql,
            params![
                subject.id,
                subject.name,
                subject.email,
                subject.kyc_status,
                subject.is_admin,
                subject.is_manager,
                subject.is_superior_manager,
                subject.created_at,
            ],
        )?;
        Ok(())
    }

    /// Insert multiple subjects in a transaction
    pub fn insert_subjects(&self, subjects: &[Subject]) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        for subject in subjects {
            self.insert_subject(subject)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Insert a delegation edge; a second edge for the same pair is rejected
    pub fn insert_edge(&self, edge: &DelegationEdge) -> Result<(), StoreError> {
        let inserted = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO delegation_edges (superior_id, subordinate_id, relationship_type)
            VALUES (?1, ?2, ?3)
            "#,
            params![
                edge.superior_id,
                edge.subordinate_id,
                edge.relationship_type.as_str()
            ],
        )?;

        if inserted == 0 {
            return Err(StoreError::DuplicateEdge {
                superior: edge.superior_id.clone(),
                subordinate: edge.subordinate_id.clone(),
            });
        }
        Ok(())
    }

    /// Insert multiple edges in a transaction
    pub fn insert_edges(&self, edges: &[DelegationEdge]) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        for edge in edges {
            self.insert_edge(edge)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Delete the edge for a pair, returning whether one existed
    pub fn delete_edge(&self, superior_id: &str, subordinate_id: &str) -> Result<bool, StoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM delegation_edges WHERE superior_id = ?1 AND subordinate_id = ?2",
            [superior_id, subordinate_id],
        )?;
        Ok(deleted > 0)
    }

    /// Delete a subject by ID
    pub fn delete_subject(&self, id: &str) -> Result<bool, StoreError> {
        let deleted = self.conn.execute("DELETE FROM subjects WHERE id = ?1", [id])?;
        Ok(deleted > 0)
    }

    /// Get row counts
    pub fn stats(&self) -> Result<ShardStats, StoreError> {
        let subject_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM subjects", [], |row| row.get(0))?;
        let edge_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM delegation_edges", [], |row| {
                    row.get(0)
                })?;

        Ok(ShardStats {
            subject_count: subject_count as u64,
            edge_count: edge_count as u64,
        })
    }
}

/// Build the WHERE clause and bound values shared by count and fetch.
fn subject_predicate(
    filter: &SubjectFilter,
    ids: Option<&[SubjectId]>,
) -> (String, Vec<Box<dyn ToSql>>) {
    let mut conditions = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(ref search) = filter.search {
        let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
        conditions.push(format!(
            r"({f}(name) LIKE ? ESCAPE '\' OR {f}(email) LIKE ? ESCAPE '\')",
            f = FOLD_CASE_FN
        ));
        values.push(Box::new(pattern.clone()));
        values.push(Box::new(pattern));
    }

    if let Some(ref status) = filter.kyc_status {
        conditions.push("kyc_status = ?".to_string());
        values.push(Box::new(status.clone()));
    }

    if let Some(ids) = ids {
        conditions.push("id IN rarray(?)".to_string());
        values.push(Box::new(id_array(ids)));
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), values)
    }
}

/// An id list bound as a single `rarray` parameter, so its length is not
/// limited by SQLite's cap on bound variables.
fn id_array(ids: &[SubjectId]) -> Rc<Vec<Value>> {
    Rc::new(ids.iter().cloned().map(Value::Text).collect())
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn to_sql_int(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn seeded() -> ShardDatabase {
        let db = ShardDatabase::in_memory("north").unwrap();
        db.insert_subjects(&[
            Subject::new("u1", "Alice Martin", "alice@north.example", 100)
                .with_kyc_status("verified"),
            Subject::new("u2", "Bruno 100%", "bruno@north.example", 200),
            Subject::new("u3", "Chloe", "chloe@partner.example", 300).with_kyc_status("pending"),
            Subject::new("u4", "Dmitri_K", "dmitri@north.example", 300)
                .with_kyc_status("verified"),
        ])
        .unwrap();
        db
    }

    fn ids(subjects: &[Subject]) -> Vec<&str> {
        subjects.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_create_in_memory() {
        let db = ShardDatabase::in_memory("north").unwrap();
        assert_eq!(db.shard_key(), "north");
        assert_eq!(
            db.get_metadata("schema_version").unwrap(),
            Some(SHARD_SCHEMA_VERSION.to_string())
        );
    }

    #[test]
    fn test_fetch_orders_newest_first() {
        let db = seeded();
        let all = db.fetch_subjects(&SubjectFilter::all(), None, 0, 10).unwrap();
        // u3 and u4 share a timestamp; id descending breaks the tie
        assert_eq!(ids(&all), vec!["u4", "u3", "u2", "u1"]);

        let page = db.fetch_subjects(&SubjectFilter::all(), None, 1, 2).unwrap();
        assert_eq!(ids(&page), vec!["u3", "u2"]);

        let past_end = db.fetch_subjects(&SubjectFilter::all(), None, 10, 5).unwrap();
        assert!(past_end.is_empty());
    }

    #[test]
    fn test_count_with_filters() {
        let db = seeded();
        assert_eq!(db.count_subjects(&SubjectFilter::all(), None).unwrap(), 4);

        let verified = SubjectFilter::all().with_kyc_status("verified");
        assert_eq!(db.count_subjects(&verified, None).unwrap(), 2);

        let north = SubjectFilter::all().with_search("NORTH.example");
        assert_eq!(db.count_subjects(&north, None).unwrap(), 3);

        let both = north.with_kyc_status("verified");
        assert_eq!(db.count_subjects(&both, None).unwrap(), 2);
    }

    #[test]
    fn test_search_escapes_wildcards() {
        let db = seeded();

        let percent = SubjectFilter::all().with_search("100%");
        assert_eq!(
            ids(&db.fetch_subjects(&percent, None, 0, 10).unwrap()),
            vec!["u2"]
        );

        // '_' must not act as a single-character wildcard
        let underscore = SubjectFilter::all().with_search("i_k");
        assert_eq!(
            ids(&db.fetch_subjects(&underscore, None, 0, 10).unwrap()),
            vec!["u4"]
        );
        let literal = SubjectFilter::all().with_search("e_m");
        assert_eq!(db.count_subjects(&literal, None).unwrap(), 0);
    }

    #[test]
    fn test_search_folds_non_ascii_case() {
        let db = ShardDatabase::in_memory("north").unwrap();
        db.insert_subjects(&[
            Subject::new("u1", "Élodie Durand", "elodie@north.example", 1),
            Subject::new("u2", "Jörg Weiß", "joerg@north.example", 2),
        ])
        .unwrap();

        for term in ["élodie", "ÉLODIE", "Élodie"] {
            let filter = SubjectFilter::all().with_search(term);
            assert_eq!(db.count_subjects(&filter, None).unwrap(), 1, "{}", term);
        }

        let filter = SubjectFilter::all().with_search("JÖRG");
        assert_eq!(
            ids(&db.fetch_subjects(&filter, None, 0, 10).unwrap()),
            vec!["u2"]
        );
    }

    #[test]
    fn test_large_id_lists() {
        let db = seeded();
        db.insert_edge(&DelegationEdge::manages_user("m1", "u1"))
            .unwrap();

        // Past SQLite's limit of 32766 bound variables per statement
        let mut allowed: Vec<SubjectId> = (0..40_000).map(|i| format!("ghost-{}", i)).collect();
        allowed.push("u1".to_string());
        allowed.push("u3".to_string());

        assert_eq!(
            db.count_subjects(&SubjectFilter::all(), Some(&allowed))
                .unwrap(),
            2
        );
        assert_eq!(
            ids(&db
                .fetch_subjects(&SubjectFilter::all(), Some(&allowed), 0, 10)
                .unwrap()),
            vec!["u3", "u1"]
        );

        let mut superiors = allowed.clone();
        superiors.push("m1".to_string());
        let edges = db
            .delegation_edges(&superiors, Some(RelationshipType::ManagerToUser))
            .unwrap();
        assert_eq!(edges, vec![DelegationEdge::manages_user("m1", "u1")]);
    }

    #[test]
    fn test_read_only_connection_has_extensions() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("north.db");
        {
            let db = ShardDatabase::create(&path, "north").unwrap();
            db.insert_subject(&Subject::new("u1", "Élodie", "e@x", 1))
                .unwrap();
        }

        let db = ShardDatabase::open(&path, "north", true).unwrap();
        let filter = SubjectFilter::all().with_search("ÉLO");
        assert_eq!(
            db.count_subjects(&filter, Some(&["u1".to_string()]))
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_id_restriction() {
        let db = seeded();
        let allowed = vec!["u1".to_string(), "u3".to_string(), "ghost".to_string()];

        assert_eq!(
            db.count_subjects(&SubjectFilter::all(), Some(&allowed))
                .unwrap(),
            2
        );
        assert_eq!(
            ids(&db
                .fetch_subjects(&SubjectFilter::all(), Some(&allowed), 0, 10)
                .unwrap()),
            vec!["u3", "u1"]
        );

        let none: Vec<SubjectId> = Vec::new();
        assert_eq!(
            db.count_subjects(&SubjectFilter::all(), Some(&none)).unwrap(),
            0
        );
    }

    #[test]
    fn test_delegation_edges_by_superior_and_type() {
        let db = ShardDatabase::in_memory("north").unwrap();
        db.insert_edges(&[
            DelegationEdge::manages_manager("a", "m1"),
            DelegationEdge::manages_user("a", "u9"),
            DelegationEdge::manages_user("m1", "u1"),
            DelegationEdge::manages_user("m2", "u2"),
        ])
        .unwrap();

        let from_a = db.delegation_edges(&["a".to_string()], None).unwrap();
        assert_eq!(from_a.len(), 2);

        let managers = db
            .delegation_edges(
                &["a".to_string()],
                Some(RelationshipType::SuperiorManagerToManager),
            )
            .unwrap();
        assert_eq!(managers, vec![DelegationEdge::manages_manager("a", "m1")]);

        let users = db
            .delegation_edges(
                &["m1".to_string(), "m2".to_string()],
                Some(RelationshipType::ManagerToUser),
            )
            .unwrap();
        let subordinates: Vec<_> = users.iter().map(|e| e.subordinate_id.as_str()).collect();
        assert_eq!(subordinates, vec!["u1", "u2"]);

        assert!(db.delegation_edges(&[], None).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_edge_rejected() {
        let db = ShardDatabase::in_memory("north").unwrap();
        db.insert_edge(&DelegationEdge::manages_user("m1", "u1"))
            .unwrap();

        let err = db
            .insert_edge(&DelegationEdge::manages_manager("m1", "u1"))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEdge { .. }));

        assert!(db.delete_edge("m1", "u1").unwrap());
        assert!(!db.delete_edge("m1", "u1").unwrap());
    }

    #[test]
    fn test_subject_roundtrip_and_stats() {
        let db = ShardDatabase::in_memory("north").unwrap();
        let subject = Subject::new("boss", "Boss", "boss@north.example", 42)
            .with_roles(true, true, true)
            .with_kyc_status("verified");
        db.insert_subject(&subject).unwrap();
        db.insert_edge(&DelegationEdge::manages_manager("boss", "m1"))
            .unwrap();

        assert_eq!(db.get_subject("boss").unwrap(), Some(subject));
        assert!(db.get_subject("nobody").unwrap().is_none());

        let stats = db.stats().unwrap();
        assert_eq!(stats.subject_count, 1);
        assert_eq!(stats.edge_count, 1);

        assert!(db.delete_subject("boss").unwrap());
        assert_eq!(db.stats().unwrap().subject_count, 0);
    }

    #[test]
    fn test_open_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("shards").join("north.db");

        {
            let db = ShardDatabase::create(&path, "north").unwrap();
            db.insert_subject(&Subject::new("u1", "Alice", "a@x", 1))
                .unwrap();
        }

        let db = ShardDatabase::open(&path, "north", true).unwrap();
        assert_eq!(db.count_subjects(&SubjectFilter::all(), None).unwrap(), 1);

        // Read-only connections refuse writes
        assert!(db
            .insert_subject(&Subject::new("u2", "Bob", "b@x", 2))
            .is_err());
    }

    #[test]
    fn test_open_missing_or_foreign_file() {
        let temp = TempDir::new().unwrap();

        let missing = ShardDatabase::open(&temp.path().join("nope.db"), "x", false);
        assert!(matches!(missing, Err(StoreError::Unavailable(_))));

        let path = temp.path().join("other.db");
        {
            let db = ShardDatabase::create(&path, "x").unwrap();
            db.set_metadata("schema_version", "9.9").unwrap();
        }
        let mismatch = ShardDatabase::open(&path, "x", false);
        assert!(matches!(
            mismatch,
            Err(StoreError::SchemaVersionMismatch { .. })
        ));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("a%b_c\\d"), "a\\%b\\_c\\\\d");
        assert_eq!(escape_like("plain"), "plain");
    }
}
