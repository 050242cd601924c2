use rusqlite::{named_params, params, params_from_iter, Connection, OptionalExtension, ToSql};
use serde::{Deserialize, Serialize};

use crate::client::QueryOptions;
use crate::error::WordgateError;

/// Wire shape of one restricted word, snake_case per the service contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestrictedWordDto {
    pub id: String,
    pub full_word: String,
    pub created_by: String,
    pub created_reason: String,
    pub created_at: String,
    pub deleted_by: Option<String>,
    pub deleted_reason: Option<String>,
    pub deleted_at: Option<String>,
    pub deleted: bool,
    pub super_restricted: bool,
    pub categories: Vec<String>,
    pub super_restricted_audit_log: Vec<SuperRestrictedAuditEntryDto>,
    pub categories_audit_log: Vec<CategoriesAuditEntryDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuperRestrictedAuditEntryDto {
    pub changed_at: String,
    pub changed_by: String,
    pub new_value: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoriesAuditEntryDto {
    pub changed_at: String,
    pub changed_by: String,
    pub changed_reason: String,
    pub categories: Vec<String>,
}

/// Column values for a word being inserted.
pub struct NewWordRow<'a> {
    pub full_word: &'a str,
    pub created_by: &'a str,
    pub created_reason: &'a str,
    pub created_at: &'a str,
    pub super_restricted: bool,
    pub categories: &'a [String],
}

const WORD_COLUMNS: &str = "id, full_word, created_by, created_reason, created_at, \
     deleted_by, deleted_reason, deleted_at, deleted, super_restricted, categories";

pub struct Words;

impl Words {
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<RestrictedWordDto>, WordgateError> {
        let word = conn
            .query_row(
                &format!("SELECT {WORD_COLUMNS} FROM words WHERE id = ?1"),
                params![id],
                Self::map_word_row,
            )
            .optional()?;

        match word {
            Some(mut word) => {
                let word_id: i64 = word.id.parse().unwrap_or_default();
                word.super_restricted_audit_log = Self::super_restricted_audit(conn, word_id)?;
                word.categories_audit_log = Self::categories_audit(conn, word_id)?;
                Ok(Some(word))
            }
            None => Ok(None),
        }
    }

    pub fn list(
        conn: &Connection,
        options: &QueryOptions,
    ) -> Result<Vec<RestrictedWordDto>, WordgateError> {
        let mut sql = format!("SELECT {WORD_COLUMNS} FROM words");
        let mut clauses: Vec<&str> = Vec::new();
        let mut bindings: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(starts_with) = &options.starts_with {
            clauses.push("full_word LIKE ?");
            bindings.push(Box::new(format!("{starts_with}%")));
        }

        if let Some(contains) = &options.contains {
            clauses.push("full_word LIKE ?");
            bindings.push(Box::new(format!("%{contains}%")));
        }

        if let Some(deleted) = options.deleted {
            clauses.push("deleted = ?");
            bindings.push(Box::new(deleted));
        }

        if let Some(super_restricted) = options.super_restricted {
            clauses.push("super_restricted = ?");
            bindings.push(Box::new(super_restricted));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        sql.push_str(" ORDER BY full_word, id");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bindings.iter()), Self::map_word_row)?;

        let mut words = Vec::new();
        for row in rows {
            let mut word = row?;
            let word_id: i64 = word.id.parse().unwrap_or_default();
            word.super_restricted_audit_log = Self::super_restricted_audit(conn, word_id)?;
            word.categories_audit_log = Self::categories_audit(conn, word_id)?;
            words.push(word);
        }

        Ok(words)
    }

    /// Active words that equal the candidate, are contained in it, or contain
    /// it. LIKE is case-insensitive for the ASCII range, matching the NOCASE
    /// collation on the column.
    pub fn find_conflicting(
        conn: &Connection,
        word: &str,
    ) -> Result<Vec<(i64, String)>, WordgateError> {
        let mut stmt = conn.prepare(
            "SELECT id, full_word FROM words
             WHERE deleted = 0
               AND (:word LIKE '%' || full_word || '%' OR full_word LIKE '%' || :word || '%')
             ORDER BY full_word",
        )?;

        let rows = stmt.query_map(named_params! { ":word": word }, |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;

        let mut conflicting = Vec::new();
        for row in rows {
            conflicting.push(row?);
        }

        Ok(conflicting)
    }

    pub fn insert(conn: &Connection, new: &NewWordRow) -> Result<i64, WordgateError> {
        conn.execute(
            "INSERT INTO words (full_word, created_by, created_reason, created_at, super_restricted, categories)
             VALUES (:full_word, :created_by, :created_reason, :created_at, :super_restricted, :categories)",
            named_params! {
                ":full_word": new.full_word,
                ":created_by": new.created_by,
                ":created_reason": new.created_reason,
                ":created_at": new.created_at,
                ":super_restricted": new.super_restricted,
                ":categories": categories_to_json(new.categories),
            },
        )?;

        Ok(conn.last_insert_rowid())
    }

    pub fn soft_delete(
        conn: &Connection,
        id: i64,
        deleted_by: &str,
        deleted_reason: &str,
        deleted_at: &str,
    ) -> Result<(), WordgateError> {
        conn.execute(
            "UPDATE words
             SET deleted = 1, deleted_by = :deleted_by, deleted_reason = :deleted_reason, deleted_at = :deleted_at
             WHERE id = :id",
            named_params! {
                ":id": id,
                ":deleted_by": deleted_by,
                ":deleted_reason": deleted_reason,
                ":deleted_at": deleted_at,
            },
        )?;

        Ok(())
    }

    pub fn set_super_restricted(
        conn: &Connection,
        id: i64,
        super_restricted: bool,
    ) -> Result<(), WordgateError> {
        conn.execute(
            "UPDATE words SET super_restricted = ?1 WHERE id = ?2",
            params![super_restricted, id],
        )?;

        Ok(())
    }

    pub fn set_categories(
        conn: &Connection,
        id: i64,
        categories: &[String],
    ) -> Result<(), WordgateError> {
        conn.execute(
            "UPDATE words SET categories = ?1 WHERE id = ?2",
            params![categories_to_json(categories), id],
        )?;

        Ok(())
    }

    pub fn append_super_restricted_audit(
        conn: &Connection,
        word_id: i64,
        changed_at: &str,
        changed_by: &str,
        new_value: bool,
    ) -> Result<(), WordgateError> {
        conn.execute(
            "INSERT INTO super_restricted_audit (word_id, changed_at, changed_by, new_value)
             VALUES (?1, ?2, ?3, ?4)",
            params![word_id, changed_at, changed_by, new_value],
        )?;

        Ok(())
    }

    pub fn append_categories_audit(
        conn: &Connection,
        word_id: i64,
        changed_at: &str,
        changed_by: &str,
        changed_reason: &str,
        categories: &[String],
    ) -> Result<(), WordgateError> {
        conn.execute(
            "INSERT INTO categories_audit (word_id, changed_at, changed_by, changed_reason, categories)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![word_id, changed_at, changed_by, changed_reason, categories_to_json(categories)],
        )?;

        Ok(())
    }

    fn super_restricted_audit(
        conn: &Connection,
        word_id: i64,
    ) -> Result<Vec<SuperRestrictedAuditEntryDto>, WordgateError> {
        let mut stmt = conn.prepare(
            "SELECT changed_at, changed_by, new_value
             FROM super_restricted_audit
             WHERE word_id = ?1
             ORDER BY id",
        )?;

        let rows = stmt.query_map(params![word_id], |row| {
            Ok(SuperRestrictedAuditEntryDto {
                changed_at: row.get(0)?,
                changed_by: row.get(1)?,
                new_value: row.get(2)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }

        Ok(entries)
    }

    fn categories_audit(
        conn: &Connection,
        word_id: i64,
    ) -> Result<Vec<CategoriesAuditEntryDto>, WordgateError> {
        let mut stmt = conn.prepare(
            "SELECT changed_at, changed_by, changed_reason, categories
             FROM categories_audit
             WHERE word_id = ?1
             ORDER BY id",
        )?;

        let rows = stmt.query_map(params![word_id], |row| {
            Ok(CategoriesAuditEntryDto {
                changed_at: row.get(0)?,
                changed_by: row.get(1)?,
                changed_reason: row.get(2)?,
                categories: categories_from_json(&row.get::<_, String>(3)?),
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }

        Ok(entries)
    }

    fn map_word_row(row: &rusqlite::Row) -> rusqlite::Result<RestrictedWordDto> {
        Ok(RestrictedWordDto {
            id: row.get::<_, i64>(0)?.to_string(),
            full_word: row.get(1)?,
            created_by: row.get(2)?,
            created_reason: row.get(3)?,
            created_at: row.get(4)?,
            deleted_by: row.get(5)?,
            deleted_reason: row.get(6)?,
            deleted_at: row.get(7)?,
            deleted: row.get(8)?,
            super_restricted: row.get(9)?,
            categories: categories_from_json(&row.get::<_, String>(10)?),
            super_restricted_audit_log: Vec::new(),
            categories_audit_log: Vec::new(),
        })
    }
}

fn categories_to_json(categories: &[String]) -> String {
    serde_json::to_string(categories).unwrap_or_else(|_| "[]".to_string())
}

fn categories_from_json(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use pretty_assertions::assert_eq;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("wordgate.db")).unwrap();
        (dir, db)
    }

    fn insert_word(conn: &Connection, word: &str) -> i64 {
        Words::insert(
            conn,
            &NewWordRow {
                full_word: word,
                created_by: "creator@example.com",
                created_reason: "test insert",
                created_at: "2024-02-03T10:00:00+00:00",
                super_restricted: false,
                categories: &["restricted".to_string()],
            },
        )
        .unwrap()
    }

    #[test]
    fn inserted_words_round_trip() {
        let (_dir, db) = test_db();
        let conn = db.conn().unwrap();

        let id = insert_word(&conn, "offlimits");
        let word = Words::get_by_id(&conn, id).unwrap().unwrap();

        assert_eq!(word.full_word, "offlimits");
        assert_eq!(word.created_by, "creator@example.com");
        assert_eq!(word.categories, vec!["restricted".to_string()]);
        assert!(!word.deleted);
        assert!(word.super_restricted_audit_log.is_empty());
    }

    #[test]
    fn list_filters_by_contains_case_insensitively() {
        let (_dir, db) = test_db();
        let conn = db.conn().unwrap();

        insert_word(&conn, "Alpha");
        insert_word(&conn, "beta");

        let options = QueryOptions {
            contains: Some("ALPHA".to_string()),
            ..QueryOptions::default()
        };

        let words = Words::list(&conn, &options).unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].full_word, "Alpha");
    }

    #[test]
    fn list_filters_by_starts_with() {
        let (_dir, db) = test_db();
        let conn = db.conn().unwrap();

        insert_word(&conn, "alphabet");
        insert_word(&conn, "betamax");

        let options = QueryOptions {
            starts_with: Some("alpha".to_string()),
            ..QueryOptions::default()
        };

        let words = Words::list(&conn, &options).unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].full_word, "alphabet");
    }

    #[test]
    fn list_filters_by_deleted_flag() {
        let (_dir, db) = test_db();
        let conn = db.conn().unwrap();

        let keep = insert_word(&conn, "keep");
        let remove = insert_word(&conn, "remove");
        Words::soft_delete(&conn, remove, "admin@example.com", "obsolete", "2024-02-04T10:00:00+00:00")
            .unwrap();

        let active = Words::list(
            &conn,
            &QueryOptions {
                deleted: Some(false),
                ..QueryOptions::default()
            },
        )
        .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, keep.to_string());

        let deleted = Words::list(
            &conn,
            &QueryOptions {
                deleted: Some(true),
                ..QueryOptions::default()
            },
        )
        .unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].deleted_reason.as_deref(), Some("obsolete"));
    }

    #[test]
    fn find_conflicting_matches_substrings_both_ways() {
        let (_dir, db) = test_db();
        let conn = db.conn().unwrap();

        insert_word(&conn, "first");
        insert_word(&conn, "unrelated");

        let conflicts = Words::find_conflicting(&conn, "FirstWord").unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].1, "first");

        let reverse = Words::find_conflicting(&conn, "fir").unwrap();
        assert_eq!(reverse.len(), 1);
    }

    #[test]
    fn find_conflicting_ignores_deleted_words() {
        let (_dir, db) = test_db();
        let conn = db.conn().unwrap();

        let id = insert_word(&conn, "first");
        Words::soft_delete(&conn, id, "admin@example.com", "gone", "2024-02-04T10:00:00+00:00")
            .unwrap();

        assert!(Words::find_conflicting(&conn, "firstword").unwrap().is_empty());
    }

    #[test]
    fn audit_entries_are_returned_in_insertion_order() {
        let (_dir, db) = test_db();
        let conn = db.conn().unwrap();

        let id = insert_word(&conn, "audited");
        Words::append_super_restricted_audit(&conn, id, "2024-03-01T09:00:00+00:00", "a@b.c", true)
            .unwrap();
        Words::append_super_restricted_audit(&conn, id, "2024-03-02T09:00:00+00:00", "d@e.f", false)
            .unwrap();

        let word = Words::get_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(word.super_restricted_audit_log.len(), 2);
        assert!(word.super_restricted_audit_log[0].new_value);
        assert!(!word.super_restricted_audit_log[1].new_value);
    }
}
