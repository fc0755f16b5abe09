//! CRUD operations for [`Category`] records.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Category;

/// Parameters for creating a category.
#[derive(Debug, Clone)]
pub struct NewCategory<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub max_votes: u32,
    pub status: &'a str,
}

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new category.
    pub fn create_category(&self, new: &NewCategory<'_>) -> Result<Category> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        self.conn().execute(
            "INSERT INTO categories (id, name, description, max_votes, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id.to_string(),
                new.name,
                new.description,
                new.max_votes,
                new.status,
                now.to_rfc3339(),
            ],
        )?;

        Ok(Category {
            id,
            name: new.name.to_string(),
            description: new.description.map(str::to_string),
            max_votes: new.max_votes,
            status: new.status.to_string(),
            created_at: now,
        })
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single category by UUID.
    pub fn get_category(&self, id: Uuid) -> Result<Category> {
        self.conn()
            .query_row(
                "SELECT id, name, description, max_votes, status, created_at
                 FROM categories
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_category,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound("category"),
                other => StoreError::Sqlite(other),
            })
    }

    /// List all categories, ordered by creation date descending.
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, description, max_votes, status, created_at
             FROM categories
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map([], row_to_category)?;

        let mut categories = Vec::new();
        for row in rows {
            categories.push(row?);
        }
        Ok(categories)
    }

    /// Total number of categories (admin status).
    pub fn count_categories(&self) -> Result<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Category`].
fn row_to_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    let id_str: String = row.get(0)?;
    let name: String = row.get(1)?;
    let description: Option<String> = row.get(2)?;
    let max_votes: u32 = row.get(3)?;
    let status: String = row.get(4)?;
    let created_str: String = row.get(5)?;

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(Category {
        id,
        name,
        description,
        max_votes,
        status,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitstage_shared::constants::DEFAULT_MAX_VOTES_PER_CATEGORY;

    #[test]
    fn create_and_fetch_category() {
        let db = Database::open_in_memory().unwrap();
        let category = db
            .create_category(&NewCategory {
                name: "Men's Physique",
                description: Some("Open class"),
                max_votes: DEFAULT_MAX_VOTES_PER_CATEGORY,
                status: "live",
            })
            .unwrap();

        let fetched = db.get_category(category.id).unwrap();
        assert_eq!(fetched, category);
        assert_eq!(fetched.max_votes, 5);
    }

    #[test]
    fn unknown_category_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.get_category(Uuid::new_v4()),
            Err(StoreError::NotFound("category"))
        ));
    }

    #[test]
    fn list_returns_all() {
        let db = Database::open_in_memory().unwrap();
        for name in ["Bikini", "Classic Physique"] {
            db.create_category(&NewCategory {
                name,
                description: None,
                max_votes: 5,
                status: "upcoming",
            })
            .unwrap();
        }
        assert_eq!(db.list_categories().unwrap().len(), 2);
        assert_eq!(db.count_categories().unwrap(), 2);
    }
}
