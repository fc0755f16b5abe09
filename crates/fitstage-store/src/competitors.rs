//! Competitor registration and category membership.

use chrono::{DateTime, Utc};
use fitstage_shared::Role;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Competitor;

impl Database {
    /// Register a competitor backed by an existing user account and enroll
    /// them in the given categories.
    ///
    /// Only spectator (or already-competitor) accounts may register; admin
    /// and promoter accounts are rejected with [`StoreError::ForbiddenRole`]
    /// rather than having their role silently replaced. The backing
    /// account's role is switched to `competitor` in the same transaction,
    /// which is what bars them from voting from then on.
    pub fn register_competitor(
        &mut self,
        user_id: Uuid,
        display_name: &str,
        category_ids: &[Uuid],
    ) -> Result<Competitor> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let tx = self.conn_mut().transaction()?;

        let role: Role = tx
            .query_row(
                "SELECT role FROM users WHERE id = ?1",
                params![user_id.to_string()],
                |row| {
                    let role_str: String = row.get(0)?;
                    role_str.parse().map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            0,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound("user"),
                other => StoreError::Sqlite(other),
            })?;
        if matches!(role, Role::Admin | Role::Promoter) {
            return Err(StoreError::ForbiddenRole(role));
        }

        for category_id in category_ids {
            let known: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?1)",
                params![category_id.to_string()],
                |row| row.get(0),
            )?;
            if !known {
                return Err(StoreError::NotFound("category"));
            }
        }

        tx.execute(
            "INSERT INTO competitors (id, user_id, display_name, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                id.to_string(),
                user_id.to_string(),
                display_name,
                now.to_rfc3339(),
            ],
        )?;

        for category_id in category_ids {
            tx.execute(
                "INSERT OR IGNORE INTO category_members (category_id, competitor_id, joined_at)
                 VALUES (?1, ?2, ?3)",
                params![category_id.to_string(), id.to_string(), now.to_rfc3339()],
            )?;
        }

        tx.execute(
            "UPDATE users SET role = ?1 WHERE id = ?2",
            params![Role::Competitor.as_str(), user_id.to_string()],
        )?;

        tx.commit()?;

        tracing::info!(
            competitor = %id,
            user = %user_id,
            categories = category_ids.len(),
            "competitor registered"
        );

        Ok(Competitor {
            id,
            user_id,
            display_name: display_name.to_string(),
            created_at: now,
        })
    }

    /// Fetch a single competitor by id.
    pub fn get_competitor(&self, id: Uuid) -> Result<Competitor> {
        self.conn()
            .query_row(
                "SELECT id, user_id, display_name, created_at
                 FROM competitors
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_competitor,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound("competitor"),
                other => StoreError::Sqlite(other),
            })
    }

    /// List competitors enrolled in a category, in registration order.
    pub fn list_category_competitors(&self, category_id: Uuid) -> Result<Vec<Competitor>> {
        let mut stmt = self.conn().prepare(
            "SELECT c.id, c.user_id, c.display_name, c.created_at
             FROM category_members m
             JOIN competitors c ON c.id = m.competitor_id
             WHERE m.category_id = ?1
             ORDER BY c.created_at ASC, c.id ASC",
        )?;

        let rows = stmt.query_map(params![category_id.to_string()], row_to_competitor)?;

        let mut competitors = Vec::new();
        for row in rows {
            competitors.push(row?);
        }
        Ok(competitors)
    }

    /// Whether the competitor is enrolled in the category.
    pub fn is_category_member(&self, category_id: Uuid, competitor_id: Uuid) -> Result<bool> {
        let member: bool = self.conn().query_row(
            "SELECT EXISTS(
                SELECT 1 FROM category_members
                WHERE category_id = ?1 AND competitor_id = ?2
             )",
            params![category_id.to_string(), competitor_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(member)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Competitor`].
fn row_to_competitor(row: &rusqlite::Row<'_>) -> rusqlite::Result<Competitor> {
    let id_str: String = row.get(0)?;
    let user_id_str: String = row.get(1)?;
    let display_name: String = row.get(2)?;
    let created_str: String = row.get(3)?;

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))?;

    let user_id = Uuid::parse_str(&user_id_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e)))?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(Competitor {
        id,
        user_id,
        display_name,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::NewCategory;

    fn category(db: &Database, name: &str) -> Uuid {
        db.create_category(&NewCategory {
            name,
            description: None,
            max_votes: 5,
            status: "live",
        })
        .unwrap()
        .id
    }

    #[test]
    fn registration_enrolls_and_switches_role() {
        let mut db = Database::open_in_memory().unwrap();
        let user = db.create_user("Jordan", Role::Spectator).unwrap();
        let cat = category(&db, "Bikini");

        let competitor = db
            .register_competitor(user.id, "Jordan Flex", &[cat])
            .unwrap();

        assert!(db.is_category_member(cat, competitor.id).unwrap());
        assert_eq!(db.get_user(user.id).unwrap().role, Role::Competitor);

        let roster = db.list_category_competitors(cat).unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].display_name, "Jordan Flex");
    }

    #[test]
    fn registration_requires_known_user_and_category() {
        let mut db = Database::open_in_memory().unwrap();
        let cat = category(&db, "Bikini");

        assert!(matches!(
            db.register_competitor(Uuid::new_v4(), "Ghost", &[cat]),
            Err(StoreError::NotFound("user"))
        ));

        let user = db.create_user("Sam", Role::Spectator).unwrap();
        assert!(matches!(
            db.register_competitor(user.id, "Sam", &[Uuid::new_v4()]),
            Err(StoreError::NotFound("category"))
        ));
        // Failed registration must leave no competitor row behind.
        assert!(db.list_category_competitors(cat).unwrap().is_empty());
    }

    #[test]
    fn admin_and_promoter_accounts_may_not_register() {
        let mut db = Database::open_in_memory().unwrap();
        let cat = category(&db, "Bikini");

        let admin = db.create_user("Admin", Role::Admin).unwrap();
        assert!(matches!(
            db.register_competitor(admin.id, "Admin Flex", &[cat]),
            Err(StoreError::ForbiddenRole(Role::Admin))
        ));
        // The rejected account keeps its original role.
        assert_eq!(db.get_user(admin.id).unwrap().role, Role::Admin);

        let promoter = db.create_user("Promo", Role::Promoter).unwrap();
        assert!(matches!(
            db.register_competitor(promoter.id, "Promo Flex", &[cat]),
            Err(StoreError::ForbiddenRole(Role::Promoter))
        ));

        assert!(db.list_category_competitors(cat).unwrap().is_empty());
    }
}
