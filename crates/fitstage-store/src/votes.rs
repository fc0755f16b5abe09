//! Vote casting, quotas, voting progress, and leaderboards.
//!
//! `cast_vote` is the one quota-sensitive write path: role check, membership
//! check, quota check, and the insert all run inside a single transaction so
//! two concurrent calls with one vote of quota left cannot both succeed, and
//! a failed validation leaves no state change behind.

use chrono::Utc;
use fitstage_shared::Role;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{LeaderboardEntry, VoteReceipt, VotingProgressEntry};

impl Database {
    /// Cast one vote for `competitor_id` in `category_id` on behalf of
    /// `spectator_id`.
    ///
    /// Fails with:
    /// - [`StoreError::NotFound`] if the spectator or category is unknown
    /// - [`StoreError::ForbiddenRole`] if the caller is a competitor
    /// - [`StoreError::InvalidTarget`] if the competitor is not enrolled in
    ///   the category (or is unknown)
    /// - [`StoreError::QuotaExceeded`] if the caller is already at quota
    ///
    /// Repeated votes for the same competitor are allowed up to the quota.
    pub fn cast_vote(
        &mut self,
        spectator_id: Uuid,
        competitor_id: Uuid,
        category_id: Uuid,
    ) -> Result<VoteReceipt> {
        let tx = self.conn_mut().transaction()?;

        let role: Role = tx
            .query_row(
                "SELECT role FROM users WHERE id = ?1",
                params![spectator_id.to_string()],
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
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound("spectator"),
                other => StoreError::Sqlite(other),
            })?;

        if !role.may_vote() {
            return Err(StoreError::ForbiddenRole(role));
        }

        let (category_name, max_votes): (String, u32) = tx
            .query_row(
                "SELECT name, max_votes FROM categories WHERE id = ?1",
                params![category_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound("category"),
                other => StoreError::Sqlite(other),
            })?;

        let is_member: bool = tx.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM category_members
                WHERE category_id = ?1 AND competitor_id = ?2
             )",
            params![category_id.to_string(), competitor_id.to_string()],
            |row| row.get(0),
        )?;
        if !is_member {
            return Err(StoreError::InvalidTarget(format!(
                "competitor {competitor_id} is not enrolled in category '{category_name}'"
            )));
        }

        let votes_used: u32 = tx.query_row(
            "SELECT COUNT(*) FROM votes WHERE spectator_id = ?1 AND category_id = ?2",
            params![spectator_id.to_string(), category_id.to_string()],
            |row| row.get(0),
        )?;
        if votes_used >= max_votes {
            return Err(StoreError::QuotaExceeded {
                used: votes_used,
                max: max_votes,
            });
        }

        tx.execute(
            "INSERT INTO votes (id, spectator_id, competitor_id, category_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Uuid::new_v4().to_string(),
                spectator_id.to_string(),
                competitor_id.to_string(),
                category_id.to_string(),
                Utc::now().to_rfc3339(),
            ],
        )?;

        let competitor_vote_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM votes WHERE competitor_id = ?1 AND category_id = ?2",
            params![competitor_id.to_string(), category_id.to_string()],
            |row| row.get(0),
        )?;

        tx.commit()?;

        tracing::debug!(
            spectator = %spectator_id,
            competitor = %competitor_id,
            category = %category_name,
            votes_used = votes_used + 1,
            max_votes,
            "vote recorded"
        );

        Ok(VoteReceipt {
            competitor_vote_count: competitor_vote_count as u64,
            voting_progress: VotingProgressEntry {
                category_id,
                category_name,
                votes_used: votes_used + 1,
                max_votes,
            },
        })
    }

    /// Category leaderboard: competitors ordered by vote count descending.
    ///
    /// Ties are broken by registration time ascending, then competitor id,
    /// so the order is deterministic and repeatable across calls with
    /// unchanged input state. Ranks are 1-based and assigned after the sort.
    pub fn get_leaderboard(
        &self,
        category_id: Uuid,
        limit: Option<usize>,
    ) -> Result<Vec<LeaderboardEntry>> {
        // Distinguish "unknown category" from "empty roster".
        self.get_category(category_id)?;

        let mut stmt = self.conn().prepare(
            "SELECT c.id, c.display_name, COUNT(v.id) AS vote_count
             FROM category_members m
             JOIN competitors c ON c.id = m.competitor_id
             LEFT JOIN votes v
                 ON v.competitor_id = c.id AND v.category_id = m.category_id
             WHERE m.category_id = ?1
             GROUP BY c.id
             ORDER BY vote_count DESC, c.created_at ASC, c.id ASC",
        )?;

        let rows = stmt.query_map(params![category_id.to_string()], |row| {
            let id_str: String = row.get(0)?;
            let name: String = row.get(1)?;
            let vote_count: i64 = row.get(2)?;
            let competitor_id = Uuid::parse_str(&id_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            Ok((competitor_id, name, vote_count as u64))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (competitor_id, name, vote_count) = row?;
            entries.push(LeaderboardEntry {
                competitor_id,
                name,
                vote_count,
                rank: entries.len() as u32 + 1,
            });
        }

        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }

    /// Per-category voting progress for a spectator.
    ///
    /// Only categories where the spectator has cast at least one vote are
    /// returned (zero-activity categories are omitted).
    pub fn get_voting_progress(&self, spectator_id: Uuid) -> Result<Vec<VotingProgressEntry>> {
        // Unknown spectators are an error, not an empty progress list.
        self.get_user(spectator_id)?;

        let mut stmt = self.conn().prepare(
            "SELECT c.id, c.name, c.max_votes, COUNT(v.id) AS votes_used
             FROM votes v
             JOIN categories c ON c.id = v.category_id
             WHERE v.spectator_id = ?1
             GROUP BY c.id
             ORDER BY c.name ASC",
        )?;

        let rows = stmt.query_map(params![spectator_id.to_string()], |row| {
            let id_str: String = row.get(0)?;
            let category_name: String = row.get(1)?;
            let max_votes: u32 = row.get(2)?;
            let votes_used: u32 = row.get(3)?;
            let category_id = Uuid::parse_str(&id_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            Ok(VotingProgressEntry {
                category_id,
                category_name,
                votes_used,
                max_votes,
            })
        })?;

        let mut progress = Vec::new();
        for row in rows {
            progress.push(row?);
        }
        Ok(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::NewCategory;
    use crate::models::Competitor;

    struct Fixture {
        db: Database,
        spectator: Uuid,
        category: Uuid,
        x: Competitor,
        y: Competitor,
    }

    fn fixture(max_votes: u32) -> Fixture {
        let mut db = Database::open_in_memory().unwrap();
        let spectator = db.create_user("Alex", Role::Spectator).unwrap().id;
        let category = db
            .create_category(&NewCategory {
                name: "Men's Physique",
                description: None,
                max_votes,
                status: "live",
            })
            .unwrap()
            .id;

        let ux = db.create_user("X", Role::Spectator).unwrap().id;
        let uy = db.create_user("Y", Role::Spectator).unwrap().id;
        let x = db.register_competitor(ux, "Competitor X", &[category]).unwrap();
        let y = db.register_competitor(uy, "Competitor Y", &[category]).unwrap();

        Fixture {
            db,
            spectator,
            category,
            x,
            y,
        }
    }

    #[test]
    fn vote_updates_tally_and_progress() {
        let mut f = fixture(5);
        let receipt = f.db.cast_vote(f.spectator, f.x.id, f.category).unwrap();

        assert_eq!(receipt.competitor_vote_count, 1);
        assert_eq!(receipt.voting_progress.votes_used, 1);
        assert_eq!(receipt.voting_progress.max_votes, 5);
        assert_eq!(receipt.voting_progress.remaining(), 4);
    }

    #[test]
    fn sixth_vote_at_quota_five_is_rejected_without_state_change() {
        let mut f = fixture(5);
        for _ in 0..5 {
            f.db.cast_vote(f.spectator, f.x.id, f.category).unwrap();
        }

        let err = f.db.cast_vote(f.spectator, f.x.id, f.category).unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { used: 5, max: 5 }));

        // Tally unchanged by the rejected call.
        let board = f.db.get_leaderboard(f.category, None).unwrap();
        assert_eq!(board[0].vote_count, 5);
        let progress = f.db.get_voting_progress(f.spectator).unwrap();
        assert_eq!(progress[0].votes_used, 5);
    }

    #[test]
    fn quota_is_shared_across_competitors_in_category() {
        let mut f = fixture(3);
        f.db.cast_vote(f.spectator, f.x.id, f.category).unwrap();
        f.db.cast_vote(f.spectator, f.y.id, f.category).unwrap();
        f.db.cast_vote(f.spectator, f.x.id, f.category).unwrap();

        assert!(matches!(
            f.db.cast_vote(f.spectator, f.y.id, f.category),
            Err(StoreError::QuotaExceeded { used: 3, max: 3 })
        ));
    }

    #[test]
    fn competitor_role_may_not_vote() {
        let mut f = fixture(5);
        // The competitor's backing user account.
        let voter = f.x.user_id;

        let err = f.db.cast_vote(voter, f.y.id, f.category).unwrap_err();
        assert!(matches!(err, StoreError::ForbiddenRole(Role::Competitor)));

        // No state change.
        let board = f.db.get_leaderboard(f.category, None).unwrap();
        assert!(board.iter().all(|e| e.vote_count == 0));
    }

    #[test]
    fn vote_for_non_member_is_invalid_target() {
        let mut f = fixture(5);
        let other_cat = f
            .db
            .create_category(&NewCategory {
                name: "Bikini",
                description: None,
                max_votes: 5,
                status: "live",
            })
            .unwrap()
            .id;

        // X is not enrolled in Bikini.
        assert!(matches!(
            f.db.cast_vote(f.spectator, f.x.id, other_cat),
            Err(StoreError::InvalidTarget(_))
        ));
        // Entirely unknown competitor ids are invalid targets too.
        assert!(matches!(
            f.db.cast_vote(f.spectator, Uuid::new_v4(), f.category),
            Err(StoreError::InvalidTarget(_))
        ));
    }

    #[test]
    fn unknown_spectator_and_category_are_not_found() {
        let mut f = fixture(5);
        assert!(matches!(
            f.db.cast_vote(Uuid::new_v4(), f.x.id, f.category),
            Err(StoreError::NotFound("spectator"))
        ));
        assert!(matches!(
            f.db.cast_vote(f.spectator, f.x.id, Uuid::new_v4()),
            Err(StoreError::NotFound("category"))
        ));
    }

    #[test]
    fn leaderboard_orders_by_votes_then_registration() {
        let mut f = fixture(10);
        // Y gets 2 votes, X gets 1.
        f.db.cast_vote(f.spectator, f.y.id, f.category).unwrap();
        f.db.cast_vote(f.spectator, f.y.id, f.category).unwrap();
        f.db.cast_vote(f.spectator, f.x.id, f.category).unwrap();

        let board = f.db.get_leaderboard(f.category, None).unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].competitor_id, f.y.id);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].competitor_id, f.x.id);
        assert_eq!(board[1].rank, 2);
    }

    #[test]
    fn leaderboard_ties_are_deterministic_and_repeatable() {
        let mut f = fixture(10);
        // Equal vote counts.
        f.db.cast_vote(f.spectator, f.x.id, f.category).unwrap();
        f.db.cast_vote(f.spectator, f.y.id, f.category).unwrap();

        let first = f.db.get_leaderboard(f.category, None).unwrap();
        let second = f.db.get_leaderboard(f.category, None).unwrap();
        assert_eq!(first, second);
        // First registered wins the tie.
        assert_eq!(first[0].competitor_id, f.x.id);
    }

    #[test]
    fn leaderboard_limit_truncates_after_ranking() {
        let mut f = fixture(10);
        f.db.cast_vote(f.spectator, f.y.id, f.category).unwrap();

        let board = f.db.get_leaderboard(f.category, Some(1)).unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].competitor_id, f.y.id);
    }

    #[test]
    fn progress_omits_untouched_categories() {
        let mut f = fixture(5);
        // A second category with no activity must not appear in progress.
        f.db.create_category(&NewCategory {
            name: "Bikini",
            description: None,
            max_votes: 5,
            status: "live",
        })
        .unwrap();

        f.db.cast_vote(f.spectator, f.x.id, f.category).unwrap();

        let progress = f.db.get_voting_progress(f.spectator).unwrap();
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].category_id, f.category);

        assert!(matches!(
            f.db.get_voting_progress(Uuid::new_v4()),
            Err(StoreError::NotFound("user"))
        ));
    }
}
