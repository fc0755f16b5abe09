//! Engagement recording: atomic counter increments with one-shot like dedup.
//!
//! Each accepted event appends a row to `engagement_events` and bumps the
//! matching counter on `posts` in the same transaction, so counters stay
//! monotonic and no update is lost under concurrent callers. A repeat like
//! from the same spectator is accepted but does not increment.

use chrono::Utc;
use fitstage_shared::EngagementKind;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::EngagementCounters;

impl Database {
    /// Record an engagement event and return the post's updated counters.
    ///
    /// Requires a known spectator and post. `like` is deduplicated per
    /// (spectator, post): a duplicate like succeeds as a no-op. `comment`
    /// and `share` always increment.
    pub fn record_engagement(
        &mut self,
        spectator_id: Uuid,
        post_id: Uuid,
        kind: EngagementKind,
    ) -> Result<EngagementCounters> {
        let tx = self.conn_mut().transaction()?;

        let spectator_known: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
            params![spectator_id.to_string()],
            |row| row.get(0),
        )?;
        if !spectator_known {
            return Err(StoreError::NotFound("spectator"));
        }

        let post_known: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?1)",
            params![post_id.to_string()],
            |row| row.get(0),
        )?;
        if !post_known {
            return Err(StoreError::NotFound("post"));
        }

        // For likes the partial unique index on (spectator, post) turns a
        // repeat into zero affected rows; the counter is only bumped when
        // the event row actually landed.
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO engagement_events
                 (id, spectator_id, post_id, kind, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Uuid::new_v4().to_string(),
                spectator_id.to_string(),
                post_id.to_string(),
                kind.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;

        if inserted > 0 {
            let column = match kind {
                EngagementKind::Like => "likes",
                EngagementKind::Comment => "comments",
                EngagementKind::Share => "shares",
            };
            tx.execute(
                &format!("UPDATE posts SET {column} = {column} + 1 WHERE id = ?1"),
                params![post_id.to_string()],
            )?;
        }

        let counters = tx.query_row(
            "SELECT likes, comments, shares FROM posts WHERE id = ?1",
            params![post_id.to_string()],
            |row| {
                Ok(EngagementCounters {
                    likes: row.get::<_, i64>(0)? as u64,
                    comments: row.get::<_, i64>(1)? as u64,
                    shares: row.get::<_, i64>(2)? as u64,
                })
            },
        )?;

        tx.commit()?;

        tracing::debug!(
            spectator = %spectator_id,
            post = %post_id,
            kind = %kind,
            deduplicated = inserted == 0,
            "engagement recorded"
        );

        Ok(counters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitstage_shared::Role;

    fn setup() -> (Database, Uuid, Uuid) {
        let mut db = Database::open_in_memory().unwrap();
        let author = db.create_user("Maya", Role::Competitor).unwrap();
        let fan = db.create_user("Fan", Role::Spectator).unwrap();
        let post = db.create_post(author.id, "leg day", &[], &[]).unwrap();
        (db, fan.id, post.id)
    }

    #[test]
    fn counters_increment_by_one_per_accepted_event() {
        let (mut db, fan, post) = setup();

        let after_like = db.record_engagement(fan, post, EngagementKind::Like).unwrap();
        assert_eq!(after_like.likes, 1);

        let after_comment = db.record_engagement(fan, post, EngagementKind::Comment).unwrap();
        assert_eq!(after_comment.comments, 1);

        let after_share = db.record_engagement(fan, post, EngagementKind::Share).unwrap();
        assert_eq!(
            after_share,
            EngagementCounters {
                likes: 1,
                comments: 1,
                shares: 1
            }
        );
    }

    #[test]
    fn duplicate_like_is_a_no_op() {
        let (mut db, fan, post) = setup();

        db.record_engagement(fan, post, EngagementKind::Like).unwrap();
        let counters = db.record_engagement(fan, post, EngagementKind::Like).unwrap();
        assert_eq!(counters.likes, 1);
    }

    #[test]
    fn likes_from_different_spectators_both_count() {
        let (mut db, fan, post) = setup();
        let other = db.create_user("Other", Role::Spectator).unwrap();

        db.record_engagement(fan, post, EngagementKind::Like).unwrap();
        let counters = db
            .record_engagement(other.id, post, EngagementKind::Like)
            .unwrap();
        assert_eq!(counters.likes, 2);
    }

    #[test]
    fn comments_and_shares_may_repeat() {
        let (mut db, fan, post) = setup();

        for _ in 0..3 {
            db.record_engagement(fan, post, EngagementKind::Comment).unwrap();
        }
        let counters = db.record_engagement(fan, post, EngagementKind::Share).unwrap();
        assert_eq!(counters.comments, 3);
        assert_eq!(counters.shares, 1);
    }

    #[test]
    fn unknown_post_or_spectator_is_not_found() {
        let (mut db, fan, post) = setup();

        assert!(matches!(
            db.record_engagement(fan, Uuid::new_v4(), EngagementKind::Like),
            Err(StoreError::NotFound("post"))
        ));
        assert!(matches!(
            db.record_engagement(Uuid::new_v4(), post, EngagementKind::Like),
            Err(StoreError::NotFound("spectator"))
        ));
    }
}
