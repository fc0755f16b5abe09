//! Domain model structs persisted in the SQLite database, plus the computed
//! views (leaderboard entries, voting progress) returned by read operations.
//!
//! Every struct derives `Serialize` and `Deserialize` so the server crate can
//! hand them straight to axum's JSON responses.

use chrono::{DateTime, Utc};
use fitstage_shared::{Role, SortBy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A platform account. The `role` gates voting: competitors may not vote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Human-readable display name.
    pub display_name: String,
    /// Platform role.
    pub role: Role,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// A competition division (e.g. "Men's Physique") with its own competitor
/// roster and per-spectator vote quota.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    /// Unique category identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Optional description shown on category pages.
    pub description: Option<String>,
    /// Maximum votes one spectator may cast in this category.
    pub max_votes: u32,
    /// Free-text lifecycle label (upcoming, live, ended). Display-only; the
    /// service never transitions it.
    pub status: String,
    /// When the category was created.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Competitor
// ---------------------------------------------------------------------------

/// A registered competitor. Vote counts and ranks are never stored on this
/// struct; they are derived from the `votes` relation per category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Competitor {
    /// Unique competitor identifier.
    pub id: Uuid,
    /// The backing user account.
    pub user_id: Uuid,
    /// Stage name shown on leaderboards.
    pub display_name: String,
    /// Registration time; doubles as the leaderboard tie-break key.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// Engagement counters on a post. All three are monotonically non-decreasing;
/// there is no unlike/un-share path.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngagementCounters {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

impl EngagementCounters {
    /// Total engagement, the trending sort key.
    pub fn total(&self) -> u64 {
        self.likes + self.comments + self.shares
    }
}

/// A feed post with author, media, tags, and engagement counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    /// Unique post identifier.
    pub id: Uuid,
    /// Author user id.
    pub author_id: Uuid,
    /// Author display name at read time (joined from `users`).
    pub author_name: String,
    /// Post body.
    pub content: String,
    /// Ordered media attachment URLs.
    pub media: Vec<String>,
    /// Tag set (stored lowercase-insensitive as written; search ignores case).
    pub tags: Vec<String>,
    /// Engagement counters.
    pub stats: EngagementCounters,
    /// When the post was created.
    pub created_at: DateTime<Utc>,
}

/// Filter for [`crate::Database::list_posts`].
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Case-insensitive substring matched against content, author display
    /// name, or any tag. `None` / empty matches everything.
    pub search: Option<String>,
    /// Ordering mode.
    pub sort_by: SortBy,
    /// Maximum number of posts to return after filtering and sorting.
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Computed views
// ---------------------------------------------------------------------------

/// One row of a category leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub competitor_id: Uuid,
    pub name: String,
    pub vote_count: u64,
    /// 1-based position, assigned after the deterministic sort.
    pub rank: u32,
}

/// Per-category voting progress for one spectator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VotingProgressEntry {
    pub category_id: Uuid,
    pub category_name: String,
    pub votes_used: u32,
    pub max_votes: u32,
}

impl VotingProgressEntry {
    /// Votes the spectator may still cast in this category.
    pub fn remaining(&self) -> u32 {
        self.max_votes.saturating_sub(self.votes_used)
    }
}

/// Result of a successful `cast_vote`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteReceipt {
    /// The target competitor's updated tally in the category.
    pub competitor_vote_count: u64,
    /// The caller's updated progress in the category.
    pub voting_progress: VotingProgressEntry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_saturates_at_zero() {
        let entry = VotingProgressEntry {
            category_id: Uuid::new_v4(),
            category_name: "Bikini".into(),
            votes_used: 7,
            max_votes: 5,
        };
        assert_eq!(entry.remaining(), 0);
    }

    #[test]
    fn engagement_total() {
        let stats = EngagementCounters {
            likes: 2,
            comments: 3,
            shares: 4,
        };
        assert_eq!(stats.total(), 9);
    }
}
